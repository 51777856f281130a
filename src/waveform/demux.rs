//! Container readers feeding the extractor with still-encoded payload bytes.

use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::WaveformError;

/// Sequential access to the tracks and packets of a media container.
///
/// `read_chunk` copies the current packet of the selected track into `buf`
/// (truncating to `buf.len()`) and returns `None` once the track is exhausted.
/// `advance` moves to the next packet.
pub trait Demuxer {
    fn track_count(&self) -> usize;
    /// Media type of track `index`, like `audio/mp3`.
    fn track_mime(&self, index: usize) -> Option<String>;
    fn select_track(&mut self, index: usize);
    fn read_chunk(&mut self, buf: &mut [u8]) -> Option<usize>;
    fn advance(&mut self) -> bool;
    fn release(&mut self);
}

struct TrackInfo {
    id: u32,
    mime: String,
}

pub struct SymphoniaDemuxer {
    format: Option<Box<dyn FormatReader>>,
    tracks: Vec<TrackInfo>,
    selected: Option<u32>,
    packet: Option<Packet>,
}

impl SymphoniaDemuxer {
    pub fn open(path: &Path) -> Result<Self, WaveformError> {
        let file = File::open(path).map_err(|source| WaveformError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| WaveformError::Probe {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let codecs = symphonia::default::get_codecs();
        let tracks = probed
            .format
            .tracks()
            .iter()
            .map(|track| {
                let codec = track.codec_params.codec;
                let mime = if codec == CODEC_TYPE_NULL {
                    "application/octet-stream".to_string()
                } else {
                    let name = codecs.get_codec(codec).map_or("unknown", |d| d.short_name);
                    format!("audio/{name}")
                };
                TrackInfo { id: track.id, mime }
            })
            .collect();

        Ok(Self {
            format: Some(probed.format),
            tracks,
            selected: None,
            packet: None,
        })
    }

    /// Next packet of the selected track, or `None` at end of stream.
    fn next_packet(&mut self) -> Option<Packet> {
        let selected = self.selected?;
        let format = self.format.as_mut()?;
        loop {
            match format.next_packet() {
                Ok(packet) if packet.track_id() == selected => return Some(packet),
                Ok(_) => continue,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, "stopped reading container");
                    return None;
                }
            }
        }
    }
}

impl Demuxer for SymphoniaDemuxer {
    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_mime(&self, index: usize) -> Option<String> {
        self.tracks.get(index).map(|t| t.mime.clone())
    }

    fn select_track(&mut self, index: usize) {
        self.selected = self.tracks.get(index).map(|t| t.id);
        self.packet = self.next_packet();
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Option<usize> {
        let data = self.packet.as_ref()?.buf();
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Some(n)
    }

    fn advance(&mut self) -> bool {
        self.packet = self.next_packet();
        self.packet.is_some()
    }

    fn release(&mut self) {
        if self.format.take().is_some() {
            debug!("container released");
        }
        self.packet = None;
    }
}
