use std::ops::{Deref, DerefMut};
use std::path::Path;

use tracing::{debug, warn};

use super::demux::{Demuxer, SymphoniaDemuxer};
use super::envelope::AmplitudeEnvelope;

pub const DEFAULT_SAMPLES: usize = 200;
pub const DEFAULT_CHUNK_BYTES: usize = 1024;

/// Releases the demuxer however extraction ends.
struct ReleaseGuard<'a, D: Demuxer + ?Sized>(&'a mut D);

impl<D: Demuxer + ?Sized> Deref for ReleaseGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &*self.0
    }
}

impl<D: Demuxer + ?Sized> DerefMut for ReleaseGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut *self.0
    }
}

impl<D: Demuxer + ?Sized> Drop for ReleaseGuard<'_, D> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Builds a rendering-quality envelope straight from the container payload.
///
/// Payload bytes are read as big-endian 16-bit pairs without decoding, so the
/// result tracks loudness only loosely. That is enough for a waveform strip.
#[derive(Debug, Clone, Copy)]
pub struct WaveformExtractor {
    chunk_bytes: usize,
}

impl Default for WaveformExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_BYTES)
    }
}

impl WaveformExtractor {
    /// `chunk_bytes` below 2 is raised to 2 so each read yields a pair.
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            chunk_bytes: chunk_bytes.max(2),
        }
    }

    /// Extract an envelope of exactly `samples` peaks from the first audio
    /// track of `demuxer`, or `None` when there is nothing to show.
    ///
    /// The demuxer is released before returning on every path.
    pub fn extract<D: Demuxer + ?Sized>(
        &self,
        demuxer: &mut D,
        samples: usize,
    ) -> Option<AmplitudeEnvelope> {
        let mut demuxer = ReleaseGuard(demuxer);
        if samples == 0 {
            return None;
        }

        let track = (0..demuxer.track_count()).find(|&i| {
            demuxer
                .track_mime(i)
                .is_some_and(|mime| mime.starts_with("audio/"))
        })?;
        demuxer.select_track(track);

        let mut buf = vec![0u8; self.chunk_bytes];
        let mut magnitudes = Vec::new();
        while let Some(n) = demuxer.read_chunk(&mut buf) {
            push_magnitudes(&buf[..n.min(buf.len())], &mut magnitudes);
            if !demuxer.advance() {
                break;
            }
        }

        debug!(track, magnitudes = magnitudes.len(), "payload scanned");
        downsample(&magnitudes, samples)
    }

    /// Open `path` with symphonia and extract. Open failures are logged and
    /// yield `None`.
    pub fn extract_file(&self, path: &Path, samples: usize) -> Option<AmplitudeEnvelope> {
        match SymphoniaDemuxer::open(path) {
            Ok(mut demuxer) => self.extract(&mut demuxer, samples),
            Err(e) => {
                warn!(error = %e, "no waveform");
                None
            }
        }
    }
}

/// Append `|hi << 8 | lo|` for each byte pair; an odd trailing byte is dropped.
pub fn push_magnitudes(bytes: &[u8], out: &mut Vec<u16>) {
    out.extend(bytes.chunks_exact(2).map(|pair| {
        let value = ((pair[0] as i8 as i32) << 8) | (pair[1] as i32 & 0xFF);
        value.unsigned_abs() as u16
    }));
}

/// Split into `samples` contiguous chunks of `len / samples` values and keep
/// each chunk's maximum. Leftover values past the last full chunk are dropped.
pub fn downsample(magnitudes: &[u16], samples: usize) -> Option<AmplitudeEnvelope> {
    if samples == 0 {
        return None;
    }
    let chunk = magnitudes.len() / samples;
    if chunk == 0 {
        return None;
    }
    let peaks = magnitudes
        .chunks_exact(chunk)
        .take(samples)
        .map(|c| c.iter().copied().max().unwrap_or(0))
        .collect();
    AmplitudeEnvelope::new(peaks)
}
