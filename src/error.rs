//! Error types shared across the player.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::SessionState;

/// Errors raised by the playback session and its decode engine.
///
/// Indexing and lifecycle misuse are caller bugs and are surfaced here rather
/// than clamped or ignored.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A track index outside the current track list.
    #[error("track index {index} out of range (track list has {len} entries)")]
    TrackIndexOutOfRange { index: usize, len: usize },

    /// Navigation was requested on an empty track list.
    #[error("track list is empty")]
    NoTracks,

    /// The decode engine could not open the track.
    #[error("failed to open {path:?}: {reason}")]
    Acquire { path: PathBuf, reason: String },

    /// The operation is not valid from the current session state.
    #[error("cannot {op} while {state:?}")]
    InvalidState { op: &'static str, state: SessionState },

    /// The operation needs a loaded decoder and none is live.
    #[error("cannot {op}: no track loaded")]
    NoDecoder { op: &'static str },

    /// The audio output device could not be opened.
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors raised while opening a container for waveform extraction.
///
/// The extractor never propagates these: they turn into an empty envelope.
#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognised container {path:?}: {reason}")]
    Probe { path: PathBuf, reason: String },
}
