//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the track list, selection,
//! the last reported playback state and the current waveform.

mod model;

pub use model::*;
