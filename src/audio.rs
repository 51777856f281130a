//! Playback: the session manager, its engine contract and the rodio backend.

mod dsp;
mod engine;
mod progress;
mod session;
mod sink;
mod types;

pub use dsp::{BAND_CENTERS_HZ, BAND_LEVEL_RANGE, EffectParams, EqualizedSource, SessionEffects};
pub use engine::{CompletionCallback, DecodeEngine, Decoder};
pub use progress::ProgressTicker;
pub use session::SessionManager;
pub use sink::RodioEngine;
pub use types::{SessionEvent, SessionId, SessionState};

#[cfg(test)]
mod tests;
