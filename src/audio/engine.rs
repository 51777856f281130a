//! Contract with the decode/output engine.
//!
//! The session manager never touches audio data; it drives decoders through
//! these traits so any backend (rodio, a test fake) can sit underneath.

use std::time::Duration;

use crate::error::Result;
use crate::library::AudioTrack;

use super::types::SessionId;

/// Invoked once when a decoder plays to the end of its track.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Opens decoders for tracks.
pub trait DecodeEngine {
    fn acquire(&mut self, track: &AudioTrack) -> Result<Box<dyn Decoder>>;
}

/// One opened track.
///
/// `release` frees the engine resources and must tolerate repeated calls.
/// After release, a pending completion callback must not fire.
pub trait Decoder {
    fn start(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Position past the end is clamped by the engine.
    fn seek(&mut self, position: Duration);
    fn position(&self) -> Duration;
    fn duration(&self) -> Duration;
    fn session_id(&self) -> SessionId;
    fn on_completion(&mut self, callback: CompletionCallback);
    fn release(&mut self);
}

/// Exclusive owner of the live decoder; releases it when dropped.
pub(crate) struct DecoderSlot(Box<dyn Decoder>);

impl DecoderSlot {
    pub(crate) fn new(decoder: Box<dyn Decoder>) -> Self {
        Self(decoder)
    }
}

impl std::ops::Deref for DecoderSlot {
    type Target = dyn Decoder;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::ops::DerefMut for DecoderSlot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Drop for DecoderSlot {
    fn drop(&mut self) {
        self.0.release();
    }
}
