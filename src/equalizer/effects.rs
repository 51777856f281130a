use crate::audio::SessionId;

/// Banded equalizer plus bass boost bound to one playback session.
///
/// Levels are millibels inside `band_level_range`; strength is permille.
pub trait EffectsEngine {
    fn number_of_bands(&self) -> u16;
    fn band_level_range(&self) -> (i32, i32);
    fn set_band_level(&mut self, band: u16, level: i32);
    fn set_bass_strength(&mut self, strength: u16);
    fn current_bass_strength(&self) -> u16;
}

/// Creates an effects engine for a session id.
///
/// Returns `None` when the session is unknown or already gone.
pub trait EffectsProvider {
    fn effects_for(&self, session: SessionId) -> Option<Box<dyn EffectsEngine>>;
}
