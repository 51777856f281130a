//! Five-band equalizer and bass boost applied inside the rodio pipeline.
//!
//! Parameters live in `EffectParams`, shared between the UI thread (writes)
//! and the output thread (reads) through atomics. The source polls a version
//! counter once per frame and recomputes its filter coefficients on change.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicI32, AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use rodio::Source;
use rodio::source::SeekError;

use crate::equalizer::{EffectsEngine, EffectsProvider, MAX_BASS_STRENGTH};

use super::types::SessionId;

/// Peaking filter centres, one per band.
pub const BAND_CENTERS_HZ: [f32; 5] = [60.0, 230.0, 910.0, 3600.0, 14000.0];
/// Band level limits in millibels.
pub const BAND_LEVEL_RANGE: (i32, i32) = (-1500, 1500);

const BAND_Q: f32 = 1.0;
const BASS_SHELF_HZ: f32 = 100.0;
const BASS_SHELF_Q: f32 = 0.707;
/// Shelf gain at full bass strength.
const BASS_MAX_GAIN_DB: f32 = 12.0;

/// Live effect settings for one session.
#[derive(Debug)]
pub struct EffectParams {
    levels: [AtomicI32; BAND_CENTERS_HZ.len()],
    bass: AtomicU16,
    version: AtomicU64,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            levels: Default::default(),
            bass: AtomicU16::new(0),
            version: AtomicU64::new(0),
        }
    }
}

impl EffectParams {
    pub fn level(&self, band: usize) -> Option<i32> {
        self.levels.get(band).map(|l| l.load(Ordering::Relaxed))
    }

    /// Set a band level, clamped to `BAND_LEVEL_RANGE`. Unknown bands are ignored.
    pub fn set_level(&self, band: usize, level: i32) {
        let Some(slot) = self.levels.get(band) else {
            return;
        };
        let (min, max) = BAND_LEVEL_RANGE;
        slot.store(level.clamp(min, max), Ordering::Relaxed);
        self.version.fetch_add(1, Ordering::Release);
    }

    pub fn bass(&self) -> u16 {
        self.bass.load(Ordering::Relaxed)
    }

    pub fn set_bass(&self, strength: u16) {
        self.bass
            .store(strength.min(MAX_BASS_STRENGTH), Ordering::Relaxed);
        self.version.fetch_add(1, Ordering::Release);
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn is_flat(&self) -> bool {
        self.bass() == 0 && self.levels.iter().all(|l| l.load(Ordering::Relaxed) == 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct History {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

/// RBJ biquad with per-channel history.
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    history: Vec<History>,
}

impl Biquad {
    fn bypass(channels: usize) -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            history: vec![History::default(); channels.max(1)],
        }
    }

    fn set(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    fn set_peaking(&mut self, sample_rate: f32, freq: f32, q: f32, gain_db: f32) {
        if sample_rate < 1.0 {
            return;
        }
        let a = 10f32.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq.min(sample_rate * 0.45) / sample_rate;
        let (sin, cos) = omega.sin_cos();
        let alpha = sin / (2.0 * q);
        self.set(
            1.0 + alpha * a,
            -2.0 * cos,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos,
            1.0 - alpha / a,
        );
    }

    fn set_low_shelf(&mut self, sample_rate: f32, freq: f32, q: f32, gain_db: f32) {
        if sample_rate < 1.0 {
            return;
        }
        let a = 10f32.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq.min(sample_rate * 0.45) / sample_rate;
        let (sin, cos) = omega.sin_cos();
        let alpha = sin / 2.0 * ((a + 1.0 / a) * (1.0 / q - 1.0) + 2.0).sqrt();
        let beta = 2.0 * a.sqrt() * alpha;
        self.set(
            a * ((a + 1.0) - (a - 1.0) * cos + beta),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos),
            a * ((a + 1.0) - (a - 1.0) * cos - beta),
            (a + 1.0) + (a - 1.0) * cos + beta,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos),
            (a + 1.0) + (a - 1.0) * cos - beta,
        );
    }

    #[inline]
    fn process(&mut self, channel: usize, x: f32) -> f32 {
        let Some(h) = self.history.get_mut(channel) else {
            return x;
        };
        let mut y = self.b0 * x + self.b1 * h.x1 + self.b2 * h.x2 - self.a1 * h.y1 - self.a2 * h.y2;
        // Flush denormals.
        if y.abs() < 1e-15 {
            y = 0.0;
        }
        h.x2 = h.x1;
        h.x1 = x;
        h.y2 = h.y1;
        h.y1 = y;
        y
    }
}

/// Wraps a decoded source and runs it through the session's effects.
pub struct EqualizedSource<S> {
    inner: S,
    params: Arc<EffectParams>,
    seen_version: Option<u64>,
    flat: bool,
    bands: Vec<Biquad>,
    bass: Biquad,
    channels: u16,
    sample_rate: u32,
    channel: usize,
}

impl<S: Source> EqualizedSource<S> {
    pub fn new(inner: S, params: Arc<EffectParams>) -> Self {
        let channels = inner.channels();
        let sample_rate = inner.sample_rate();
        let mut source = Self {
            inner,
            params,
            seen_version: None,
            flat: true,
            bands: Vec::new(),
            bass: Biquad::bypass(channels as usize),
            channels,
            sample_rate,
            channel: 0,
        };
        source.reset_filters();
        source
    }

    fn reset_filters(&mut self) {
        let channels = self.channels as usize;
        self.bands = BAND_CENTERS_HZ
            .iter()
            .map(|_| Biquad::bypass(channels))
            .collect();
        self.bass = Biquad::bypass(channels);
        self.seen_version = None;
    }

    /// Pick up format or parameter changes at a frame boundary.
    fn refresh(&mut self) {
        let channels = self.inner.channels();
        let sample_rate = self.inner.sample_rate();
        if channels != self.channels || sample_rate != self.sample_rate {
            self.channels = channels;
            self.sample_rate = sample_rate;
            self.reset_filters();
        }

        let version = self.params.version();
        if self.seen_version == Some(version) {
            return;
        }
        self.seen_version = Some(version);
        self.flat = self.params.is_flat();

        let rate = self.sample_rate as f32;
        for (band, filter) in self.bands.iter_mut().enumerate() {
            let level = self.params.level(band).unwrap_or(0);
            filter.set_peaking(rate, BAND_CENTERS_HZ[band], BAND_Q, level as f32 / 100.0);
        }
        let gain = self.params.bass() as f32 / MAX_BASS_STRENGTH as f32 * BASS_MAX_GAIN_DB;
        self.bass
            .set_low_shelf(rate, BASS_SHELF_HZ, BASS_SHELF_Q, gain);
    }
}

impl<S: Source> Iterator for EqualizedSource<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        if self.channel == 0 {
            self.refresh();
        }
        let channel = self.channel;
        self.channel = (self.channel + 1) % (self.channels.max(1) as usize);

        if self.flat {
            return Some(sample);
        }
        let mut out = self.bass.process(channel, sample);
        for filter in &mut self.bands {
            out = filter.process(channel, out);
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: Source> Source for EqualizedSource<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.inner.try_seek(pos)?;
        self.channel = 0;
        for filter in self.bands.iter_mut().chain(std::iter::once(&mut self.bass)) {
            filter.history.fill(History::default());
        }
        Ok(())
    }
}

/// Registry of live sessions' effect parameters.
///
/// The engine registers each new decoder; the equalizer looks sessions up by
/// id. Entries are weak so a released decoder's parameters go away with it.
#[derive(Debug, Clone, Default)]
pub struct SessionEffects {
    sessions: Arc<Mutex<HashMap<SessionId, Weak<EffectParams>>>>,
}

impl SessionEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create parameters for `session`; the caller keeps them alive.
    pub fn register(&self, session: SessionId) -> Arc<EffectParams> {
        let params = Arc::new(EffectParams::default());
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.retain(|_, p| p.strong_count() > 0);
            sessions.insert(session, Arc::downgrade(&params));
        }
        params
    }
}

impl EffectsProvider for SessionEffects {
    fn effects_for(&self, session: SessionId) -> Option<Box<dyn EffectsEngine>> {
        let params = self.sessions.lock().ok()?.get(&session)?.upgrade()?;
        Some(Box::new(BiquadEffects { params }))
    }
}

/// `EffectsEngine` view over one session's parameters.
pub struct BiquadEffects {
    params: Arc<EffectParams>,
}

impl EffectsEngine for BiquadEffects {
    fn number_of_bands(&self) -> u16 {
        BAND_CENTERS_HZ.len() as u16
    }

    fn band_level_range(&self) -> (i32, i32) {
        BAND_LEVEL_RANGE
    }

    fn set_band_level(&mut self, band: u16, level: i32) {
        self.params.set_level(band as usize, level);
    }

    fn set_bass_strength(&mut self, strength: u16) {
        self.params.set_bass(strength);
    }

    fn current_bass_strength(&self) -> u16 {
        self.params.bass()
    }
}
