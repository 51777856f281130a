//! Conversions between physical controls and effect parameters.
//!
//! Every control is a view of one normalised `ControlValue`. Knobs reject
//! angles outside their arc; levels and strengths clamp.

/// Bass-boost strength ceiling (permille).
pub const MAX_BASS_STRENGTH: u16 = 1000;

/// Normalised control position in `[0, 1]`. Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ControlValue(f32);

impl ControlValue {
    pub const MIN: Self = Self(0.0);
    pub const MID: Self = Self(0.5);
    pub const MAX: Self = Self(1.0);

    /// NaN maps to 0.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Move by `delta`, clamping at the ends.
    pub fn offset(self, delta: f32) -> Self {
        Self::new(self.0 + delta)
    }
}

impl From<f32> for ControlValue {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// Angular travel of a rotary knob, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnobArc {
    min_deg: f32,
    max_deg: f32,
}

impl Default for KnobArc {
    fn default() -> Self {
        Self {
            min_deg: -135.0,
            max_deg: 135.0,
        }
    }
}

impl KnobArc {
    /// Returns `None` unless `min_deg < max_deg`.
    pub fn new(min_deg: f32, max_deg: f32) -> Option<Self> {
        (min_deg < max_deg).then_some(Self { min_deg, max_deg })
    }

    pub fn min_deg(&self) -> f32 {
        self.min_deg
    }

    pub fn max_deg(&self) -> f32 {
        self.max_deg
    }

    /// Position on the arc, or `None` when `angle` lies outside it.
    ///
    /// Callers drop the update instead of clamping so the knob never jumps.
    pub fn angle_to_percent(&self, angle: f32) -> Option<ControlValue> {
        if !(self.min_deg..=self.max_deg).contains(&angle) {
            return None;
        }
        Some(ControlValue::new(
            (angle - self.min_deg) / (self.max_deg - self.min_deg),
        ))
    }

    pub fn percent_to_angle(&self, percent: ControlValue) -> f32 {
        self.min_deg + percent.get() * (self.max_deg - self.min_deg)
    }
}

/// Gain bounds reported by the effects engine, in millibels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandLevelRange {
    min: i32,
    max: i32,
}

impl BandLevelRange {
    /// Returns `None` for an empty or inverted range.
    pub fn new(min: i32, max: i32) -> Option<Self> {
        (min < max).then_some(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Width of the range; also the top position of a linear slider.
    pub fn span(&self) -> u32 {
        self.max.abs_diff(self.min)
    }

    pub fn percent_to_level(&self, percent: ControlValue) -> i32 {
        let level = self.min as f64 + percent.get() as f64 * (self.max - self.min) as f64;
        (level.round() as i32).clamp(self.min, self.max)
    }

    pub fn level_to_percent(&self, level: i32) -> ControlValue {
        let level = level.clamp(self.min, self.max);
        ControlValue::new((level - self.min) as f32 / (self.max - self.min) as f32)
    }

    /// Slider position (`0..=span`) for a level.
    pub fn level_to_position(&self, level: i32) -> u32 {
        level.clamp(self.min, self.max).abs_diff(self.min)
    }

    /// Level for a slider position; positions past the top clamp to `max`.
    pub fn position_to_level(&self, position: u32) -> i32 {
        let position = position.min(self.span());
        (self.min as i64 + position as i64) as i32
    }
}

pub fn percent_to_strength(percent: ControlValue) -> u16 {
    let strength = (percent.get() as f64 * MAX_BASS_STRENGTH as f64).round();
    (strength as i64).clamp(0, MAX_BASS_STRENGTH as i64) as u16
}

pub fn strength_to_percent(strength: u16) -> ControlValue {
    ControlValue::new(strength.min(MAX_BASS_STRENGTH) as f32 / MAX_BASS_STRENGTH as f32)
}
