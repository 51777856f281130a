use tracing::{debug, info, warn};

use super::effects::EffectsEngine;
use super::mapping::{
    BandLevelRange, ControlValue, KnobArc, percent_to_strength, strength_to_percent,
};
use super::presets::{FLAT, Preset};

/// Who caused a control change. Only user changes write to the engine, so
/// syncing widgets after a preset never loops back into the effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knob {
    Treble,
    Bass,
}

struct Bound {
    engine: Box<dyn EffectsEngine>,
    range: BandLevelRange,
}

/// Keeps band sliders, the treble knob and the bass knob consistent with one
/// effects engine.
///
/// Without a usable engine (no session, zero bands, empty level range) the
/// controller is disabled and every operation is a no-op.
pub struct EqualizerController {
    bound: Option<Bound>,
    /// Slider positions, `0..=range.span()` each.
    sliders: Vec<u32>,
    treble: ControlValue,
    bass: ControlValue,
    /// Last strength actually written to (or read from) the engine. The bass
    /// knob display can drift from it after a preset.
    bass_strength: u16,
    arc: KnobArc,
    preset: &'static Preset,
}

fn validate(engine: Option<Box<dyn EffectsEngine>>) -> Option<Bound> {
    let engine = engine?;
    let bands = engine.number_of_bands();
    let (min, max) = engine.band_level_range();
    let Some(range) = BandLevelRange::new(min, max) else {
        warn!(min, max, "effects engine reported an empty band level range");
        return None;
    };
    if bands == 0 {
        warn!("effects engine reported no bands");
        return None;
    }
    Some(Bound { engine, range })
}

impl EqualizerController {
    pub fn new(engine: Option<Box<dyn EffectsEngine>>, arc: KnobArc) -> Self {
        let mut eq = Self {
            bound: None,
            sliders: Vec::new(),
            treble: ControlValue::MIN,
            bass: ControlValue::MIN,
            bass_strength: 0,
            arc,
            preset: &FLAT,
        };
        eq.bind_fresh(engine);
        eq
    }

    /// A controller with no engine; every operation is a no-op.
    pub fn disabled(arc: KnobArc) -> Self {
        Self::new(None, arc)
    }

    fn bind_fresh(&mut self, engine: Option<Box<dyn EffectsEngine>>) {
        self.bound = validate(engine);
        let Some(bound) = &self.bound else {
            self.sliders.clear();
            return;
        };

        let bands = bound.engine.number_of_bands() as usize;
        let mid = bound.range.span() / 2;
        self.sliders = vec![mid; bands];
        self.treble = bound.range.level_to_percent(bound.range.position_to_level(mid));
        // Bass is read from the engine once, here.
        self.bass_strength = bound.engine.current_bass_strength();
        self.bass = strength_to_percent(self.bass_strength);
        debug!(
            bands,
            min = bound.range.min(),
            max = bound.range.max(),
            "equalizer bound"
        );
    }

    /// Attach the effects engine of a new session, carrying the current slider
    /// levels and the applied bass-boost strength over into it.
    ///
    /// A disabled controller binds as if freshly created.
    pub fn rebind(&mut self, engine: Option<Box<dyn EffectsEngine>>) {
        let Some(old) = self.bound.take() else {
            self.bind_fresh(engine);
            return;
        };
        let old_percents: Vec<ControlValue> = self
            .sliders
            .iter()
            .map(|&pos| old.range.level_to_percent(old.range.position_to_level(pos)))
            .collect();
        drop(old);

        self.bound = validate(engine);
        let Some(bound) = self.bound.as_mut() else {
            self.sliders.clear();
            return;
        };

        let bands = bound.engine.number_of_bands();
        self.sliders = (0..bands)
            .map(|band| {
                let percent = old_percents
                    .get(band as usize)
                    .copied()
                    .unwrap_or(ControlValue::MID);
                let level = bound.range.percent_to_level(percent);
                bound.engine.set_band_level(band, level);
                bound.range.level_to_position(level)
            })
            .collect();
        bound.engine.set_bass_strength(self.bass_strength);
        if let Some(&last) = self.sliders.last() {
            self.treble = bound
                .range
                .level_to_percent(bound.range.position_to_level(last));
        }
        debug!(bands, "equalizer rebound to new session");
    }

    pub fn is_enabled(&self) -> bool {
        self.bound.is_some()
    }

    pub fn band_count(&self) -> usize {
        self.sliders.len()
    }

    pub fn level_range(&self) -> Option<BandLevelRange> {
        self.bound.as_ref().map(|b| b.range)
    }

    pub fn slider_position(&self, band: usize) -> Option<u32> {
        self.sliders.get(band).copied()
    }

    pub fn slider_max(&self) -> u32 {
        self.bound.as_ref().map_or(0, |b| b.range.span())
    }

    pub fn band_level(&self, band: usize) -> Option<i32> {
        let range = self.level_range()?;
        self.slider_position(band)
            .map(|pos| range.position_to_level(pos))
    }

    pub fn band_percent(&self, band: usize) -> Option<ControlValue> {
        let range = self.level_range()?;
        self.band_level(band).map(|level| range.level_to_percent(level))
    }

    pub fn knob(&self, knob: Knob) -> ControlValue {
        match knob {
            Knob::Treble => self.treble,
            Knob::Bass => self.bass,
        }
    }

    pub fn knob_angle(&self, knob: Knob) -> f32 {
        self.arc.percent_to_angle(self.knob(knob))
    }

    pub fn preset_name(&self) -> &'static str {
        self.preset.name
    }

    /// Move a band slider. User changes are written to the engine as a level.
    pub fn set_band_position(&mut self, band: usize, position: u32, origin: ChangeOrigin) {
        let Some(bound) = self.bound.as_mut() else {
            return;
        };
        if band >= self.sliders.len() {
            warn!(band, bands = self.sliders.len(), "ignoring change to unknown band");
            return;
        }

        let position = position.min(bound.range.span());
        self.sliders[band] = position;
        let level = bound.range.position_to_level(position);
        if band + 1 == self.sliders.len() {
            self.treble = bound.range.level_to_percent(level);
        }
        if origin == ChangeOrigin::User {
            bound.engine.set_band_level(band as u16, level);
        }
    }

    /// Shift a band slider by a fraction of its full travel.
    pub fn nudge_band(&mut self, band: usize, delta: f32) {
        let (Some(range), Some(current)) = (self.level_range(), self.band_percent(band)) else {
            return;
        };
        let level = range.percent_to_level(current.offset(delta));
        self.set_band_position(band, range.level_to_position(level), ChangeOrigin::User);
    }

    /// Turn the treble knob. Drives the last band and drags its slider along.
    pub fn set_treble(&mut self, percent: ControlValue, origin: ChangeOrigin) {
        let Some(bound) = self.bound.as_mut() else {
            return;
        };
        let Some(last) = self.sliders.len().checked_sub(1) else {
            return;
        };

        self.treble = percent;
        let level = bound.range.percent_to_level(percent);
        if origin == ChangeOrigin::User {
            bound.engine.set_band_level(last as u16, level);
        }
        self.sliders[last] = bound.range.level_to_position(level);
    }

    /// Turn the bass knob. Drives bass-boost strength only.
    pub fn set_bass(&mut self, percent: ControlValue, origin: ChangeOrigin) {
        let Some(bound) = self.bound.as_mut() else {
            return;
        };
        self.bass = percent;
        if origin == ChangeOrigin::User {
            self.bass_strength = percent_to_strength(percent);
            bound.engine.set_bass_strength(self.bass_strength);
        }
    }

    /// Rotate a knob by `delta_deg`. Angles that leave the arc are ignored and
    /// the knob stays put; returns whether the knob moved.
    pub fn rotate_knob(&mut self, knob: Knob, delta_deg: f32) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let angle = self.knob_angle(knob) + delta_deg;
        let Some(percent) = self.arc.angle_to_percent(angle) else {
            return false;
        };
        match knob {
            Knob::Treble => self.set_treble(percent, ChangeOrigin::User),
            Knob::Bass => self.set_bass(percent, ChangeOrigin::User),
        }
        true
    }

    /// Apply a named preset (unknown names apply `Flat`).
    ///
    /// Sets every band level, syncs the sliders and the treble knob, and puts
    /// the bass knob display back at the midpoint. Bass-boost strength itself
    /// is left untouched: presets only shape the banded equalizer.
    pub fn apply_preset(&mut self, name: &str) {
        let Some(bound) = self.bound.as_mut() else {
            return;
        };
        let preset = Preset::find(name);

        for (band, slider) in self.sliders.iter_mut().enumerate() {
            let level = bound.range.percent_to_level(preset.band(band));
            bound.engine.set_band_level(band as u16, level);
            *slider = bound.range.level_to_position(level);
        }

        self.treble = preset.band(self.sliders.len().saturating_sub(1));
        self.bass = ControlValue::MID;
        self.preset = preset;
        info!(preset = preset.name, "equalizer preset applied");
    }

    /// Apply the preset after the current one.
    pub fn cycle_preset(&mut self) {
        let next = self.preset.next().name;
        self.apply_preset(next);
    }
}
