//! Equalizer control layer: maps knobs and sliders onto effect parameters.

mod controller;
mod effects;
mod mapping;
mod presets;

pub use controller::{ChangeOrigin, EqualizerController, Knob};
pub use effects::{EffectsEngine, EffectsProvider};
pub use mapping::*;
pub use presets::{FLAT, PRESETS, Preset};
