use super::mapping::ControlValue;

/// Named per-band positions. Bands past the end of `levels` sit at the midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub levels: &'static [f32],
}

pub const FLAT: Preset = Preset {
    name: "Flat",
    levels: &[0.5, 0.5, 0.5, 0.5, 0.5],
};

pub const PRESETS: &[Preset] = &[
    FLAT,
    Preset {
        name: "Rock",
        levels: &[0.6, 0.8, 0.5, 0.7, 0.9],
    },
    Preset {
        name: "Jazz",
        levels: &[0.4, 0.6, 0.7, 0.6, 0.4],
    },
    Preset {
        name: "Classical",
        levels: &[0.3, 0.5, 0.6, 0.5, 0.3],
    },
    Preset {
        name: "Pop",
        levels: &[0.5, 0.7, 0.6, 0.7, 0.5],
    },
];

impl Preset {
    /// Look a preset up by exact name, falling back to `FLAT`.
    pub fn find(name: &str) -> &'static Preset {
        PRESETS.iter().find(|p| p.name == name).unwrap_or(&FLAT)
    }

    pub fn band(&self, band: usize) -> ControlValue {
        self.levels
            .get(band)
            .map_or(ControlValue::MID, |&p| ControlValue::new(p))
    }

    /// The preset after `self` in `PRESETS`, wrapping around.
    pub fn next(&self) -> &'static Preset {
        let pos = PRESETS.iter().position(|p| p.name == self.name).unwrap_or(0);
        &PRESETS[(pos + 1) % PRESETS.len()]
    }
}
