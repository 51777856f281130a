use std::path::PathBuf;

use serde::Deserialize;

use crate::waveform::{DEFAULT_CHUNK_BYTES, DEFAULT_SAMPLES};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/wavedial/config.toml` or `~/.config/wavedial/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `WAVEDIAL__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub waveform: WaveformSettings,
    pub equalizer: EqualizerSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How often the playback position is sampled (milliseconds).
    pub progress_interval_ms: u64,
    /// Number of seconds to seek when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Start the first track as soon as the player opens.
    pub autoplay: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            scrub_seconds: 5,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaveformSettings {
    /// Envelope length (number of buckets) computed per track.
    pub samples: usize,
    /// Read buffer size used while walking the container's packets.
    pub chunk_bytes: usize,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EqualizerSettings {
    /// Preset applied when a session first binds the equalizer.
    pub default_preset: String,
    /// Knob arc start, in degrees.
    pub knob_min_angle: f32,
    /// Knob arc end, in degrees.
    pub knob_max_angle: f32,
    /// Slider increment for `+` / `-`, as a fraction of the full range.
    pub step_percent: f32,
    /// Knob rotation for `+` / `-`, in degrees.
    pub knob_step_degrees: f32,
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            default_preset: "Flat".to_string(),
            knob_min_angle: -135.0,
            knob_max_angle: 135.0,
            step_percent: 0.05,
            knob_step_degrees: 13.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ wavedial ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Log file. The terminal belongs to the UI, so logs never go to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingSettings {
    pub fn file_path(&self) -> PathBuf {
        self.file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("wavedial.log"))
    }
}
