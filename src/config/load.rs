use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `WAVEDIAL__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("WAVEDIAL")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.waveform.samples == 0 {
            return Err("waveform.samples must be >= 1".to_string());
        }
        if self.waveform.chunk_bytes < 2 {
            return Err("waveform.chunk_bytes must be >= 2".to_string());
        }
        if self.playback.progress_interval_ms == 0 {
            return Err("playback.progress_interval_ms must be >= 1".to_string());
        }
        if self.equalizer.knob_min_angle >= self.equalizer.knob_max_angle {
            return Err("equalizer.knob_min_angle must be below knob_max_angle".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `WAVEDIAL_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("WAVEDIAL_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/wavedial/config.toml`
/// or `~/.config/wavedial/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("wavedial").join("config.toml"))
}
