//! File logging. The terminal is owned by the TUI, so nothing goes to stderr.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// Install the global subscriber writing to the configured log file.
///
/// `RUST_LOG` takes precedence over `logging.level`. Returns the file path.
pub fn init(settings: &LoggingSettings) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = settings.file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(filter),
        )
        .try_init()?;

    tracing::info!(path = ?path, level = %settings.level, "logging initialized");
    Ok(path)
}

/// Like [`init`], but a failure becomes a message for the status line.
pub fn init_or_report(settings: &LoggingSettings) -> Option<String> {
    init(settings)
        .err()
        .map(|e| format!("logging disabled ({}): {e}", settings.file_path().display()))
}
