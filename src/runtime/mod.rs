use std::env;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{RodioEngine, SessionEffects, SessionManager};
use crate::equalizer::{EqualizerController, KnobArc};
use crate::library::{DirectoryListing, TrackListing};
use crate::waveform::{WaveformExtractor, WaveformLoader};

mod event_loop;
mod logging;
mod settings;


pub use event_loop::Host;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = settings::load_settings();
    // Logging is best effort; the player works without it.
    let logging_problem = logging::init_or_report(&settings.logging);
    if let Some(problem) = &config_problem {
        warn!("{problem}");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let tracks = DirectoryListing::new(&dir, settings.library.clone()).list_tracks();
    info!(dir = %dir, tracks = tracks.len(), "library scanned");

    let effects = SessionEffects::new();
    let engine = RodioEngine::open(effects.clone())?;
    let (session, events) = SessionManager::new(
        engine,
        tracks.clone(),
        Duration::from_millis(settings.playback.progress_interval_ms),
    );
    let arc = KnobArc::new(settings.equalizer.knob_min_angle, settings.equalizer.knob_max_angle)
        .unwrap_or_default();
    let loader = WaveformLoader::spawn(
        WaveformExtractor::new(settings.waveform.chunk_bytes),
        settings.waveform.samples,
    );
    let mut host = Host::new(
        session,
        events,
        EqualizerController::disabled(arc),
        effects,
        loader,
        settings.equalizer.default_preset.clone(),
    );

    let mut app = App::new(tracks);
    if settings.playback.autoplay && app.has_tracks() {
        host.play(&mut app, 0);
    }
    // Without a log file this is the only place the problems can show up.
    if let Some(problem) = logging_problem.or(config_problem) {
        app.set_status(problem);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut host);

    host.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("bye");
    run_result
}
