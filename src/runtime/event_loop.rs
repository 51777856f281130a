use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::{App, EqFocus};
use crate::audio::{DecodeEngine, SessionEvent, SessionManager, SessionState};
use crate::config::Settings;
use crate::equalizer::{ChangeOrigin, ControlValue, EffectsProvider, EqualizerController, Knob};
use crate::error::Result;
use crate::ui;
use crate::waveform::WaveformLoader;

/// Everything the loop drives besides the view model.
///
/// All of it lives on the loop's thread; only the waveform worker runs
/// elsewhere and its results come back through `WaveformLoader::poll`.
pub struct Host<E: DecodeEngine, P: EffectsProvider> {
    pub session: SessionManager<E>,
    events: Receiver<SessionEvent>,
    pub eq: EqualizerController,
    effects: P,
    loader: WaveformLoader,
    default_preset: String,
    preset_applied: bool,
}

impl<E: DecodeEngine, P: EffectsProvider> Host<E, P> {
    pub fn new(
        session: SessionManager<E>,
        events: Receiver<SessionEvent>,
        eq: EqualizerController,
        effects: P,
        loader: WaveformLoader,
        default_preset: impl Into<String>,
    ) -> Self {
        Self {
            session,
            events,
            eq,
            effects,
            loader,
            default_preset: default_preset.into(),
            preset_applied: false,
        }
    }

    /// Run deferred session work and fold its events and any finished
    /// waveform into `app`.
    pub fn sync(&mut self, app: &mut App, now: Instant) {
        if let Err(e) = self.session.pump(now) {
            warn!(error = %e, "could not advance to the next track");
            app.set_status(e.to_string());
        }

        while let Ok(event) = self.events.try_recv() {
            self.on_session_event(app, &event);
        }

        if let Some(result) = self.loader.poll() {
            if !app.set_envelope(result.track_index, result.envelope) {
                debug!(track = result.track_index, "waveform arrived for a track no longer playing");
            }
        }
    }

    fn on_session_event(&mut self, app: &mut App, event: &SessionEvent) {
        match event {
            SessionEvent::SessionReady { session } => {
                self.eq.rebind(self.effects.effects_for(*session));
                if !self.preset_applied && self.eq.is_enabled() {
                    self.eq.apply_preset(&self.default_preset);
                    self.preset_applied = true;
                }
            }
            SessionEvent::TrackChanged { index, track } => {
                self.loader.request(*index, track.path.clone());
            }
            SessionEvent::PlaybackStateChanged { .. } | SessionEvent::Progress { .. } => {}
        }
        app.apply_event(event);
    }

    pub fn play(&mut self, app: &mut App, index: usize) {
        let played = self.session.play(index);
        report(app, played);
    }

    fn toggle_playback(&mut self, app: &mut App) {
        let result = match self.session.state() {
            SessionState::Playing => self.session.pause(),
            SessionState::Paused => self.session.resume(),
            SessionState::Idle | SessionState::Loaded => {
                if !app.has_tracks() {
                    return;
                }
                self.session.play(app.selected)
            }
        };
        report(app, result);
    }

    fn adjust_focused(&mut self, app: &App, settings: &Settings, direction: f32) {
        let eq = &settings.equalizer;
        match app.eq_focus {
            EqFocus::Band(band) => self.eq.nudge_band(band, eq.step_percent * direction),
            EqFocus::Treble => self.turn_knob(Knob::Treble, eq.knob_step_degrees * direction),
            EqFocus::Bass => self.turn_knob(Knob::Bass, eq.knob_step_degrees * direction),
        }
    }

    /// Key presses step in fixed increments, so a step that would cross the
    /// end of the arc lands on the end instead of being dropped.
    fn turn_knob(&mut self, knob: Knob, delta_deg: f32) {
        if self.eq.rotate_knob(knob, delta_deg) || !self.eq.is_enabled() {
            return;
        }
        let end = if delta_deg > 0.0 {
            ControlValue::MAX
        } else {
            ControlValue::MIN
        };
        match knob {
            Knob::Treble => self.eq.set_treble(end, ChangeOrigin::User),
            Knob::Bass => self.eq.set_bass(end, ChangeOrigin::User),
        }
    }

    /// Apply one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, settings: &Settings, app: &mut App) -> bool {
        let scrub = Duration::from_secs(settings.playback.scrub_seconds);
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => app.next(),
            KeyCode::Char('k') | KeyCode::Up => app.prev(),
            KeyCode::Enter => {
                if app.has_tracks() {
                    let index = app.selected;
                    self.play(app, index);
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('p') => self.toggle_playback(app),
            KeyCode::Char('l') => {
                let result = self.session.play_next();
                report(app, result);
            }
            KeyCode::Char('h') => {
                let result = self.session.play_previous();
                report(app, result);
            }
            KeyCode::Char('L') => {
                let result = self.session.seek_by(scrub, true);
                report(app, result);
            }
            KeyCode::Char('H') => {
                let result = self.session.seek_by(scrub, false);
                report(app, result);
            }
            KeyCode::Tab => app.focus_next(self.eq.band_count()),
            KeyCode::BackTab => app.focus_prev(self.eq.band_count()),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_focused(app, settings, 1.0),
            KeyCode::Char('-') => self.adjust_focused(app, settings, -1.0),
            KeyCode::Char('P') => self.eq.cycle_preset(),
            _ => {}
        }
        false
    }

    /// Release the decoder before the output device goes away.
    pub fn shutdown(&mut self) {
        self.session.release();
    }
}

/// Show a failed session call on the status line; a success clears it.
fn report(app: &mut App, result: Result<()>) {
    match result {
        Ok(()) => app.clear_status(),
        Err(e) => {
            warn!(error = %e, "session call failed");
            app.set_status(e.to_string());
        }
    }
}

/// Main terminal event loop: syncs with the session, draws and handles input.
/// Returns `Ok(())` when the user quits.
pub fn run<E, P>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &Settings,
    app: &mut App,
    host: &mut Host<E, P>,
) -> std::result::Result<(), Box<dyn std::error::Error>>
where
    E: DecodeEngine,
    P: EffectsProvider,
{
    loop {
        host.sync(app, Instant::now());

        terminal.draw(|f| ui::draw(f, app, &host.eq, settings))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if host.handle_key(key, settings, app) {
                    break;
                }
            }
        }
    }

    Ok(())
}
