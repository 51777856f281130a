//! Application model types: `App`, `PlaybackState` and `EqFocus`.
//!
//! The `App` struct mirrors what the session manager last reported, plus the
//! purely visual state (selection, equalizer focus, status line).

use std::time::Duration;

use crate::audio::SessionEvent;
use crate::library::AudioTrack;
use crate::waveform::AmplitudeEnvelope;

/// The playback state as shown to the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Which equalizer control `+`/`-` act on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EqFocus {
    Band(usize),
    Treble,
    Bass,
}

impl Default for EqFocus {
    fn default() -> Self {
        Self::Band(0)
    }
}

/// The main application model.
pub struct App {
    pub tracks: Vec<AudioTrack>,
    pub selected: usize,
    pub playback: PlaybackState,
    pub now_playing: Option<usize>,
    pub position: Duration,
    pub duration: Duration,
    /// Waveform of the now-playing track, once extracted.
    pub envelope: Option<AmplitudeEnvelope>,
    /// Set on a track change until the loader answers for that track.
    pub waveform_loading: bool,
    pub eq_focus: EqFocus,
    pub status: Option<String>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<AudioTrack>) -> Self {
        Self {
            tracks,
            selected: 0,
            playback: PlaybackState::Stopped,
            now_playing: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            envelope: None,
            waveform_loading: false,
            eq_focus: EqFocus::default(),
            status: None,
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn set_selected(&mut self, idx: usize) {
        if idx < self.tracks.len() {
            self.selected = idx;
        }
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = match self.selected {
                0 => self.tracks.len() - 1,
                i => i - 1,
            };
        }
    }

    pub fn now_playing_track(&self) -> Option<&AudioTrack> {
        self.now_playing.and_then(|i| self.tracks.get(i))
    }

    /// Fold a session notification into the model.
    pub fn apply_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::TrackChanged { index, track } => {
                self.now_playing = Some(*index);
                self.set_selected(*index);
                self.position = Duration::ZERO;
                self.duration = Duration::from_millis(track.duration_ms);
                // The old track's waveform no longer applies.
                self.envelope = None;
                self.waveform_loading = true;
                if self.playback == PlaybackState::Stopped {
                    self.playback = PlaybackState::Paused;
                }
            }
            SessionEvent::PlaybackStateChanged { playing } => {
                self.playback = if *playing {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                };
            }
            SessionEvent::Progress { position, duration } => {
                self.position = *position;
                if !duration.is_zero() {
                    self.duration = *duration;
                }
            }
            SessionEvent::SessionReady { .. } => {}
        }
    }

    /// Accept an extracted waveform if it belongs to the now-playing track.
    pub fn set_envelope(&mut self, track_index: usize, envelope: Option<AmplitudeEnvelope>) -> bool {
        if self.now_playing != Some(track_index) {
            return false;
        }
        self.envelope = envelope;
        self.waveform_loading = false;
        true
    }

    /// Played fraction of the current track, `0.0..=1.0`.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Cycle focus: bands left to right, then treble, then bass.
    pub fn focus_next(&mut self, bands: usize) {
        self.eq_focus = match self.eq_focus {
            EqFocus::Band(b) if b + 1 < bands => EqFocus::Band(b + 1),
            EqFocus::Band(_) => EqFocus::Treble,
            EqFocus::Treble => EqFocus::Bass,
            EqFocus::Bass if bands > 0 => EqFocus::Band(0),
            EqFocus::Bass => EqFocus::Treble,
        };
    }

    pub fn focus_prev(&mut self, bands: usize) {
        self.eq_focus = match self.eq_focus {
            EqFocus::Band(0) => EqFocus::Bass,
            EqFocus::Band(b) => EqFocus::Band(b - 1),
            EqFocus::Treble if bands > 0 => EqFocus::Band(bands - 1),
            EqFocus::Treble => EqFocus::Bass,
            EqFocus::Bass => EqFocus::Treble,
        };
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}
