use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{PlayerError, Result};
use crate::library::AudioTrack;

use super::engine::{DecodeEngine, DecoderSlot};
use super::progress::ProgressTicker;
use super::types::{SessionEvent, SessionId, SessionState};

/// Owns the track list, the current index and the single live decoder.
///
/// Everything runs on the caller's thread. Decoder completion arrives through
/// an internal channel and is acted on in `pump`, together with progress
/// sampling, so engine threads never call back into the manager.
pub struct SessionManager<E: DecodeEngine> {
    engine: E,
    tracks: Vec<AudioTrack>,
    index: usize,
    decoder: Option<DecoderSlot>,
    state: SessionState,
    /// Bumped per load; completions carrying an older value are stale.
    generation: u64,
    events: Sender<SessionEvent>,
    completion_tx: Sender<u64>,
    completion_rx: Receiver<u64>,
    ticker: ProgressTicker,
}

impl<E: DecodeEngine> SessionManager<E> {
    /// Create a manager and the receiving end of its event stream.
    pub fn new(
        engine: E,
        tracks: Vec<AudioTrack>,
        progress_interval: Duration,
    ) -> (Self, Receiver<SessionEvent>) {
        let (events, events_rx) = mpsc::channel();
        let (completion_tx, completion_rx) = mpsc::channel();
        let manager = Self {
            engine,
            tracks,
            index: 0,
            decoder: None,
            state: SessionState::Idle,
            generation: 0,
            events,
            completion_tx,
            completion_rx,
            ticker: ProgressTicker::new(progress_interval),
        };
        (manager, events_rx)
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is not an error.
        let _ = self.events.send(event);
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_track(&self) -> Option<&AudioTrack> {
        self.decoder.as_ref().and_then(|_| self.tracks.get(self.index))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.decoder.as_ref().map(|d| d.session_id())
    }

    pub fn position(&self) -> Duration {
        self.decoder.as_ref().map_or(Duration::ZERO, |d| d.position())
    }

    pub fn duration(&self) -> Duration {
        self.decoder.as_ref().map_or(Duration::ZERO, |d| d.duration())
    }

    /// Bind a fresh decoder to track `index` without starting it.
    ///
    /// The index is checked before anything is torn down. The previous decoder
    /// is always released before the new one is acquired; if acquisition fails
    /// the session is left `Idle` on its old index and no events are sent.
    pub fn load_track(&mut self, index: usize) -> Result<()> {
        let track = self
            .tracks
            .get(index)
            .cloned()
            .ok_or(PlayerError::TrackIndexOutOfRange {
                index,
                len: self.tracks.len(),
            })?;

        self.release();

        let mut decoder = DecoderSlot::new(self.engine.acquire(&track)?);
        self.generation += 1;
        let generation = self.generation;
        let completion_tx = self.completion_tx.clone();
        decoder.on_completion(Box::new(move || {
            let _ = completion_tx.send(generation);
        }));

        let session = decoder.session_id();
        self.decoder = Some(decoder);
        self.index = index;
        self.state = SessionState::Loaded;
        self.ticker.start(Instant::now());

        info!(index, title = %track.title, session = session.0, "track loaded");
        self.emit(SessionEvent::SessionReady { session });
        self.emit(SessionEvent::TrackChanged { index, track });
        Ok(())
    }

    /// Load track `index` and start it.
    pub fn play(&mut self, index: usize) -> Result<()> {
        self.load_track(index)?;
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.start();
        }
        self.state = SessionState::Playing;
        self.emit(SessionEvent::PlaybackStateChanged { playing: true });
        Ok(())
    }

    /// Continue a paused track. Fails from any other state.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != SessionState::Paused {
            return Err(PlayerError::InvalidState {
                op: "resume",
                state: self.state,
            });
        }
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.start();
        }
        self.state = SessionState::Playing;
        self.emit(SessionEvent::PlaybackStateChanged { playing: true });
        Ok(())
    }

    /// Pause a playing track, keeping its decoder. Fails from any other state.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != SessionState::Playing {
            return Err(PlayerError::InvalidState {
                op: "pause",
                state: self.state,
            });
        }
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.pause();
        }
        self.state = SessionState::Paused;
        self.emit(SessionEvent::PlaybackStateChanged { playing: false });
        Ok(())
    }

    /// Play the following track, wrapping from the last to the first.
    pub fn play_next(&mut self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(PlayerError::NoTracks);
        }
        let next = (self.index + 1) % self.tracks.len();
        self.play(next)
    }

    /// Play the preceding track, wrapping from the first to the last.
    pub fn play_previous(&mut self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(PlayerError::NoTracks);
        }
        let prev = match self.index {
            0 => self.tracks.len() - 1,
            i => i - 1,
        };
        self.play(prev)
    }

    /// Seek the live decoder. Without one this is a lifecycle error.
    pub fn seek_to(&mut self, position: Duration) -> Result<()> {
        let decoder = self
            .decoder
            .as_mut()
            .ok_or(PlayerError::NoDecoder { op: "seek" })?;
        decoder.seek(position);
        Ok(())
    }

    /// Seek relative to the current position, stopping at zero.
    pub fn seek_by(&mut self, offset: Duration, forward: bool) -> Result<()> {
        let current = self.position();
        let target = if forward {
            current + offset
        } else {
            current.saturating_sub(offset)
        };
        self.seek_to(target)
    }

    /// Run deferred work: advance after a natural track end and publish a
    /// progress sample when one is due. Call this from the owning loop.
    pub fn pump(&mut self, now: Instant) -> Result<()> {
        let mut completed = false;
        while let Ok(generation) = self.completion_rx.try_recv() {
            if generation == self.generation && self.decoder.is_some() {
                completed = true;
            }
        }
        if completed {
            debug!(index = self.index, "track completed");
            self.play_next()?;
        }

        if self.decoder.is_some() && self.ticker.due(now) {
            self.emit(SessionEvent::Progress {
                position: self.position(),
                duration: self.duration(),
            });
        }
        Ok(())
    }

    /// Release the live decoder, if any, and stop progress sampling.
    ///
    /// Safe from any state and idempotent.
    pub fn release(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            debug!(session = decoder.session_id().0, "releasing decoder");
            decoder.stop();
            drop(decoder);
        }
        self.state = SessionState::Idle;
        self.ticker.stop();
    }
}
