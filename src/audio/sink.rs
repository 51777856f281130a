//! rodio-backed decode engine.
//!
//! Each acquired track gets its own paused `Sink` on the shared output stream,
//! with an `EqualizedSource` between the file decoder and the mixer.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::{PlayerError, Result};
use crate::library::AudioTrack;

use super::dsp::{EffectParams, EqualizedSource, SessionEffects};
use super::engine::{CompletionCallback, DecodeEngine, Decoder};
use super::types::SessionId;

pub struct RodioEngine {
    stream: OutputStream,
    effects: SessionEffects,
    next_session: u32,
}

impl RodioEngine {
    /// Open the default output device. Effects for every decoder this engine
    /// creates are registered in `effects`.
    pub fn open(effects: SessionEffects) -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::Output(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which garbles the TUI.
        stream.log_on_drop(false);
        Ok(Self {
            stream,
            effects,
            next_session: 1,
        })
    }
}

impl DecodeEngine for RodioEngine {
    fn acquire(&mut self, track: &AudioTrack) -> Result<Box<dyn Decoder>> {
        let acquire_error = |reason: String| PlayerError::Acquire {
            path: track.path.clone(),
            reason,
        };
        let file = File::open(&track.path).map_err(|e| acquire_error(e.to_string()))?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| acquire_error(e.to_string()))?;
        let duration = source
            .total_duration()
            .unwrap_or(Duration::from_millis(track.duration_ms));

        let session = SessionId(self.next_session);
        self.next_session = self.next_session.wrapping_add(1).max(1);
        let params = self.effects.register(session);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(EqualizedSource::new(source, Arc::clone(&params)));
        sink.pause();
        debug!(session = session.0, path = ?track.path, "decoder acquired");

        Ok(Box::new(SinkDecoder {
            sink: Arc::new(sink),
            session,
            duration,
            _params: params,
            cancelled: Arc::new(AtomicBool::new(false)),
            released: false,
        }))
    }
}

struct SinkDecoder {
    sink: Arc<Sink>,
    session: SessionId,
    duration: Duration,
    /// Keeps the session's registry entry alive while the sink plays.
    _params: Arc<EffectParams>,
    /// Set on stop or release; suppresses the completion callback.
    cancelled: Arc<AtomicBool>,
    released: bool,
}

impl Decoder for SinkDecoder {
    fn start(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.sink.stop();
    }

    fn seek(&mut self, position: Duration) {
        let target = position.min(self.duration);
        if let Err(e) = self.sink.try_seek(target) {
            warn!(session = self.session.0, error = %e, "seek failed");
        }
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn session_id(&self) -> SessionId {
        self.session
    }

    fn on_completion(&mut self, callback: CompletionCallback) {
        let sink = Arc::clone(&self.sink);
        let cancelled = Arc::clone(&self.cancelled);
        let spawned = thread::Builder::new()
            .name(format!("completion-{}", self.session.0))
            .spawn(move || {
                sink.sleep_until_end();
                if !cancelled.load(Ordering::Acquire) {
                    callback();
                }
            });
        if let Err(e) = spawned {
            warn!(session = self.session.0, error = %e, "could not watch for track end");
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.cancelled.store(true, Ordering::Release);
        self.sink.stop();
        debug!(session = self.session.0, "decoder released");
    }
}
