use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use proptest::prelude::*;

use super::*;
use crate::equalizer::EffectsProvider;
use crate::error::PlayerError;
use crate::library::AudioTrack;

#[derive(Default)]
struct Shared {
    acquired: usize,
    released: usize,
    live: usize,
    max_live: usize,
    started: usize,
    paused: usize,
    stopped: usize,
    seeks: Vec<Duration>,
    fail_paths: Vec<PathBuf>,
    /// Completion callbacks by session id; firing one simulates a natural end.
    completions: Vec<(u32, CompletionCallback)>,
}

#[derive(Clone, Default)]
struct FakeEngine {
    shared: Arc<Mutex<Shared>>,
    next_session: u32,
}

impl FakeEngine {
    fn fail_on(&self, path: &str) {
        self.shared.lock().unwrap().fail_paths.push(PathBuf::from(path));
    }

    fn fire_completion(&self, session: SessionId) {
        let callback = {
            let mut s = self.shared.lock().unwrap();
            let pos = s
                .completions
                .iter()
                .position(|(id, _)| *id == session.0)
                .expect("no completion callback for session");
            s.completions.remove(pos).1
        };
        callback();
    }

    fn stats(&self) -> (usize, usize, usize) {
        let s = self.shared.lock().unwrap();
        (s.acquired, s.released, s.live)
    }
}

impl DecodeEngine for FakeEngine {
    fn acquire(&mut self, track: &AudioTrack) -> crate::error::Result<Box<dyn Decoder>> {
        let mut s = self.shared.lock().unwrap();
        if s.fail_paths.contains(&track.path) {
            return Err(PlayerError::Acquire {
                path: track.path.clone(),
                reason: "unsupported".into(),
            });
        }
        self.next_session += 1;
        s.acquired += 1;
        s.live += 1;
        s.max_live = s.max_live.max(s.live);
        Ok(Box::new(FakeDecoder {
            shared: Arc::clone(&self.shared),
            session: SessionId(self.next_session),
            position: Duration::ZERO,
            duration: Duration::from_millis(track.duration_ms),
            released: false,
        }))
    }
}

struct FakeDecoder {
    shared: Arc<Mutex<Shared>>,
    session: SessionId,
    position: Duration,
    duration: Duration,
    released: bool,
}

impl Decoder for FakeDecoder {
    fn start(&mut self) {
        self.shared.lock().unwrap().started += 1;
    }

    fn pause(&mut self) {
        self.shared.lock().unwrap().paused += 1;
    }

    fn stop(&mut self) {
        self.shared.lock().unwrap().stopped += 1;
    }

    fn seek(&mut self, position: Duration) {
        self.position = position.min(self.duration);
        self.shared.lock().unwrap().seeks.push(position);
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn session_id(&self) -> SessionId {
        self.session
    }

    fn on_completion(&mut self, callback: CompletionCallback) {
        self.shared
            .lock()
            .unwrap()
            .completions
            .push((self.session.0, callback));
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut s = self.shared.lock().unwrap();
        s.released += 1;
        s.live -= 1;
    }
}

fn track(name: &str) -> AudioTrack {
    AudioTrack {
        path: PathBuf::from(name),
        title: name.to_string(),
        artist: "Artist".to_string(),
        duration_ms: 180_000,
        cover: None,
    }
}

fn manager(
    n: usize,
) -> (
    SessionManager<FakeEngine>,
    Receiver<SessionEvent>,
    FakeEngine,
) {
    let engine = FakeEngine::default();
    let tracks = (0..n).map(|i| track(&format!("t{i}.mp3"))).collect();
    let (mgr, rx) = SessionManager::new(engine.clone(), tracks, Duration::from_secs(1));
    (mgr, rx, engine)
}

fn drain(rx: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
    rx.try_iter().collect()
}

#[test]
fn new_manager_is_idle_at_index_zero() {
    let (mgr, _rx, _) = manager(3);
    assert_eq!(mgr.state(), SessionState::Idle);
    assert_eq!(mgr.current_index(), 0);
    assert!(mgr.current_track().is_none());
    assert_eq!(mgr.position(), Duration::ZERO);
}

#[test]
fn play_emits_ready_track_changed_then_playing() {
    let (mut mgr, rx, _) = manager(3);
    mgr.play(1).unwrap();

    let events = drain(&rx);
    assert_eq!(events.len(), 3);
    let session = match &events[0] {
        SessionEvent::SessionReady { session } => *session,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(Some(session), mgr.session_id());
    assert!(matches!(&events[1], SessionEvent::TrackChanged { index: 1, track } if track.title == "t1.mp3"));
    assert!(matches!(events[2], SessionEvent::PlaybackStateChanged { playing: true }));
    assert_eq!(mgr.state(), SessionState::Playing);
}

#[test]
fn load_track_does_not_start() {
    let (mut mgr, rx, engine) = manager(2);
    mgr.load_track(1).unwrap();
    assert_eq!(mgr.state(), SessionState::Loaded);
    assert_eq!(engine.shared.lock().unwrap().started, 0);
    assert_eq!(drain(&rx).len(), 2);
}

#[test]
fn at_most_one_decoder_is_live() {
    let (mut mgr, _rx, engine) = manager(3);
    mgr.play(0).unwrap();
    mgr.play_next().unwrap();
    mgr.play(2).unwrap();
    mgr.play_previous().unwrap();

    let (acquired, released, live) = engine.stats();
    assert_eq!(acquired, 4);
    assert_eq!(released, 3);
    assert_eq!(live, 1);
    assert_eq!(engine.shared.lock().unwrap().max_live, 1);
}

#[derive(Debug, Clone)]
enum Op {
    Play(usize),
    Next,
    Previous,
    Release,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..5).prop_map(Op::Play),
        Just(Op::Next),
        Just(Op::Previous),
        Just(Op::Release),
    ]
}

proptest! {
    #[test]
    fn any_op_sequence_keeps_one_decoder_live(ops in prop::collection::vec(op(), 1..40)) {
        let (mut mgr, _rx, engine) = manager(4);
        // One unreadable track so failed acquisitions are part of the mix.
        engine.fail_on("t2.mp3");

        for op in ops {
            let _ = match op {
                Op::Play(i) => mgr.play(i),
                Op::Next => mgr.play_next(),
                Op::Previous => mgr.play_previous(),
                Op::Release => {
                    mgr.release();
                    Ok(())
                }
            };
            let (_, _, live) = engine.stats();
            prop_assert!(live <= 1);
            prop_assert_eq!(live, usize::from(mgr.session_id().is_some()));
        }

        prop_assert!(engine.shared.lock().unwrap().max_live <= 1);
        drop(mgr);
        prop_assert_eq!(engine.stats().2, 0);
    }
}

#[test]
fn next_wraps_from_last_to_first() {
    let (mut mgr, _rx, _) = manager(3);
    mgr.play(2).unwrap();
    mgr.play_next().unwrap();
    assert_eq!(mgr.current_index(), 0);
}

#[test]
fn previous_wraps_from_first_to_last() {
    let (mut mgr, _rx, _) = manager(3);
    mgr.play(0).unwrap();
    mgr.play_previous().unwrap();
    assert_eq!(mgr.current_index(), 2);
}

#[test]
fn next_from_fresh_manager_plays_second_track() {
    let (mut mgr, _rx, _) = manager(3);
    mgr.play_next().unwrap();
    assert_eq!(mgr.current_index(), 1);
}

#[test]
fn single_track_next_and_previous_reload_it() {
    let (mut mgr, _rx, engine) = manager(1);
    mgr.play(0).unwrap();
    mgr.play_next().unwrap();
    mgr.play_previous().unwrap();
    assert_eq!(mgr.current_index(), 0);
    assert_eq!(engine.stats(), (3, 2, 1));
}

#[test]
fn navigation_on_empty_list_fails() {
    let (mut mgr, _rx, _) = manager(0);
    assert!(matches!(mgr.play_next(), Err(PlayerError::NoTracks)));
    assert!(matches!(mgr.play_previous(), Err(PlayerError::NoTracks)));
}

#[test]
fn out_of_range_index_fails_without_touching_the_live_decoder() {
    let (mut mgr, rx, engine) = manager(2);
    mgr.play(0).unwrap();
    drain(&rx);

    let err = mgr.play(5).unwrap_err();
    assert!(matches!(err, PlayerError::TrackIndexOutOfRange { index: 5, len: 2 }));
    assert_eq!(mgr.state(), SessionState::Playing);
    assert_eq!(engine.stats(), (1, 0, 1));
    assert!(drain(&rx).is_empty());
}

#[test]
fn pause_and_resume_toggle_state() {
    let (mut mgr, rx, engine) = manager(2);
    mgr.play(0).unwrap();
    drain(&rx);

    mgr.pause().unwrap();
    assert_eq!(mgr.state(), SessionState::Paused);
    mgr.resume().unwrap();
    assert_eq!(mgr.state(), SessionState::Playing);

    let events = drain(&rx);
    assert!(matches!(events[0], SessionEvent::PlaybackStateChanged { playing: false }));
    assert!(matches!(events[1], SessionEvent::PlaybackStateChanged { playing: true }));
    let s = engine.shared.lock().unwrap();
    assert_eq!((s.started, s.paused), (2, 1));
}

#[test]
fn resume_and_pause_from_wrong_state_fail() {
    let (mut mgr, _rx, _) = manager(2);
    assert!(matches!(
        mgr.resume(),
        Err(PlayerError::InvalidState { op: "resume", state: SessionState::Idle })
    ));
    assert!(matches!(mgr.pause(), Err(PlayerError::InvalidState { op: "pause", .. })));

    mgr.load_track(0).unwrap();
    assert!(matches!(
        mgr.resume(),
        Err(PlayerError::InvalidState { state: SessionState::Loaded, .. })
    ));
}

#[test]
fn seek_without_decoder_is_an_error() {
    let (mut mgr, _rx, _) = manager(2);
    assert!(matches!(
        mgr.seek_to(Duration::from_secs(3)),
        Err(PlayerError::NoDecoder { op: "seek" })
    ));
}

#[test]
fn seek_forwards_to_decoder_and_seek_by_clamps_at_zero() {
    let (mut mgr, _rx, engine) = manager(2);
    mgr.play(0).unwrap();
    mgr.seek_to(Duration::from_secs(30)).unwrap();
    assert_eq!(mgr.position(), Duration::from_secs(30));

    mgr.seek_by(Duration::from_secs(5), true).unwrap();
    assert_eq!(mgr.position(), Duration::from_secs(35));
    mgr.seek_by(Duration::from_secs(60), false).unwrap();
    assert_eq!(mgr.position(), Duration::ZERO);
    assert_eq!(engine.shared.lock().unwrap().seeks.len(), 3);
}

#[test]
fn release_is_idempotent() {
    let (mut mgr, _rx, engine) = manager(2);
    mgr.play(0).unwrap();
    mgr.release();
    mgr.release();
    assert_eq!(mgr.state(), SessionState::Idle);
    assert_eq!(engine.stats(), (1, 1, 0));
    assert_eq!(engine.shared.lock().unwrap().stopped, 1);
    assert!(mgr.session_id().is_none());
}

#[test]
fn dropping_the_manager_releases_the_decoder() {
    let (mut mgr, _rx, engine) = manager(2);
    mgr.play(0).unwrap();
    drop(mgr);
    assert_eq!(engine.stats(), (1, 1, 0));
}

#[test]
fn failed_acquire_leaves_session_idle_and_silent() {
    let (mut mgr, rx, engine) = manager(3);
    engine.fail_on("t1.mp3");
    mgr.play(0).unwrap();
    drain(&rx);

    let err = mgr.play_next().unwrap_err();
    assert!(matches!(err, PlayerError::Acquire { .. }));
    assert_eq!(mgr.state(), SessionState::Idle);
    assert_eq!(mgr.current_index(), 0);
    assert_eq!(engine.stats(), (1, 1, 0));
    assert!(drain(&rx).is_empty());
}

#[test]
fn completion_advances_to_next_track_on_pump() {
    let (mut mgr, rx, engine) = manager(3);
    mgr.play(2).unwrap();
    let session = mgr.session_id().unwrap();
    drain(&rx);

    engine.fire_completion(session);
    assert_eq!(mgr.current_index(), 2, "completion is deferred to pump");
    mgr.pump(Instant::now()).unwrap();

    assert_eq!(mgr.current_index(), 0);
    assert_eq!(mgr.state(), SessionState::Playing);
    let events = drain(&rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::TrackChanged { index: 0, .. })));
}

#[test]
fn stale_completion_is_ignored() {
    let (mut mgr, rx, engine) = manager(3);
    mgr.play(0).unwrap();
    let first = mgr.session_id().unwrap();
    mgr.play(1).unwrap();
    drain(&rx);

    engine.fire_completion(first);
    mgr.pump(Instant::now()).unwrap();
    assert_eq!(mgr.current_index(), 1);
    assert!(!drain(&rx)
        .iter()
        .any(|e| matches!(e, SessionEvent::TrackChanged { .. })));
}

#[test]
fn completion_after_release_is_ignored() {
    let (mut mgr, _rx, engine) = manager(3);
    mgr.play(0).unwrap();
    let session = mgr.session_id().unwrap();
    mgr.release();

    engine.fire_completion(session);
    mgr.pump(Instant::now()).unwrap();
    assert_eq!(mgr.state(), SessionState::Idle);
    assert_eq!(engine.stats(), (1, 1, 0));
}

#[test]
fn progress_is_sampled_on_interval_while_loaded() {
    let (mut mgr, rx, _) = manager(2);
    mgr.play(0).unwrap();
    drain(&rx);

    let t0 = Instant::now() + Duration::from_millis(1);
    mgr.pump(t0).unwrap();
    mgr.pump(t0 + Duration::from_millis(500)).unwrap();
    mgr.pump(t0 + Duration::from_millis(1000)).unwrap();

    let progress: Vec<_> = drain(&rx)
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Progress { position, duration } => Some((position, duration)),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 2);
    assert_eq!(progress[0], (Duration::ZERO, Duration::from_secs(180)));
}

#[test]
fn progress_continues_while_paused_and_stops_after_release() {
    let (mut mgr, rx, _) = manager(2);
    mgr.play(0).unwrap();
    mgr.pause().unwrap();
    let t0 = Instant::now() + Duration::from_millis(1);
    mgr.pump(t0).unwrap();
    mgr.release();
    drain(&rx);

    mgr.pump(t0 + Duration::from_secs(5)).unwrap();
    assert!(drain(&rx).is_empty());
}

#[test]
fn progress_ticker_fires_immediately_then_on_interval() {
    let mut ticker = ProgressTicker::new(Duration::from_millis(100));
    let t0 = Instant::now();
    assert!(!ticker.due(t0), "not running yet");

    ticker.start(t0);
    assert!(ticker.due(t0));
    assert!(!ticker.due(t0 + Duration::from_millis(50)));
    assert!(ticker.due(t0 + Duration::from_millis(100)));

    ticker.stop();
    assert!(!ticker.is_running());
    assert!(!ticker.due(t0 + Duration::from_secs(10)));
}

#[test]
fn session_effects_resolve_only_live_sessions() {
    let registry = SessionEffects::new();
    let params = registry.register(SessionId(7));

    let mut fx = registry.effects_for(SessionId(7)).expect("registered");
    assert_eq!(fx.number_of_bands(), 5);
    assert_eq!(fx.band_level_range(), BAND_LEVEL_RANGE);

    let before = params.version();
    fx.set_band_level(2, 2000);
    fx.set_bass_strength(1500);
    assert_eq!(params.level(2), Some(1500));
    assert_eq!(params.bass(), 1000);
    assert_eq!(fx.current_bass_strength(), 1000);
    assert!(params.version() > before);

    assert!(registry.effects_for(SessionId(8)).is_none());
    drop(fx);
    drop(params);
    assert!(registry.effects_for(SessionId(7)).is_none());
}

#[test]
fn effect_params_ignore_unknown_band() {
    let params = EffectParams::default();
    let before = params.version();
    params.set_level(9, 100);
    assert_eq!(params.level(9), None);
    assert_eq!(params.version(), before);
}

#[test]
fn flat_equalizer_passes_samples_through() {
    let samples = vec![0.1f32, -0.2, 0.3, -0.4, 0.5, -0.6];
    let params = Arc::new(EffectParams::default());
    let source = rodio::buffer::SamplesBuffer::new(2, 44_100, samples.clone());
    let out: Vec<f32> = EqualizedSource::new(source, params).collect();
    assert_eq!(out, samples);
}

#[test]
fn boosted_band_changes_the_signal() {
    let samples: Vec<f32> = (0..4410)
        .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * 60.0 / 44_100.0).sin() * 0.25)
        .collect();
    let params = Arc::new(EffectParams::default());
    params.set_level(0, 1200);
    let source = rodio::buffer::SamplesBuffer::new(1, 44_100, samples.clone());
    let out: Vec<f32> = EqualizedSource::new(source, Arc::clone(&params)).collect();

    assert_eq!(out.len(), samples.len());
    let peak_in = samples.iter().fold(0f32, |m, s| m.max(s.abs()));
    let peak_out = out.iter().fold(0f32, |m, s| m.max(s.abs()));
    assert!(peak_out > peak_in * 1.5, "{peak_out} vs {peak_in}");
}
