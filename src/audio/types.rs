//! Audio-related small types shared by the session and its observers.

use std::time::Duration;

use crate::library::AudioTrack;

/// Identifies one decoder's output so effects can attach to it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u32);

/// Lifecycle of the playback session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No decoder is live.
    #[default]
    Idle,
    /// A decoder is bound to the current track but was never started.
    Loaded,
    Playing,
    Paused,
}

/// Notifications published by the session manager.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new track was loaded.
    TrackChanged { index: usize, track: AudioTrack },
    /// Playback started (`true`) or paused (`false`).
    PlaybackStateChanged { playing: bool },
    /// The new decoder's session id, for binding effects.
    SessionReady { session: SessionId },
    /// Periodic position sample.
    Progress {
        position: Duration,
        duration: Duration,
    },
}
