use std::time::{Duration, Instant};

/// Fixed-interval timer for position sampling, driven by the caller's loop.
///
/// It only decides *when* to sample; the value always comes from the decoder,
/// so pausing needs no drift correction.
#[derive(Debug, Clone)]
pub struct ProgressTicker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl ProgressTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Arm the ticker; the first sample is due immediately.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Whether a sample is due at `now`; schedules the next one if so.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(at) if now >= at => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
