//! Background worker for waveform extraction.
//!
//! Requests are coalesced: only the newest pending job is kept, and results
//! for anything but the newest request are dropped in `poll`.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use tracing::{debug, warn};

use super::envelope::AmplitudeEnvelope;
use super::extract::WaveformExtractor;

struct Job {
    generation: u64,
    track_index: usize,
    path: PathBuf,
}

/// Finished extraction for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformResult {
    pub track_index: usize,
    /// `None` when the track has no usable audio payload.
    pub envelope: Option<AmplitudeEnvelope>,
}

#[derive(Default)]
struct QueueState {
    pending: Option<Job>,
    closed: bool,
}

/// Latest-only job slot.
#[derive(Default)]
struct JobQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl JobQueue {
    fn send(&self, job: Job) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(old) = state.pending.replace(job) {
                debug!(track = old.track_index, "superseded pending waveform job");
            }
            self.ready.notify_one();
        }
    }

    /// Block for the next job; `None` once the queue is closed.
    fn take_blocking(&self) -> Option<Job> {
        let mut state = self.state.lock().ok()?;
        loop {
            if state.closed {
                return None;
            }
            if let Some(job) = state.pending.take() {
                return Some(job);
            }
            state = self.ready.wait(state).ok()?;
        }
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            self.ready.notify_all();
        }
    }
}

pub struct WaveformLoader {
    queue: Arc<JobQueue>,
    results: Receiver<(u64, WaveformResult)>,
    latest: u64,
}

impl WaveformLoader {
    /// Spawn a worker extracting `samples` peaks per track with symphonia.
    pub fn spawn(extractor: WaveformExtractor, samples: usize) -> Self {
        Self::with_extract(move |path| extractor.extract_file(path, samples))
    }

    /// Spawn a worker around a custom extraction function.
    pub fn with_extract<F>(extract: F) -> Self
    where
        F: Fn(&Path) -> Option<AmplitudeEnvelope> + Send + 'static,
    {
        let queue = Arc::new(JobQueue::default());
        let (result_tx, results) = mpsc::channel();

        let worker_queue = Arc::clone(&queue);
        let spawned = thread::Builder::new()
            .name("waveform-loader".into())
            .spawn(move || {
                while let Some(job) = worker_queue.take_blocking() {
                    let envelope = extract(&job.path);
                    debug!(
                        track = job.track_index,
                        peaks = envelope.as_ref().map_or(0, |e| e.len()),
                        "waveform extracted"
                    );
                    let result = WaveformResult {
                        track_index: job.track_index,
                        envelope,
                    };
                    if result_tx.send((job.generation, result)).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "waveform loader unavailable");
        }

        Self {
            queue,
            results,
            latest: 0,
        }
    }

    /// Queue extraction for a track, superseding any earlier request.
    /// Returns the request's generation.
    pub fn request(&mut self, track_index: usize, path: PathBuf) -> u64 {
        self.latest += 1;
        self.queue.send(Job {
            generation: self.latest,
            track_index,
            path,
        });
        self.latest
    }

    /// Generation of the newest request.
    pub fn latest(&self) -> u64 {
        self.latest
    }

    /// Non-blocking: the result of the newest request if it has arrived.
    pub fn poll(&mut self) -> Option<WaveformResult> {
        let mut current = None;
        for (generation, result) in self.results.try_iter() {
            if generation == self.latest {
                current = Some(result);
            } else {
                debug!(track = result.track_index, "dropped stale waveform");
            }
        }
        current
    }
}

impl Drop for WaveformLoader {
    fn drop(&mut self) {
        self.queue.close();
    }
}
