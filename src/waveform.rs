//! Waveform envelopes: extraction from container payloads and a background
//! loader that keeps only the newest track's result.

mod demux;
mod envelope;
mod extract;
mod loader;

pub use demux::{Demuxer, SymphoniaDemuxer};
pub use envelope::AmplitudeEnvelope;
pub use extract::{DEFAULT_CHUNK_BYTES, DEFAULT_SAMPLES, WaveformExtractor, downsample, push_magnitudes};
pub use loader::{WaveformLoader, WaveformResult};
