//! Track listing: discovers audio files and reads their tags.
//!
//! The player core only sees `AudioTrack` values; how they are found lives
//! behind the `TrackListing` trait.

mod model;
mod scan;

pub use model::*;
pub use scan::{DirectoryListing, scan};

#[cfg(test)]
mod tests;
