use std::path::PathBuf;

/// Artist shown when a file carries no artist tag.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// One playable track. Built once by a listing and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    /// Resource handle the decode engine and the container reader open.
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    /// Length in milliseconds; 0 when the tags did not say.
    pub duration_ms: u64,
    /// Embedded cover image bytes, if any.
    pub cover: Option<Vec<u8>>,
}

impl AudioTrack {
    /// "Artist - Title", or just the title when the artist is unknown.
    pub fn display(&self) -> String {
        let artist = self.artist.trim();
        if artist.is_empty() || artist == UNKNOWN_ARTIST {
            self.title.clone()
        } else {
            format!("{} - {}", artist, self.title)
        }
    }
}

/// Source of the ordered track list handed to the session manager.
pub trait TrackListing {
    fn list_tracks(&self) -> Vec<AudioTrack>;
}

/// Format milliseconds as `MM:SS`.
pub fn format_mmss(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
