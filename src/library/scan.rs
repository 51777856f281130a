use std::path::{Path, PathBuf};

use lofty::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{AudioTrack, TrackListing, UNKNOWN_ARTIST};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn non_blank(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read tags for one file. Unreadable tags fall back to the file stem,
/// `UNKNOWN_ARTIST` and a zero duration.
fn read_track(path: &Path) -> AudioTrack {
    let mut track = AudioTrack {
        path: path.to_path_buf(),
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string(),
        artist: UNKNOWN_ARTIST.to_string(),
        duration_ms: 0,
        cover: None,
    };

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return track;
        }
    };

    track.duration_ms = tagged.properties().duration().as_millis() as u64;

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(title) = non_blank(tag.title()) {
            track.title = title;
        }
        if let Some(artist) = non_blank(tag.artist()) {
            track.artist = artist;
        }
        track.cover = tag.pictures().first().map(|p| p.data().to_vec());
    }

    track
}

/// Walk `dir` and collect every audio file the settings accept, sorted by
/// display name (case-insensitive).
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<AudioTrack> {
    let mut tracks: Vec<AudioTrack> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable library entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            tracks.push(read_track(path));
        }
    }

    tracks.sort_by_key(|t| t.display().to_lowercase());
    debug!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}

/// Lists the audio files under one directory.
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    dir: PathBuf,
    settings: LibrarySettings,
}

impl DirectoryListing {
    pub fn new(dir: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            dir: dir.into(),
            settings,
        }
    }
}

impl TrackListing for DirectoryListing {
    fn list_tracks(&self) -> Vec<AudioTrack> {
        scan(&self.dir, &self.settings)
    }
}
