use super::{AudioTrack, DirectoryListing, TrackListing, UNKNOWN_ARTIST, format_mmss};
use crate::config::LibrarySettings;
use std::path::PathBuf;

fn track(title: &str, artist: &str) -> AudioTrack {
    AudioTrack {
        path: PathBuf::from(format!("/music/{title}.mp3")),
        title: title.into(),
        artist: artist.into(),
        duration_ms: 0,
        cover: None,
    }
}

#[test]
fn display_joins_artist_and_title() {
    assert_eq!(track("Song", "Artist").display(), "Artist - Song");
    assert_eq!(track("Song", "  Artist  ").display(), "Artist - Song");
}

#[test]
fn display_hides_unknown_or_blank_artist() {
    assert_eq!(track("Song", UNKNOWN_ARTIST).display(), "Song");
    assert_eq!(track("Song", "   ").display(), "Song");
}

#[test]
fn format_mmss_truncates_to_whole_seconds() {
    assert_eq!(format_mmss(0), "00:00");
    assert_eq!(format_mmss(999), "00:00");
    assert_eq!(format_mmss(61_500), "01:01");
    assert_eq!(format_mmss(3_599_000), "59:59");
}

#[test]
fn directory_listing_lists_tracks_in_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("zeta.flac"), b"x").unwrap();
    std::fs::write(dir.path().join("alpha.wav"), b"x").unwrap();

    let listing = DirectoryListing::new(dir.path(), LibrarySettings::default());
    let titles: Vec<String> = listing.list_tracks().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["alpha".to_string(), "zeta".to_string()]);
}
