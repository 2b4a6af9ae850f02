//! Test utilities and fixtures for mp3repair tests.
//!
//! Provides helpers that lay out artist/album/track trees on disk and write
//! tagged audio files, so tests can exercise the scanner, the tag codec and
//! the commands against real files.
//!
//! # Example
//!
//! ```ignore
//! let dir = tempfile::tempdir().unwrap();
//! let path = track_file(dir.path(), "Artist", "Album", "01 Song.mp3")
//!     .tags("Album", "Artist", "Song", "1")
//!     .create();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use id3::{Tag, TagLike, Version};

use crate::model::{Album, Artist, Library, TagData, TagState, Track};

/// Bytes standing in for the audio stream of a fixture file.
pub const AUDIO_PAYLOAD: &[u8] = b"\xFF\xFB\x90\x64\x00\x00\x00\x00fake mpeg payload";

/// Write a file named `file_name` in `dir` holding [`AUDIO_PAYLOAD`] behind an
/// ID3v2.4 tag with the given frames.
pub fn write_tagged_file(
    dir: &Path,
    file_name: &str,
    album: &str,
    artist: &str,
    title: &str,
    track: &str,
) -> PathBuf {
    fs::create_dir_all(dir).expect("Failed to create fixture directory");
    let path = dir.join(file_name);
    fs::write(&path, AUDIO_PAYLOAD).expect("Failed to write fixture payload");

    let mut tag = Tag::new();
    tag.set_album(album);
    tag.set_artist(artist);
    tag.set_title(title);
    tag.set_text("TRCK", track);
    tag.write_to_path(&path, Version::Id3v24)
        .expect("Failed to write fixture tag");
    path
}

/// Builder for a track file inside `<root>/<artist>/<album>/`.
pub struct TrackFile {
    dir: PathBuf,
    file_name: String,
    tags: Option<(String, String, String, String)>,
}

/// Start describing a track file.
pub fn track_file(root: &Path, artist: &str, album: &str, file_name: &str) -> TrackFile {
    TrackFile {
        dir: root.join(artist).join(album),
        file_name: file_name.to_string(),
        tags: None,
    }
}

impl TrackFile {
    /// Give the file an ID3v2 tag.
    pub fn tags(mut self, album: &str, artist: &str, title: &str, track: &str) -> Self {
        self.tags = Some((album.into(), artist.into(), title.into(), track.into()));
        self
    }

    /// Write the file and return its path.
    pub fn create(self) -> PathBuf {
        match self.tags {
            Some((album, artist, title, track)) => {
                write_tagged_file(&self.dir, &self.file_name, &album, &artist, &title, &track)
            }
            None => {
                fs::create_dir_all(&self.dir).expect("Failed to create fixture directory");
                let path = self.dir.join(&self.file_name);
                fs::write(&path, AUDIO_PAYLOAD).expect("Failed to write fixture payload");
                path
            }
        }
    }
}

/// Write a track whose tags agree with its place in the tree.
pub fn consistent_track(root: &Path, artist: &str, album: &str, number: i32, name: &str) -> PathBuf {
    track_file(root, artist, album, &format!("{:02} {}.mp3", number, name))
        .tags(album, artist, name, &number.to_string())
        .create()
}

/// An in-memory track with tags already "read".
pub fn mock_track(number: i32, name: &str, tags: Option<TagData>) -> Track {
    let mut track = Track::new(
        Path::new("/music/Artist/Album"),
        &format!("{:02} {}.mp3", number, name),
        ".mp3",
    );
    if let Some(tags) = tags {
        track.tags = TagState::Read(tags);
    }
    track
}

/// Tag data with the given values and no fingerprint.
pub fn mock_tags(album: &str, artist: &str, title: &str, number: i32) -> TagData {
    TagData {
        album: album.into(),
        artist: artist.into(),
        title: title.into(),
        track_number: number,
        fingerprint: String::new(),
    }
}

/// An in-memory library with a single artist and album holding `tracks`.
pub fn mock_library(artist: &str, album: &str, tracks: Vec<Track>) -> Library {
    let mut a = Artist::new(artist, PathBuf::from("/music").join(artist));
    let mut b = Album::new(album, a.path.join(album));
    b.tracks = tracks;
    a.albums.push(b);
    Library { artists: vec![a] }
}
