//! Core data models for the music library.
//!
//! The library is a strict three-level tree built from the filesystem:
//! a [`Library`] owns [`Artist`]s, an artist owns [`Album`]s and an album owns
//! [`Track`]s. Upward navigation never goes through stored pointers; callers
//! that need a track's album and artist walk the tree with
//! [`Library::tracks`], which yields [`TrackRef`] coordinates.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use regex::Regex;

use crate::naming::{self, ParsedName};

/// Name of the per-album directory holding pre-repair copies of tracks.
pub const BACKUP_DIR_NAME: &str = "pre-repair-backup";

/// The four reconciled facts read from a track's leading tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagData {
    pub album: String,
    pub artist: String,
    pub title: String,
    pub track_number: i32,
    /// Digest of an otherwise unused frame, proving the tag was parsed
    pub fingerprint: String,
}

bitflags! {
    /// Disagreements between a track's filesystem names and its tags.
    ///
    /// An empty set means the track is consistent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConflictSet: u8 {
        /// Tag track number differs from the file name's number
        const NUMBERING = 1 << 0;
        /// Tag title differs from the file name's track name
        const TITLE = 1 << 1;
        /// Tag album differs from the album directory name
        const ALBUM = 1 << 2;
        /// Tag artist differs from the artist directory name
        const ARTIST = 1 << 3;
    }
}

/// Tag read state of a track.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagState {
    /// Tags have not been read yet
    #[default]
    Unread,
    /// Tags were read successfully
    Read(TagData),
    /// Tags could not be recognized
    Failed(String),
}

/// An audio file inside an album directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Base name on disk, extension included
    pub file_name: String,
    /// Full path of the file
    pub path: PathBuf,
    /// Cleaned track name parsed from the file name
    pub parsed_name: String,
    /// Leading number parsed from the file name (0 when absent)
    pub parsed_number: i32,
    pub tags: TagState,
}

impl Track {
    /// Create a track for `file_name` inside `directory`.
    pub fn new(directory: &Path, file_name: &str, extension: &str) -> Self {
        let ParsedName { number, name } = naming::parse_track_name(file_name, extension);
        Self {
            file_name: file_name.to_string(),
            path: directory.join(file_name),
            parsed_name: name,
            parsed_number: number,
            tags: TagState::Unread,
        }
    }

    /// Tag data, if it has been read successfully.
    pub fn tag_data(&self) -> Option<&TagData> {
        match &self.tags {
            TagState::Read(data) => Some(data),
            _ => None,
        }
    }
}

/// An album directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub path: PathBuf,
    pub tracks: Vec<Track>,
}

impl Album {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            tracks: Vec::new(),
        }
    }

    /// Directory holding this album's pre-repair backups.
    pub fn backup_dir(&self) -> PathBuf {
        self.path.join(BACKUP_DIR_NAME)
    }
}

/// An artist directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub name: String,
    pub path: PathBuf,
    pub albums: Vec<Album>,
}

impl Artist {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            albums: Vec::new(),
        }
    }
}

/// A track together with its owning album and artist.
#[derive(Debug, Clone, Copy)]
pub struct TrackRef<'a> {
    pub artist: &'a Artist,
    pub album: &'a Album,
    pub track: &'a Track,
}

/// Position of a track within a [`Library`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackIndex {
    pub artist: usize,
    pub album: usize,
    pub track: usize,
}

/// The scanned library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    pub artists: Vec<Artist>,
}

impl Library {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    /// Iterate over every track with its album and artist.
    pub fn tracks(&self) -> impl Iterator<Item = TrackRef<'_>> {
        self.artists.iter().flat_map(|artist| {
            artist.albums.iter().flat_map(move |album| {
                album.tracks.iter().map(move |track| TrackRef {
                    artist,
                    album,
                    track,
                })
            })
        })
    }

    /// Coordinates of every track, in library order.
    pub fn track_indices(&self) -> Vec<TrackIndex> {
        let mut indices = Vec::new();
        for (a, artist) in self.artists.iter().enumerate() {
            for (b, album) in artist.albums.iter().enumerate() {
                for t in 0..album.tracks.len() {
                    indices.push(TrackIndex {
                        artist: a,
                        album: b,
                        track: t,
                    });
                }
            }
        }
        indices
    }

    /// Resolve a coordinate produced by [`Library::track_indices`].
    pub fn get(&self, index: TrackIndex) -> Option<TrackRef<'_>> {
        let artist = self.artists.get(index.artist)?;
        let album = artist.albums.get(index.album)?;
        let track = album.tracks.get(index.track)?;
        Some(TrackRef {
            artist,
            album,
            track,
        })
    }

    pub fn track_mut(&mut self, index: TrackIndex) -> Option<&mut Track> {
        self.artists
            .get_mut(index.artist)?
            .albums
            .get_mut(index.album)?
            .tracks
            .get_mut(index.track)
    }

    pub fn track_count(&self) -> usize {
        self.artists
            .iter()
            .flat_map(|a| &a.albums)
            .map(|b| b.tracks.len())
            .sum()
    }

    /// Prune the library with the artist and album filters.
    ///
    /// Artists whose name does not match `artist_filter` are dropped, as are
    /// albums whose name does not match `album_filter`. Artists left without
    /// albums are dropped as well.
    pub fn filter(&self, artist_filter: &Regex, album_filter: &Regex) -> Library {
        let artists = self
            .artists
            .iter()
            .filter(|artist| artist_filter.is_match(&artist.name))
            .filter_map(|artist| {
                let albums: Vec<Album> = artist
                    .albums
                    .iter()
                    .filter(|album| album_filter.is_match(&album.name))
                    .cloned()
                    .collect();
                if albums.is_empty() {
                    None
                } else {
                    Some(Artist {
                        name: artist.name.clone(),
                        path: artist.path.clone(),
                        albums,
                    })
                }
            })
            .collect();
        Library { artists }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Library {
        let mut a1 = Artist::new("Beatles", "/m/Beatles");
        let mut b1 = Album::new("Help", "/m/Beatles/Help");
        b1.tracks.push(Track::new(&b1.path.clone(), "01 Help.mp3", ".mp3"));
        b1.tracks
            .push(Track::new(&b1.path.clone(), "02 Night Before.mp3", ".mp3"));
        a1.albums.push(b1);
        a1.albums.push(Album::new("Abbey Road", "/m/Beatles/Abbey Road"));
        let mut a2 = Artist::new("Kinks", "/m/Kinks");
        let mut b2 = Album::new("Arthur", "/m/Kinks/Arthur");
        b2.tracks
            .push(Track::new(&b2.path.clone(), "01 Victoria.mp3", ".mp3"));
        a2.albums.push(b2);
        Library {
            artists: vec![a1, a2],
        }
    }

    #[test]
    fn test_track_parses_file_name() {
        let track = Track::new(Path::new("/m/A/B"), "07 Song Name.mp3", ".mp3");
        assert_eq!(track.parsed_number, 7);
        assert_eq!(track.parsed_name, "Song Name");
        assert_eq!(track.path, Path::new("/m/A/B/07 Song Name.mp3"));
        assert_eq!(track.tags, TagState::Unread);
    }

    #[test]
    fn test_tracks_iterates_with_parents() {
        let library = sample();
        let names: Vec<(String, String, i32)> = library
            .tracks()
            .map(|t| (t.artist.name.clone(), t.album.name.clone(), t.track.parsed_number))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Beatles".to_string(), "Help".to_string(), 1),
                ("Beatles".to_string(), "Help".to_string(), 2),
                ("Kinks".to_string(), "Arthur".to_string(), 1),
            ]
        );
        assert_eq!(library.track_count(), 3);
    }

    #[test]
    fn test_indices_resolve() {
        let library = sample();
        let indices = library.track_indices();
        assert_eq!(indices.len(), 3);
        let last = library.get(indices[2]).unwrap();
        assert_eq!(last.track.parsed_name, "Victoria");
    }

    #[test]
    fn test_filter_prunes_artists_and_albums() {
        let library = sample();
        let filtered = library.filter(
            &Regex::new("^B").unwrap(),
            &Regex::new("Help").unwrap(),
        );
        assert_eq!(filtered.artists.len(), 1);
        assert_eq!(filtered.artists[0].albums.len(), 1);
        assert_eq!(filtered.artists[0].albums[0].name, "Help");
        // Original is untouched
        assert_eq!(library.artists[0].albums.len(), 2);
    }

    #[test]
    fn test_backup_dir() {
        let album = Album::new("Help", "/m/Beatles/Help");
        assert_eq!(
            album.backup_dir(),
            PathBuf::from("/m/Beatles/Help").join(BACKUP_DIR_NAME)
        );
    }
}
