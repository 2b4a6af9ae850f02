//! Builds the [`Library`] from the artist/album/track directory hierarchy.
//!
//! The top directory holds one directory per artist, each artist directory
//! holds one directory per album, and each album directory holds the track
//! files. Read failures below the top directory are logged and skipped.

use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::model::{Album, Artist, Library, Track};

/// Parameters for a library scan.
#[derive(Debug, Clone)]
pub struct ScanOptions<'a> {
    pub top_dir: &'a Path,
    /// Track file extension including the leading dot, e.g. `.mp3`
    pub extension: &'a str,
}

/// Artist and album name filters.
#[derive(Debug, Clone)]
pub struct Filters {
    pub artist: Regex,
    pub album: Regex,
}

#[cfg(test)]
impl Default for Filters {
    fn default() -> Self {
        Self {
            artist: Regex::new(".*").unwrap(),
            album: Regex::new(".*").unwrap(),
        }
    }
}

/// List the immediate children of `dir`, sorted by name.
///
/// Unreadable entries are logged and skipped.
fn children(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
}

fn entry_name(entry: &DirEntry) -> Option<String> {
    let name = entry.file_name().to_str().map(str::to_string);
    if name.is_none() {
        warn!(path = ?entry.path(), "skipping entry with a non-UTF-8 name");
    }
    name
}

fn has_extension(file_name: &str, extension: &str) -> bool {
    file_name.len() > extension.len()
        && file_name.is_char_boundary(file_name.len() - extension.len())
        && file_name[file_name.len() - extension.len()..].eq_ignore_ascii_case(extension)
}

fn read_album(entry: &DirEntry, name: String, extension: &str) -> Album {
    let mut album = Album::new(name, entry.path());
    for child in children(entry.path()) {
        if !child.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry_name(&child) else {
            continue;
        };
        if has_extension(&file_name, extension) {
            album
                .tracks
                .push(Track::new(entry.path(), &file_name, extension));
        }
    }
    album
}

fn read_artist(
    entry: &DirEntry,
    name: String,
    extension: &str,
    album_filter: Option<&Regex>,
) -> Artist {
    let mut artist = Artist::new(name, entry.path());
    for child in children(entry.path()) {
        if !child.file_type().is_dir() {
            continue;
        }
        let Some(album_name) = entry_name(&child) else {
            continue;
        };
        if album_filter.is_some_and(|re| !re.is_match(&album_name)) {
            continue;
        }
        artist
            .albums
            .push(read_album(&child, album_name, extension));
    }
    artist
}

fn load(options: &ScanOptions<'_>, filters: Option<&Filters>) -> Result<Library> {
    // The top directory must be readable; everything below it is best effort.
    std::fs::read_dir(options.top_dir).map_err(|e| Error::filesystem(options.top_dir, e))?;

    let mut library = Library::default();
    for entry in children(options.top_dir) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry_name(&entry) else {
            continue;
        };
        match filters {
            None => {
                let artist = read_artist(&entry, name, options.extension, None);
                library.artists.push(artist);
            }
            Some(filters) => {
                if !filters.artist.is_match(&name) {
                    continue;
                }
                let artist = read_artist(&entry, name, options.extension, Some(&filters.album));
                if !artist.albums.is_empty() {
                    library.artists.push(artist);
                }
            }
        }
    }

    debug!(
        artists = library.artists.len(),
        tracks = library.track_count(),
        "library scanned"
    );
    if library.is_empty() {
        warn!(top_dir = ?options.top_dir, "no music found");
    }
    Ok(library)
}

/// Load every artist, album and track, keeping empty directories.
pub fn load_unfiltered(options: &ScanOptions<'_>) -> Result<Library> {
    load(options, None)
}

/// Load the library, keeping only artists and albums matching `filters`.
pub fn load_filtered(options: &ScanOptions<'_>, filters: &Filters) -> Result<Library> {
    load(options, Some(filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    fn layout(root: &Path) {
        touch(&root.join("Abba/Gold/01 Dancing Queen.mp3"));
        touch(&root.join("Abba/Gold/02 Waterloo.MP3"));
        touch(&root.join("Abba/Gold/cover.jpg"));
        fs::create_dir_all(root.join("Abba/Empty Album")).unwrap();
        touch(&root.join("Beck/Odelay/01 Devils Haircut.mp3"));
        fs::create_dir_all(root.join("Cher")).unwrap();
        touch(&root.join("notes.txt"));
    }

    #[test]
    fn test_unfiltered_keeps_empty_directories() {
        let dir = tempdir().unwrap();
        layout(dir.path());

        let library = load_unfiltered(&ScanOptions {
            top_dir: dir.path(),
            extension: ".mp3",
        })
        .unwrap();

        let artists: Vec<&str> = library.artists.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(artists, vec!["Abba", "Beck", "Cher"]);
        let abba = &library.artists[0];
        let albums: Vec<&str> = abba.albums.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(albums, vec!["Empty Album", "Gold"]);
        assert_eq!(abba.albums[1].tracks.len(), 2);
        assert!(library.artists[2].albums.is_empty());
    }

    #[test]
    fn test_filtered_drops_non_matching() {
        let dir = tempdir().unwrap();
        layout(dir.path());

        let filters = Filters {
            artist: Regex::new("^A").unwrap(),
            album: Regex::new("Gold").unwrap(),
        };
        let library = load_filtered(
            &ScanOptions {
                top_dir: dir.path(),
                extension: ".mp3",
            },
            &filters,
        )
        .unwrap();

        assert_eq!(library.artists.len(), 1);
        assert_eq!(library.artists[0].albums.len(), 1);
        assert_eq!(library.artists[0].albums[0].tracks[0].parsed_name, "Dancing Queen");
    }

    #[test]
    fn test_filtered_and_filter_agree() {
        let dir = tempdir().unwrap();
        layout(dir.path());
        let options = ScanOptions {
            top_dir: dir.path(),
            extension: ".mp3",
        };
        let filters = Filters {
            artist: Regex::new("b").unwrap(),
            album: Regex::new(".*").unwrap(),
        };

        let direct = load_filtered(&options, &filters).unwrap();
        let pruned = load_unfiltered(&options)
            .unwrap()
            .filter(&filters.artist, &filters.album);
        assert_eq!(direct, pruned);
    }

    #[test]
    fn test_missing_top_dir_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_unfiltered(&ScanOptions {
            top_dir: &dir.path().join("nope"),
            extension: ".mp3",
        });
        assert!(matches!(result, Err(Error::Filesystem { .. })));
    }

    #[test]
    fn test_no_music_yields_empty_library() {
        let dir = tempdir().unwrap();
        let library = load_filtered(
            &ScanOptions {
                top_dir: dir.path(),
                extension: ".mp3",
            },
            &Filters::default(),
        )
        .unwrap();
        assert!(library.is_empty());
    }
}
