//! Reconciliation of filesystem names against embedded tags, plus the
//! library checks built on it.
//!
//! # Checks
//!
//! - [`check_empty`]: artists without albums, albums without tracks
//! - [`check_gaps`]: missing, duplicated and out-of-range track numbers
//! - [`check_integrity`]: per-track disagreements between names and tags
//!
//! Each check returns an [`IssueReport`]; reports are combined with
//! [`IssueReport::merge`].

mod empty;
mod gaps;
mod issues;

use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata;
use crate::model::{ConflictSet, Library, TagState, Track, TrackIndex, TrackRef};
use crate::naming::same_name;

pub use empty::{NO_ALBUMS, NO_TRACKS, check_empty};
pub use gaps::{album_gaps, check_gaps};
pub use issues::{AlbumIssues, ArtistIssues, IssueReport, TrackKey};

/// Diagnostic for a track whose tags could not be parsed.
pub const UNRECOGNIZED_TAGS: &str = "differences cannot be determined: tags were not recognized";

/// Compare a track's filesystem-derived facts with its tag.
///
/// Pure once the tags are read: a track whose tags failed to parse has no
/// reconcilable differences.
///
/// # Errors
///
/// [`Error::NotReady`] if the track's tags have not been read.
pub fn reconcile(artist: &str, album: &str, track: &Track) -> Result<ConflictSet> {
    let tags = match &track.tags {
        TagState::Unread => return Err(Error::NotReady(track.path.clone())),
        TagState::Failed(_) => return Ok(ConflictSet::empty()),
        TagState::Read(tags) => tags,
    };

    let mut conflicts = ConflictSet::empty();
    if tags.track_number != track.parsed_number {
        conflicts |= ConflictSet::NUMBERING;
    }
    if !same_name(&tags.title, &track.parsed_name) {
        conflicts |= ConflictSet::TITLE;
    }
    if !same_name(&tags.album, album) {
        conflicts |= ConflictSet::ALBUM;
    }
    if !same_name(&tags.artist, artist) {
        conflicts |= ConflictSet::ARTIST;
    }
    Ok(conflicts)
}

/// [`reconcile`] for a track located in a library.
pub fn reconcile_ref(track: TrackRef<'_>) -> Result<ConflictSet> {
    reconcile(&track.artist.name, &track.album.name, track.track)
}

/// Integrity issue descriptions for a conflict set, in reporting order.
pub fn conflict_descriptions(conflicts: ConflictSet) -> Vec<&'static str> {
    let mut descs = Vec::new();
    if conflicts.contains(ConflictSet::NUMBERING) {
        descs.push("metadata does not agree with track number");
    }
    if conflicts.contains(ConflictSet::TITLE) {
        descs.push("metadata does not agree with track name");
    }
    if conflicts.contains(ConflictSet::ALBUM) {
        descs.push("metadata does not agree with album name");
    }
    if conflicts.contains(ConflictSet::ARTIST) {
        descs.push("metadata does not agree with artist name");
    }
    descs
}

/// Read the tags of every track that has not been read yet.
pub fn read_all_tags(library: &mut Library) {
    for index in library.track_indices() {
        if let Some(track) = library.track_mut(index) {
            metadata::read_tags(track);
        }
    }
}

/// Compare every track's names with its tags.
///
/// Reads any tags not read yet.
pub fn check_integrity(library: &mut Library) -> IssueReport {
    read_all_tags(library);
    let mut report = IssueReport::default();
    for t in library.tracks() {
        let descs = match (&t.track.tags, reconcile_ref(t)) {
            (TagState::Failed(_), _) => vec![UNRECOGNIZED_TAGS],
            (_, Ok(conflicts)) => conflict_descriptions(conflicts),
            (_, Err(e)) => {
                debug!(path = ?t.track.path, error = %e, "track skipped");
                continue;
            }
        };
        for desc in descs {
            report.add_track_issue(
                &t.artist.name,
                &t.album.name,
                t.track.parsed_number,
                &t.track.parsed_name,
                desc,
            );
        }
    }
    report
}

/// A track that needs repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflicted {
    pub index: TrackIndex,
    pub conflicts: ConflictSet,
}

/// Tracks with at least one conflict, ordered by artist name, album name and
/// track number.
///
/// Reads any tags not read yet.
pub fn conflicted_tracks(library: &mut Library) -> Vec<Conflicted> {
    read_all_tags(library);
    let mut found: Vec<Conflicted> = library
        .track_indices()
        .into_iter()
        .filter_map(|index| {
            let t = library.get(index)?;
            let conflicts = reconcile_ref(t).ok()?;
            (!conflicts.is_empty()).then_some(Conflicted { index, conflicts })
        })
        .collect();
    found.sort_by(|a, b| {
        let (Some(x), Some(y)) = (library.get(a.index), library.get(b.index)) else {
            return a.index.cmp(&b.index);
        };
        x.artist
            .name
            .cmp(&y.artist.name)
            .then_with(|| x.album.name.cmp(&y.album.name))
            .then_with(|| x.track.parsed_number.cmp(&y.track.parsed_number))
            .then_with(|| a.index.cmp(&b.index))
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_library, mock_tags, mock_track};

    #[test]
    fn test_consistent_track_has_no_conflicts() {
        let track = mock_track(1, "Song", Some(mock_tags("Album", "Artist", "Song", 1)));
        assert_eq!(reconcile("Artist", "Album", &track).unwrap(), ConflictSet::empty());
    }

    #[test]
    fn test_each_conflict_is_detected() {
        let track = mock_track(2, "Song", Some(mock_tags("foo", "Other", "Tune", 3)));
        let conflicts = reconcile("Artist", "bar", &track).unwrap();
        assert_eq!(conflicts, ConflictSet::all());
    }

    #[test]
    fn test_comparison_uses_canonical_names() {
        let track = mock_track(1, "Why_", Some(mock_tags("AC/DC Live", " Artist ", "Why?", 1)));
        let conflicts = reconcile("Artist", "AC_DC Live", &track).unwrap();
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let track = mock_track(1, "Song", Some(mock_tags("foo", "Artist", "Song", 1)));
        let first = reconcile("Artist", "bar", &track).unwrap();
        let second = reconcile("Artist", "bar", &track).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, ConflictSet::ALBUM);
    }

    #[test]
    fn test_unread_track_is_not_ready() {
        let track = mock_track(1, "Song", None);
        assert!(matches!(
            reconcile("Artist", "Album", &track),
            Err(Error::NotReady(_))
        ));
    }

    #[test]
    fn test_unrecognized_tags_have_no_conflicts() {
        let mut track = mock_track(1, "Song", None);
        track.tags = TagState::Failed("no ID3V2 tag found".into());
        assert!(reconcile("Artist", "Album", &track).unwrap().is_empty());
    }

    #[test]
    fn test_descriptions_follow_flag_order() {
        let descs = conflict_descriptions(ConflictSet::ARTIST | ConflictSet::NUMBERING);
        assert_eq!(
            descs,
            vec![
                "metadata does not agree with track number",
                "metadata does not agree with artist name",
            ]
        );
    }

    #[test]
    fn test_conflicted_tracks_sorted_by_number() {
        let mut library = mock_library(
            "Artist",
            "Album",
            vec![
                mock_track(3, "C", Some(mock_tags("x", "Artist", "C", 3))),
                mock_track(1, "A", Some(mock_tags("Album", "Artist", "A", 1))),
                mock_track(2, "B", Some(mock_tags("Album", "Artist", "B", 9))),
            ],
        );
        let found = conflicted_tracks(&mut library);
        let numbers: Vec<i32> = found
            .iter()
            .map(|c| library.get(c.index).unwrap().track.parsed_number)
            .collect();
        assert_eq!(numbers, vec![2, 3]);
        assert_eq!(found[0].conflicts, ConflictSet::NUMBERING);
        assert_eq!(found[1].conflicts, ConflictSet::ALBUM);
    }

    #[test]
    fn test_integrity_report_entries() {
        let mut library = mock_library(
            "Artist",
            "Album",
            vec![mock_track(1, "Song", Some(mock_tags("foo", "Artist", "Song", 1)))],
        );
        let mut failed = mock_track(2, "Other", None);
        failed.tags = TagState::Failed("bad".into());
        library.artists[0].albums[0].tracks.push(failed);

        let report = check_integrity(&mut library);
        let album = &report.artists["Artist"].albums["Album"];
        assert_eq!(
            album.tracks[&(1, "Song".to_string())],
            vec!["metadata does not agree with album name"]
        );
        assert_eq!(album.tracks[&(2, "Other".to_string())], vec![UNRECOGNIZED_TAGS]);
    }
}
