//! Repair of conflicted tracks.
//!
//! A repair rewrites a track's tag so it agrees with the track's place in the
//! directory tree. Before any track is rewritten its original file is copied
//! to `<album>/pre-repair-backup/<number>.mp3`; an existing backup is never
//! overwritten, so repeated runs keep the very first original. Within one
//! run a backup slot belongs to a single track; a track whose number collides
//! with an earlier one is left untouched.
//!
//! # Phases
//!
//! 1. Create the backup directory of every affected album
//! 2. Copy every affected track into its album's backup directory
//! 3. Rewrite the tags of every backed-up track, marking the library dirty
//!    after each successful rewrite
//!
//! Failures are per album or per track: they are logged, recorded in the
//! [`RepairOutcome`] and do not stop the remaining work.

mod cleanup;

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::dirty::DirtyMarker;
use crate::error::{Error, Result};
use crate::metadata::{self, TagUpdate};
use crate::model::{ConflictSet, Library, TrackRef};
use crate::naming::canonicalize;
use crate::reconcile::Conflicted;

pub use cleanup::{CleanupEvent, remove_backups};

/// Describe the repairs a conflict set needs, e.g.
/// `need to repair track numbering; album name;`.
pub fn repair_description(conflicts: ConflictSet) -> String {
    let mut desc = String::from("need to repair");
    if conflicts.contains(ConflictSet::NUMBERING) {
        desc.push_str(" track numbering;");
    }
    if conflicts.contains(ConflictSet::TITLE) {
        desc.push_str(" track name;");
    }
    if conflicts.contains(ConflictSet::ALBUM) {
        desc.push_str(" album name;");
    }
    if conflicts.contains(ConflictSet::ARTIST) {
        desc.push_str(" artist name;");
    }
    desc
}

/// Dry-run report lines, grouped by artist and album.
///
/// `conflicted` must already be sorted (see
/// [`conflicted_tracks`](crate::reconcile::conflicted_tracks)).
pub fn plan_lines(library: &Library, conflicted: &[Conflicted]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_artist: Option<usize> = None;
    let mut current_album: Option<(usize, usize)> = None;
    for c in conflicted {
        let Some(t) = library.get(c.index) else {
            continue;
        };
        if current_artist != Some(c.index.artist) {
            current_artist = Some(c.index.artist);
            current_album = None;
            lines.push(format!("{:?}", t.artist.name));
        }
        if current_album != Some((c.index.artist, c.index.album)) {
            current_album = Some((c.index.artist, c.index.album));
            lines.push(format!("  {:?}", t.album.name));
        }
        lines.push(format!(
            "    {} {:?} {}",
            t.track.parsed_number,
            t.track.parsed_name,
            repair_description(c.conflicts)
        ));
    }
    lines
}

/// Values a repaired track's tag should carry.
pub fn desired_tags(t: TrackRef<'_>) -> TagUpdate {
    TagUpdate {
        album: canonicalize(&t.album.name),
        artist: canonicalize(&t.artist.name),
        title: canonicalize(&t.track.parsed_name),
        track_number: t.track.parsed_number,
    }
}

/// Backup file of a track with number `number` in `backup_dir`.
pub fn backup_path(backup_dir: &Path, number: i32) -> PathBuf {
    backup_dir.join(format!("{}.mp3", number))
}

/// Make sure `dir` exists as a directory.
fn ensure_backup_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if dir.is_dir() {
                Ok(())
            } else {
                Err(Error::filesystem(
                    dir,
                    std::io::Error::new(ErrorKind::AlreadyExists, "exists and is not a directory"),
                ))
            }
        }
        Err(e) => Err(Error::filesystem(dir, e)),
    }
}

/// What happened to one track during a repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairEvent {
    /// The album's backup directory could not be created
    BackupDirFailed { dir: PathBuf, message: String },
    /// The original was copied to its backup
    BackedUp { track: PathBuf, backup: PathBuf },
    /// The original could not be copied; the track was left alone
    BackupFailed { track: PathBuf, message: String },
    /// The tag was rewritten
    Repaired { track: PathBuf },
    /// The tag already matched; nothing was written
    Unchanged { track: PathBuf },
    /// The tag could not be rewritten
    RepairFailed { track: PathBuf, message: String },
}

/// Result of [`apply_repairs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    pub events: Vec<RepairEvent>,
}

impl RepairOutcome {
    pub fn repaired(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RepairEvent::Repaired { .. }))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    RepairEvent::BackupDirFailed { .. }
                        | RepairEvent::BackupFailed { .. }
                        | RepairEvent::RepairFailed { .. }
                )
            })
            .count()
    }
}

/// Back up and rewrite every conflicted track.
pub fn apply_repairs(
    library: &mut Library,
    conflicted: &[Conflicted],
    marker: &DirtyMarker,
) -> RepairOutcome {
    let mut outcome = RepairOutcome::default();

    // Phase 1: backup directories
    let mut usable_albums: HashSet<(usize, usize)> = HashSet::new();
    let mut failed_albums: HashSet<(usize, usize)> = HashSet::new();
    for c in conflicted {
        let key = (c.index.artist, c.index.album);
        if usable_albums.contains(&key) || failed_albums.contains(&key) {
            continue;
        }
        let Some(t) = library.get(c.index) else {
            continue;
        };
        let dir = t.album.backup_dir();
        match ensure_backup_dir(&dir) {
            Ok(()) => {
                usable_albums.insert(key);
            }
            Err(e) => {
                error!(dir = ?dir, error = %e, "cannot create backup directory");
                outcome.events.push(RepairEvent::BackupDirFailed {
                    dir,
                    message: e.to_string(),
                });
                failed_albums.insert(key);
            }
        }
    }

    // Phase 2: backups. A backup slot belongs to the first track that
    // claims it; another track with the same number is not rewritten.
    let mut backed_up = Vec::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    for c in conflicted {
        if !usable_albums.contains(&(c.index.artist, c.index.album)) {
            continue;
        }
        let Some(t) = library.get(c.index) else {
            continue;
        };
        let backup = backup_path(&t.album.backup_dir(), t.track.parsed_number);
        if !claimed.insert(backup.clone()) {
            error!(track = ?t.track.path, backup = ?backup, "backup slot already used");
            outcome.events.push(RepairEvent::BackupFailed {
                track: t.track.path.clone(),
                message: format!(
                    "backup slot {:?} already used by another track",
                    backup
                ),
            });
            continue;
        }
        if backup.exists() {
            debug!(backup = ?backup, "backup already present");
            backed_up.push(*c);
            continue;
        }
        match fs::copy(&t.track.path, &backup) {
            Ok(_) => {
                outcome.events.push(RepairEvent::BackedUp {
                    track: t.track.path.clone(),
                    backup,
                });
                backed_up.push(*c);
            }
            Err(e) => {
                error!(track = ?t.track.path, error = %e, "cannot back up track");
                outcome.events.push(RepairEvent::BackupFailed {
                    track: t.track.path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    // Phase 3: tag rewrites
    for c in backed_up {
        let Some(t) = library.get(c.index) else {
            continue;
        };
        let update = desired_tags(t);
        let Some(track) = library.track_mut(c.index) else {
            continue;
        };
        let path = track.path.clone();
        match metadata::update_metadata(track, &update) {
            Ok(fields) => {
                debug!(track = ?path, fields = ?fields, "track repaired");
                if let Err(e) = marker.mark_dirty() {
                    error!(error = %e, "cannot mark metadata dirty");
                }
                outcome.events.push(RepairEvent::Repaired { track: path });
            }
            Err(Error::NoEditRequired(_)) => {
                warn!(track = ?path, "no edit required");
                outcome.events.push(RepairEvent::Unchanged { track: path });
            }
            Err(e) => {
                error!(track = ?path, error = %e, "cannot repair track");
                outcome.events.push(RepairEvent::RepairFailed {
                    track: path,
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}
