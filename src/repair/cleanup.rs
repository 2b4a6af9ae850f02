//! Removal of backup directories once repairs have been accepted.

use std::fs;

use tracing::{error, info};

use crate::model::Library;

/// Outcome of removing one album's backup directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupEvent {
    Deleted { artist: String, album: String },
    Failed { artist: String, album: String, message: String },
}

/// Delete the backup directory of every album in `library` that has one.
///
/// Returns one event per backup directory found; an empty result means
/// there was nothing to delete.
pub fn remove_backups(library: &Library) -> Vec<CleanupEvent> {
    let mut events = Vec::new();
    for artist in &library.artists {
        for album in &artist.albums {
            let dir = album.backup_dir();
            if !dir.is_dir() {
                continue;
            }
            match fs::remove_dir_all(&dir) {
                Ok(()) => {
                    info!(dir = ?dir, "backup directory deleted");
                    events.push(CleanupEvent::Deleted {
                        artist: artist.name.clone(),
                        album: album.name.clone(),
                    });
                }
                Err(e) => {
                    error!(dir = ?dir, error = %e, "cannot delete backup directory");
                    events.push(CleanupEvent::Failed {
                        artist: artist.name.clone(),
                        album: album.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
    events
}
