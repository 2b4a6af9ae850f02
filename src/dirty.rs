//! Persistent marker recording that track files have been edited.
//!
//! The marker is a file in the application data directory. Its presence means
//! at least one track was rewritten since the media database was last reset;
//! its content (the time it was first set) is informational only.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{Error, Result};

/// File name of the marker inside the application data directory.
pub const DIRTY_FILE_NAME: &str = "metadata.dirty";

/// Handle to the dirty marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyMarker {
    path: PathBuf,
}

impl DirtyMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when an edit has been recorded.
    pub fn is_dirty(&self) -> bool {
        self.path.exists()
    }

    /// Record that an edit happened; a no-op when already dirty.
    pub fn mark_dirty(&self) -> Result<()> {
        if self.is_dirty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, chrono::Utc::now().to_rfc3339())?;
        info!(path = ?self.path, "metadata marked dirty");
        Ok(())
    }

    /// Forget recorded edits.
    ///
    /// A missing marker is not an error. A marker that cannot be removed is
    /// logged and returned as an error for the caller to report.
    pub fn clear_dirty(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = ?self.path, "metadata marked clean");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!(path = ?self.path, error = %e, "failed to clear dirty marker");
                Err(Error::Io(e))
            }
        }
    }
}
