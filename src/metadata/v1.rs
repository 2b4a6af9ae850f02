//! Trailing ID3v1 tag (read only).
//!
//! The 128-byte trailer starts with `TAG` and holds fixed-width single-byte
//! fields. A file that is too short or lacks the signature simply has no tag.

use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};

/// Size of the trailer in bytes.
pub const TRAILER_LEN: u64 = 128;

/// Fields of an ID3v1 trailer, trimmed of padding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyTag {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub comment: String,
    pub track: Option<u8>,
    pub genre: String,
}

fn trimmed(s: &str) -> String {
    s.trim_end_matches(['\0', ' ']).to_string()
}

/// Read the trailing tag of `path`; `Ok(None)` when there is none.
pub fn read_legacy_tag(path: &Path) -> Result<Option<LegacyTag>> {
    let file = File::open(path)?;
    if file.metadata()?.len() < TRAILER_LEN {
        return Ok(None);
    }
    match id3::v1::Tag::read_from(file) {
        Ok(tag) => Ok(Some(LegacyTag {
            title: trimmed(&tag.title),
            artist: trimmed(&tag.artist),
            album: trimmed(&tag.album),
            year: trimmed(&tag.year),
            comment: trimmed(&tag.comment),
            track: tag.track,
            genre: tag
                .genre()
                .map(str::to_string)
                .unwrap_or_else(|| format!("genre {}", tag.genre_id)),
        })),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(None),
        Err(e) => Err(Error::tag_unreadable(path, e.to_string())),
    }
}
