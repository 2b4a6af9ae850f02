//! Embedded tag reading and writing.
//!
//! Uses the `id3` crate for both tag formats:
//! - the leading ID3v2 tag carries the four reconciled facts (album, artist,
//!   title, track number) and is the only tag ever written
//! - the trailing 128-byte ID3v1 tag is read for diagnostics only ([`v1`])
//!
//! # Writes
//!
//! [`update_metadata`] changes only the frames whose values differ, keeps the
//! tag's version and every other frame, and never touches the audio payload.
//! The rewrite happens on a sibling temporary copy which is synced and renamed
//! over the original, so a track is either fully updated or unchanged.

mod frames;
mod properties;
pub mod v1;

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use id3::{Tag, TagLike, Version};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result, ResultExt};
use crate::model::{ConflictSet, TagData, TagState, Track};
use crate::naming;

pub use frames::{DETAIL_FRAMES, FrameListing, detail_frames, list_frames};
pub use properties::{AudioProperties, read_properties};

/// Frame carrying the album name.
pub const ALBUM_FRAME: &str = "TALB";
/// Frame carrying the primary performer.
pub const ARTIST_FRAME: &str = "TPE1";
/// Frame carrying the track title.
pub const TITLE_FRAME: &str = "TIT2";
/// Frame carrying the track number, `n` or `n/total`.
pub const TRACK_FRAME: &str = "TRCK";
/// Frame hashed into [`TagData::fingerprint`] (music CD identifier).
pub const FINGERPRINT_FRAME: &str = "MCDI";

/// Values a tag should carry after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    pub album: String,
    pub artist: String,
    pub title: String,
    pub track_number: i32,
}

/// Read text of a frame, with multi-value separators made printable.
pub(crate) fn text_frame(tag: &Tag, id: &str) -> Option<String> {
    tag.get(id)
        .and_then(|frame| frame.content().text())
        .map(|s| s.replace('\0', " / "))
}

/// Parse the number part of a `n` or `n/total` track frame.
fn parse_track_number(s: Option<&str>) -> i32 {
    s.and_then(|s| s.split('/').next())
        .and_then(|n| n.trim().parse::<i32>().ok())
        .unwrap_or(0)
}

/// Total part of a `n/total` track frame, if any.
fn track_total(s: Option<&str>) -> Option<&str> {
    s.and_then(|s| s.split_once('/'))
        .map(|(_, total)| total.trim())
        .filter(|total| !total.is_empty())
}

fn fingerprint(tag: &Tag) -> String {
    match tag.get(FINGERPRINT_FRAME) {
        Some(frame) => {
            let mut hasher = Sha256::new();
            hasher.update(format!("{:?}", frame.content()).as_bytes());
            format!("{:x}", hasher.finalize())
        }
        None => String::new(),
    }
}

/// Extract the reconciled facts from a parsed tag.
pub fn tag_data(tag: &Tag) -> TagData {
    TagData {
        album: tag.album().unwrap_or_default().to_string(),
        artist: tag.artist().unwrap_or_default().to_string(),
        title: tag.title().unwrap_or_default().to_string(),
        track_number: parse_track_number(text_frame(tag, TRACK_FRAME).as_deref()),
        fingerprint: fingerprint(tag),
    }
}

/// Parse the leading tag of the file at `path`.
pub fn read_tag(path: &Path) -> Result<Tag> {
    Tag::read_from_path(path).map_err(|e| match e.kind {
        id3::ErrorKind::NoTag => Error::tag_unreadable(path, "no ID3V2 tag found"),
        _ => Error::tag_unreadable(path, e.to_string()),
    })
}

/// Read the track's tags unless they were already read.
pub fn read_tags(track: &mut Track) {
    if track.tags == TagState::Unread {
        reread_tags(track);
    }
}

/// Read the track's tags, replacing any previous result.
pub fn reread_tags(track: &mut Track) {
    track.tags = match read_tag(&track.path) {
        Ok(tag) => TagState::Read(tag_data(&tag)),
        Err(e) => {
            warn!(path = ?track.path, error = %e, "tags were not recognized");
            TagState::Failed(e.to_string())
        }
    };
}

/// Fields of `tag` that disagree with `update`.
fn differences(tag: &Tag, update: &TagUpdate) -> ConflictSet {
    let current = tag_data(tag);
    let mut diff = ConflictSet::empty();
    if current.track_number != update.track_number {
        diff |= ConflictSet::NUMBERING;
    }
    if !naming::same_name(&current.title, &update.title) {
        diff |= ConflictSet::TITLE;
    }
    if !naming::same_name(&current.album, &update.album) {
        diff |= ConflictSet::ALBUM;
    }
    if !naming::same_name(&current.artist, &update.artist) {
        diff |= ConflictSet::ARTIST;
    }
    diff
}

fn apply(tag: &mut Tag, update: &TagUpdate, fields: ConflictSet) {
    if fields.contains(ConflictSet::NUMBERING) {
        let existing = text_frame(tag, TRACK_FRAME);
        let value = match track_total(existing.as_deref()) {
            Some(total) => format!("{}/{}", update.track_number, total),
            None => update.track_number.to_string(),
        };
        tag.set_text(TRACK_FRAME, value);
    }
    if fields.contains(ConflictSet::TITLE) {
        tag.set_text(TITLE_FRAME, update.title.clone());
    }
    if fields.contains(ConflictSet::ALBUM) {
        tag.set_text(ALBUM_FRAME, update.album.clone());
    }
    if fields.contains(ConflictSet::ARTIST) {
        tag.set_text(ARTIST_FRAME, update.artist.clone());
    }
}

/// Sibling path used while rewriting `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.mp3repair.tmp", name))
}

fn replace_via(path: &Path, temp: &Path, tag: &Tag, version: Version) -> Result<()> {
    fs::copy(path, temp).with_context(format!("copying {:?} for rewrite", path))?;
    tag.write_to_path(temp, version)
        .map_err(|e| Error::tag_unwritable(path, e.to_string()))?;
    File::open(temp)?.sync_all()?;
    fs::rename(temp, path).with_context(format!("replacing {:?}", path))?;
    Ok(())
}

/// Write `tag` into a copy of `path` and move the copy over the original.
fn write_atomically(path: &Path, tag: &Tag, version: Version) -> Result<()> {
    let temp = temp_path(path);
    let result = replace_via(path, &temp, tag, version);
    if result.is_err() && temp.exists() {
        if let Err(e) = fs::remove_file(&temp) {
            warn!(path = ?temp, error = %e, "failed to remove temporary file");
        }
    }
    result
}

/// Rewrite the track's leading tag so it carries `update`.
///
/// Only the differing frames are changed. On success the track's tag state
/// reflects the new file contents and the set of rewritten fields is
/// returned.
///
/// # Errors
///
/// - [`Error::TagUnreadable`] if the existing tag cannot be parsed
/// - [`Error::NoEditRequired`] if the tag already carries `update`
/// - [`Error::TagUnwritable`] or [`Error::Io`] if the rewrite fails
pub fn update_metadata(track: &mut Track, update: &TagUpdate) -> Result<ConflictSet> {
    let mut tag = read_tag(&track.path)?;
    let fields = differences(&tag, update);
    if fields.is_empty() {
        return Err(Error::NoEditRequired(track.path.clone()));
    }

    apply(&mut tag, update, fields);
    // id3 cannot emit v2.2 tags; those are upgraded to v2.3.
    let version = match tag.version() {
        Version::Id3v22 => Version::Id3v23,
        other => other,
    };
    write_atomically(&track.path, &tag, version)?;

    debug!(path = ?track.path, fields = ?fields, "tags updated");
    track.tags = TagState::Read(tag_data(&tag));
    Ok(fields)
}
