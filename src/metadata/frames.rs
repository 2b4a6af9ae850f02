//! Frame listings for the `list -details` and `list -diagnostic` output.

use id3::frame::Content;
use id3::{Tag, Version};

use super::text_frame;

/// Frames shown by the detailed listing, with their labels.
pub const DETAIL_FRAMES: [(&str, &str); 8] = [
    ("TCOM", "Composer"),
    ("TPE3", "Conductor"),
    ("TEXT", "Lyricist"),
    ("TPE2", "Orchestra/Band"),
    ("TIT3", "Subtitle"),
    ("TCON", "Genre"),
    ("TYER", "Year"),
    ("TKEY", "Key"),
];

/// Every frame of a tag, rendered for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameListing {
    pub version: String,
    pub frames: Vec<(String, String)>,
}

fn version_name(version: Version) -> &'static str {
    match version {
        Version::Id3v22 => "ID3V2.2",
        Version::Id3v23 => "ID3V2.3",
        Version::Id3v24 => "ID3V2.4",
        #[allow(unreachable_patterns)]
        _ => "ID3V2",
    }
}

fn render(content: &Content) -> String {
    match content {
        Content::Text(text) => text.replace('\0', " / "),
        Content::Link(url) => url.clone(),
        Content::ExtendedText(ext) => format!("{}: {}", ext.description, ext.value),
        Content::Comment(comment) => {
            format!("[{}] {}: {}", comment.lang, comment.description, comment.text)
        }
        Content::Picture(picture) => {
            format!("<{} picture, {} bytes>", picture.mime_type, picture.data.len())
        }
        Content::Unknown(unknown) => format!("<{} bytes>", unknown.data.len()),
        other => format!("{:?}", other),
    }
}

/// List every frame of `tag` in file order.
pub fn list_frames(tag: &Tag) -> FrameListing {
    FrameListing {
        version: version_name(tag.version()).to_string(),
        frames: tag
            .frames()
            .map(|frame| (frame.id().to_string(), render(frame.content())))
            .collect(),
    }
}

/// Labelled values of the [`DETAIL_FRAMES`] present in `tag`.
pub fn detail_frames(tag: &Tag) -> Vec<(&'static str, String)> {
    DETAIL_FRAMES
        .iter()
        .filter_map(|(id, label)| {
            let value = match *id {
                // v2.4 stores the year in the recording date frame
                "TYER" => text_frame(tag, "TYER").or_else(|| text_frame(tag, "TDRC")),
                _ => text_frame(tag, id),
            }?;
            let value = value.trim().to_string();
            (!value.is_empty()).then_some((*label, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3::TagLike;

    #[test]
    fn test_list_frames_renders_text() {
        let mut tag = Tag::new();
        tag.set_title("Song");
        tag.set_album("Album");
        let listing = list_frames(&tag);
        assert!(listing.frames.contains(&("TIT2".to_string(), "Song".to_string())));
        assert!(listing.frames.contains(&("TALB".to_string(), "Album".to_string())));
    }

    #[test]
    fn test_detail_frames_skips_missing() {
        let mut tag = Tag::new();
        tag.set_text("TCOM", "Bach");
        tag.set_text("TDRC", "1985");
        let details = detail_frames(&tag);
        assert_eq!(
            details,
            vec![("Composer", "Bach".to_string()), ("Year", "1985".to_string())]
        );
    }
}
