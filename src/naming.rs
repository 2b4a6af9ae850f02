//! Track file name parsing and name canonicalization.
//!
//! Track files are expected to look like `NN name.ext`: leading ASCII digits,
//! a separator run (whitespace, `-`, `.` or `_`), then the track name.
//! Names taken from the filesystem and names taken from tags are compared only
//! after [`canonicalize`], which folds whitespace and maps characters that
//! cannot appear in file names onto the substitute used on disk.

use std::path::Path;

/// Characters that cannot appear in a file name, all stored on disk as `_`.
const ILLEGAL_CHARACTERS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Substitute written to disk in place of an illegal character.
const SUBSTITUTE: char = '_';

/// Result of parsing a track file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Leading track number, 0 when the name carries none
    pub number: i32,
    /// Track name with number, separator and extension removed
    pub name: String,
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '.' | '_')
}

/// Strip `extension` (case-insensitive) from `file_name`, falling back to the
/// path's own extension.
fn strip_extension<'a>(file_name: &'a str, extension: &str) -> &'a str {
    if !extension.is_empty()
        && file_name.len() >= extension.len()
        && file_name.is_char_boundary(file_name.len() - extension.len())
    {
        let (stem, ext) = file_name.split_at(file_name.len() - extension.len());
        if ext.eq_ignore_ascii_case(extension) {
            return stem;
        }
    }
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Parse a track's base file name into its number and name.
///
/// ```ignore
/// let parsed = parse_track_name("03 - Blue Moon.mp3", ".mp3");
/// assert_eq!(parsed.number, 3);
/// assert_eq!(parsed.name, "Blue Moon");
/// ```
pub fn parse_track_name(file_name: &str, extension: &str) -> ParsedName {
    let stem = strip_extension(file_name, extension);
    let digits_end = stem
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(stem.len());

    let unnumbered = || ParsedName {
        number: 0,
        name: stem.trim_start_matches(is_separator).to_string(),
    };

    if digits_end == 0 || digits_end == stem.len() {
        return unnumbered();
    }
    let rest = &stem[digits_end..];
    if !rest.starts_with(is_separator) {
        return unnumbered();
    }
    let Ok(number) = stem[..digits_end].parse::<i32>() else {
        return unnumbered();
    };
    ParsedName {
        number,
        name: rest.trim_start_matches(is_separator).to_string(),
    }
}

/// Compose the file name stem a track with `number` and `name` would carry.
pub fn compose_track_name(number: i32, name: &str) -> String {
    format!("{:02} {}", number, name)
}

/// Normalize a name so filesystem and tag strings can be compared.
///
/// Applies, in order: illegal-character substitution, whitespace folding,
/// and removal of trailing dots (which file systems drop silently).
pub fn canonicalize(s: &str) -> String {
    let substituted: String = s
        .chars()
        .map(|c| {
            if ILLEGAL_CHARACTERS.contains(&c) {
                SUBSTITUTE
            } else {
                c
            }
        })
        .collect();
    let folded = substituted.split_whitespace().collect::<Vec<_>>().join(" ");
    folded
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// True when two names are equal after canonicalization.
pub fn same_name(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}
