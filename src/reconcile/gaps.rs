//! Track numbering gap analysis.

use std::collections::BTreeMap;

use crate::model::{Album, Library};

use super::IssueReport;

/// Numbering issues of one album, sorted.
///
/// With `D` distinct track numbers, every number in `1..=D` that no track
/// uses is missing; with `M` missing numbers the album's valid range is
/// `1..=D+M`. A track whose number is below 1 or beyond `D` is reported
/// against that range. Tracks sharing a number are reported pairwise.
pub fn album_gaps(album: &Album) -> Vec<String> {
    let mut by_number: BTreeMap<i32, Vec<&str>> = BTreeMap::new();
    for track in &album.tracks {
        by_number
            .entry(track.parsed_number)
            .or_default()
            .push(track.parsed_name.as_str());
    }

    let mut issues = Vec::new();
    for (number, names) in &by_number {
        for (i, first) in names.iter().enumerate() {
            for second in &names[i + 1..] {
                issues.push(format!("track {} used by {:?} and {:?}", number, first, second));
            }
        }
    }

    let distinct = by_number.len() as i32;
    let mut missing = 0;
    for k in 1..=distinct {
        if !by_number.contains_key(&k) {
            missing += 1;
            issues.push(format!("missing track {}", k));
        }
    }

    let valid = distinct + missing;
    for (number, names) in &by_number {
        if *number < 1 || *number > distinct {
            for name in names {
                issues.push(format!(
                    "track {} ({:?}) is not a valid track number; valid tracks are 1..{}",
                    number, name, valid
                ));
            }
        }
    }

    issues.sort();
    issues
}

/// Gap analysis over every album of `library`.
pub fn check_gaps(library: &Library) -> IssueReport {
    let mut report = IssueReport::default();
    for artist in &library.artists {
        for album in &artist.albums {
            for issue in album_gaps(album) {
                report.add_album_issue(&artist.name, &album.name, issue);
            }
        }
    }
    report
}
