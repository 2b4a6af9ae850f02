//! Empty folder analysis, run against the unfiltered library.

use crate::model::Library;

use super::IssueReport;

pub const NO_ALBUMS: &str = "no albums found";
pub const NO_TRACKS: &str = "no tracks found";

/// Report artists without albums and albums without tracks.
pub fn check_empty(library: &Library) -> IssueReport {
    let mut report = IssueReport::default();
    for artist in &library.artists {
        if artist.albums.is_empty() {
            report.add_artist_issue(&artist.name, NO_ALBUMS);
            continue;
        }
        for album in &artist.albums {
            if album.tracks.is_empty() {
                report.add_album_issue(&artist.name, &album.name, NO_TRACKS);
            }
        }
    }
    report
}
