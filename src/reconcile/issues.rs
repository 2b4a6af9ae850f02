//! Per-artist/album/track issue trees produced by the library checks.
//!
//! Every analysis produces its own [`IssueReport`]; the check command
//! [`merge`](IssueReport::merge)s them into one tree. Nodes are keyed by name
//! (tracks by number, then name) and kept in `BTreeMap`s, so iteration order
//! is already the report order. Issue lists are kept sorted.

use std::collections::BTreeMap;

/// Issues attached to one track.
pub type TrackKey = (i32, String);

/// Issues of one album and of its tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumIssues {
    pub issues: Vec<String>,
    pub tracks: BTreeMap<TrackKey, Vec<String>>,
}

/// Issues of one artist and of its albums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistIssues {
    pub issues: Vec<String>,
    pub albums: BTreeMap<String, AlbumIssues>,
}

/// A sorted tree of issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueReport {
    pub artists: BTreeMap<String, ArtistIssues>,
}

fn insert_sorted(list: &mut Vec<String>, issue: String) {
    let at = list.partition_point(|existing| existing <= &issue);
    list.insert(at, issue);
}

fn extend_sorted(list: &mut Vec<String>, issues: Vec<String>) {
    list.extend(issues);
    list.sort();
}

impl IssueReport {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    fn artist(&mut self, artist: &str) -> &mut ArtistIssues {
        self.artists.entry(artist.to_string()).or_default()
    }

    fn album(&mut self, artist: &str, album: &str) -> &mut AlbumIssues {
        self.artist(artist)
            .albums
            .entry(album.to_string())
            .or_default()
    }

    pub fn add_artist_issue(&mut self, artist: &str, issue: impl Into<String>) {
        insert_sorted(&mut self.artist(artist).issues, issue.into());
    }

    pub fn add_album_issue(&mut self, artist: &str, album: &str, issue: impl Into<String>) {
        insert_sorted(&mut self.album(artist, album).issues, issue.into());
    }

    pub fn add_track_issue(
        &mut self,
        artist: &str,
        album: &str,
        number: i32,
        track: &str,
        issue: impl Into<String>,
    ) {
        let issues = self
            .album(artist, album)
            .tracks
            .entry((number, track.to_string()))
            .or_default();
        insert_sorted(issues, issue.into());
    }

    /// Union two reports, concatenating issue lists of matching nodes.
    ///
    /// The result does not depend on argument order.
    pub fn merge(mut self, other: IssueReport) -> IssueReport {
        for (artist_name, artist) in other.artists {
            let target = self.artist(&artist_name);
            extend_sorted(&mut target.issues, artist.issues);
            for (album_name, album) in artist.albums {
                let target_album = target.albums.entry(album_name).or_default();
                extend_sorted(&mut target_album.issues, album.issues);
                for (key, issues) in album.tracks {
                    extend_sorted(target_album.tracks.entry(key).or_default(), issues);
                }
            }
        }
        self
    }

    /// Render as indented console lines.
    ///
    /// ```text
    /// "Artist"
    ///   * artist issue
    ///   "Album"
    ///     * album issue
    ///     3 "Track"
    ///       * track issue
    /// ```
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (artist_name, artist) in &self.artists {
            lines.push(format!("{:?}", artist_name));
            lines.extend(artist.issues.iter().map(|i| format!("  * {}", i)));
            for (album_name, album) in &artist.albums {
                lines.push(format!("  {:?}", album_name));
                lines.extend(album.issues.iter().map(|i| format!("    * {}", i)));
                for ((number, name), issues) in &album.tracks {
                    lines.push(format!("    {} {:?}", number, name));
                    lines.extend(issues.iter().map(|i| format!("      * {}", i)));
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn report(entries: &[(&str, &str, i32, &str)]) -> IssueReport {
        let mut r = IssueReport::default();
        for (artist, album, number, issue) in entries {
            match (album.is_empty(), *number) {
                (true, _) => r.add_artist_issue(artist, *issue),
                (false, 0) => r.add_album_issue(artist, album, *issue),
                (false, n) => r.add_track_issue(artist, album, n, "t", *issue),
            }
        }
        r
    }

    #[test]
    fn test_lines_layout() {
        let mut r = IssueReport::default();
        r.add_album_issue("A", "B", "no tracks found");
        r.add_track_issue("A", "C", 2, "Song", "metadata does not agree with album name");
        r.add_artist_issue("A", "no albums found");

        assert_eq!(
            r.lines(),
            vec![
                "\"A\"",
                "  * no albums found",
                "  \"B\"",
                "    * no tracks found",
                "  \"C\"",
                "    2 \"Song\"",
                "      * metadata does not agree with album name",
            ]
        );
    }

    #[test]
    fn test_tracks_sort_by_number() {
        let mut r = IssueReport::default();
        r.add_track_issue("A", "B", 10, "Ten", "x");
        r.add_track_issue("A", "B", 2, "Two", "x");
        let keys: Vec<i32> = r.artists["A"].albums["B"].tracks.keys().map(|k| k.0).collect();
        assert_eq!(keys, vec![2, 10]);
    }

    #[test]
    fn test_merge_concatenates_and_sorts() {
        let a = report(&[("X", "Y", 0, "zeta"), ("X", "", 0, "artist")]);
        let b = report(&[("X", "Y", 0, "alpha"), ("W", "V", 1, "track")]);
        let merged = a.merge(b);
        assert_eq!(merged.artists["X"].albums["Y"].issues, vec!["alpha", "zeta"]);
        assert_eq!(merged.artists.keys().collect::<Vec<_>>(), vec!["W", "X"]);
    }

    fn arb_report() -> impl Strategy<Value = IssueReport> {
        prop::collection::vec(
            ("[AB]", "[ab]?", 0i32..3, "[a-c]{1,2}"),
            0..8,
        )
        .prop_map(|entries| {
            let refs: Vec<(&str, &str, i32, &str)> = entries
                .iter()
                .map(|(a, b, n, i)| (a.as_str(), b.as_str(), *n, i.as_str()))
                .collect();
            report(&refs)
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_commutative(a in arb_report(), b in arb_report()) {
            prop_assert_eq!(a.clone().merge(b.clone()), b.merge(a));
        }

        #[test]
        fn prop_merge_is_associative(a in arb_report(), b in arb_report(), c in arb_report()) {
            let left = a.clone().merge(b.clone()).merge(c.clone());
            let right = a.merge(b.merge(c));
            prop_assert_eq!(left, right);
        }
    }
}
