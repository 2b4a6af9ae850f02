//! Library listing command.

use std::path::Path;

use crate::config::ListDefaults;
use crate::error::Error;
use crate::metadata::{self, detail_frames, list_frames, read_properties, v1};
use crate::model::{Album, Artist, Library, Track, TrackRef};

use super::{Context, LibraryArgs, LibrarySettings, ListArgs, warn_user};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sort {
    Numeric,
    Alpha,
}

#[derive(Debug, Clone, Copy)]
struct ListSettings {
    artists: bool,
    albums: bool,
    tracks: bool,
    annotate: bool,
    details: bool,
    diagnostic: bool,
    sort: Sort,
}

fn resolve(ctx: &Context<'_>, args: &ListArgs) -> anyhow::Result<ListSettings> {
    let d = ListDefaults::load(ctx.config)?;
    let mut settings = ListSettings {
        artists: args.include_artists.unwrap_or(d.include_artists),
        albums: args.include_albums.unwrap_or(d.include_albums),
        tracks: args.include_tracks.unwrap_or(d.include_tracks),
        annotate: args.annotate.unwrap_or(d.annotate),
        details: args.details.unwrap_or(d.details),
        diagnostic: args.diagnostic.unwrap_or(d.diagnostic),
        sort: Sort::Numeric,
    };
    let sort = args.sort.clone().unwrap_or(d.sort);
    settings.sort = match sort.as_str() {
        "numeric" => Sort::Numeric,
        "alpha" => Sort::Alpha,
        _ => return Err(Error::user_input("sort", sort, "must be 'numeric' or 'alpha'").into()),
    };

    if !settings.artists && !settings.albums && !settings.tracks {
        return Err(Error::NoWork(
            "no listing will be output: -includeArtists, -includeAlbums and -includeTracks are all false"
                .into(),
        )
        .into());
    }
    if settings.sort == Sort::Numeric && !settings.albums {
        warn_user(
            ctx,
            "numeric track sorting requires -includeAlbums=true; tracks will be sorted alphabetically",
        );
        settings.sort = Sort::Alpha;
    }
    if !settings.tracks && (settings.details || settings.diagnostic) {
        warn_user(
            ctx,
            "-details and -diagnostic are ignored without -includeTracks=true",
        );
        settings.details = false;
        settings.diagnostic = false;
    }
    Ok(settings)
}

/// List artists, albums and tracks
pub fn cmd_list(ctx: &Context<'_>, library: &LibraryArgs, args: &ListArgs) -> anyhow::Result<()> {
    let settings = resolve(ctx, args)?;
    let library = LibrarySettings::resolve(library, ctx.config)?.load()?;
    for line in listing(&library, &settings) {
        ctx.console.out(&line);
    }
    Ok(())
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn listing(library: &Library, s: &ListSettings) -> Vec<String> {
    let mut lines = Vec::new();
    if s.artists {
        let mut artists: Vec<&Artist> = library.artists.iter().collect();
        artists.sort_by(|a, b| a.name.cmp(&b.name));
        for artist in artists {
            lines.push(format!("Artist: {}", artist.name));
            if s.albums {
                list_albums(&mut lines, artist.albums.iter().map(|b| (artist, b)).collect(), s, 1);
            } else if s.tracks {
                let tracks = artist
                    .albums
                    .iter()
                    .flat_map(|album| {
                        album.tracks.iter().map(move |track| TrackRef {
                            artist,
                            album,
                            track,
                        })
                    })
                    .collect();
                list_tracks(&mut lines, tracks, s, 1);
            }
        }
    } else if s.albums {
        let albums = library
            .artists
            .iter()
            .flat_map(|artist| artist.albums.iter().map(move |album| (artist, album)))
            .collect();
        list_albums(&mut lines, albums, s, 0);
    } else {
        list_tracks(&mut lines, library.tracks().collect(), s, 0);
    }
    lines
}

fn list_albums(
    lines: &mut Vec<String>,
    mut albums: Vec<(&Artist, &Album)>,
    s: &ListSettings,
    depth: usize,
) {
    albums.sort_by(|(a1, b1), (a2, b2)| b1.name.cmp(&b2.name).then_with(|| a1.name.cmp(&a2.name)));
    for (artist, album) in albums {
        let name = if s.annotate && !s.artists {
            format!("{:?} by {:?}", album.name, artist.name)
        } else {
            album.name.clone()
        };
        lines.push(format!("{}Album: {}", indent(depth), name));
        if s.tracks {
            let tracks = album
                .tracks
                .iter()
                .map(|track| TrackRef {
                    artist,
                    album,
                    track,
                })
                .collect();
            list_tracks(lines, tracks, s, depth + 1);
        }
    }
}

fn list_tracks(lines: &mut Vec<String>, mut tracks: Vec<TrackRef<'_>>, s: &ListSettings, depth: usize) {
    if !s.tracks {
        return;
    }
    match s.sort {
        Sort::Numeric => tracks.sort_by(|x, y| {
            x.track
                .parsed_number
                .cmp(&y.track.parsed_number)
                .then_with(|| x.track.parsed_name.cmp(&y.track.parsed_name))
        }),
        Sort::Alpha => tracks.sort_by(|x, y| {
            x.track
                .parsed_name
                .cmp(&y.track.parsed_name)
                .then_with(|| x.album.name.cmp(&y.album.name))
                .then_with(|| x.artist.name.cmp(&y.artist.name))
        }),
    }
    for t in tracks {
        lines.push(format!("{}{}", indent(depth), track_label(t, s)));
        for extra in track_extras(t.track, s) {
            lines.push(format!("{}{}", indent(depth + 1), extra));
        }
    }
}

fn track_label(t: TrackRef<'_>, s: &ListSettings) -> String {
    let name = if s.annotate && !s.albums {
        format!(
            "{:?} on {:?} by {:?}",
            t.track.parsed_name, t.album.name, t.artist.name
        )
    } else {
        t.track.parsed_name.clone()
    };
    match s.sort {
        Sort::Numeric => format!("{}. {}", t.track.parsed_number, name),
        Sort::Alpha => name,
    }
}

fn track_extras(track: &Track, s: &ListSettings) -> Vec<String> {
    let mut out = Vec::new();
    if s.details {
        details(&track.path, &mut out);
    }
    if s.diagnostic {
        diagnostic(&track.path, &mut out);
    }
    out
}

fn details(path: &Path, out: &mut Vec<String>) {
    match metadata::read_tag(path) {
        Ok(tag) => {
            for (label, value) in detail_frames(&tag) {
                out.push(format!("{} = {}", label, value));
            }
        }
        Err(e) => out.push(format!("details unavailable: {}", e)),
    }
    match read_properties(path) {
        Ok(props) => out.push(format!("Properties = {}", props.summary())),
        Err(e) => tracing::debug!(path = ?path, error = %e, "no audio properties"),
    }
}

fn diagnostic(path: &Path, out: &mut Vec<String>) {
    match metadata::read_tag(path) {
        Ok(tag) => {
            let listing = list_frames(&tag);
            out.push(format!("ID3V2 Version: {}", listing.version));
            for (id, value) in listing.frames {
                out.push(format!("{} = {}", id, value));
            }
        }
        Err(e) => out.push(format!("ID3V2 tag error: {}", e)),
    }
    match v1::read_legacy_tag(path) {
        Ok(Some(legacy)) => {
            out.push(format!("ID3V1 Title = {}", legacy.title));
            out.push(format!("ID3V1 Artist = {}", legacy.artist));
            out.push(format!("ID3V1 Album = {}", legacy.album));
            out.push(format!("ID3V1 Year = {}", legacy.year));
            out.push(format!("ID3V1 Comment = {}", legacy.comment));
            if let Some(track) = legacy.track {
                out.push(format!("ID3V1 Track = {}", track));
            }
            out.push(format!("ID3V1 Genre = {}", legacy.genre));
        }
        Ok(None) => out.push("ID3V1 tag not present".to_string()),
        Err(e) => out.push(format!("ID3V1 tag error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::Harness;
    use crate::test_utils::{consistent_track, track_file};

    fn library(h: &Harness) {
        consistent_track(&h.music(), "Kinks", "Arthur", 2, "Yes Sir, No Sir");
        consistent_track(&h.music(), "Kinks", "Arthur", 1, "Victoria");
        consistent_track(&h.music(), "Beatles", "Help", 1, "Help");
    }

    #[test]
    fn test_default_lists_artists_and_albums() {
        let h = Harness::new();
        library(&h);
        cmd_list(&h.ctx(), &h.library_args(), &ListArgs::default()).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec!["Artist: Beatles", "  Album: Help", "Artist: Kinks", "  Album: Arthur"]
        );
    }

    #[test]
    fn test_tracks_sorted_numerically() {
        let h = Harness::new();
        library(&h);
        let mut lib = h.library_args();
        lib.artist_filter = Some("Kinks".into());
        let args = ListArgs {
            include_tracks: Some(true),
            ..ListArgs::default()
        };
        cmd_list(&h.ctx(), &lib, &args).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec![
                "Artist: Kinks",
                "  Album: Arthur",
                "    1. Victoria",
                "    2. Yes Sir, No Sir",
            ]
        );
    }

    #[test]
    fn test_annotated_tracks_only() {
        let h = Harness::new();
        library(&h);
        let args = ListArgs {
            include_artists: Some(false),
            include_albums: Some(false),
            include_tracks: Some(true),
            annotate: Some(true),
            sort: Some("alpha".into()),
            ..ListArgs::default()
        };
        cmd_list(&h.ctx(), &h.library_args(), &args).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec![
                "\"Help\" on \"Help\" by \"Beatles\"",
                "\"Victoria\" on \"Arthur\" by \"Kinks\"",
                "\"Yes Sir, No Sir\" on \"Arthur\" by \"Kinks\"",
            ]
        );
        assert!(h.console.err_lines().is_empty());
    }

    #[test]
    fn test_annotated_albums_without_artists() {
        let h = Harness::new();
        library(&h);
        let args = ListArgs {
            include_artists: Some(false),
            annotate: Some(true),
            ..ListArgs::default()
        };
        cmd_list(&h.ctx(), &h.library_args(), &args).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec!["Album: \"Arthur\" by \"Kinks\"", "Album: \"Help\" by \"Beatles\""]
        );
    }

    #[test]
    fn test_numeric_sort_without_albums_falls_back() {
        let h = Harness::new();
        library(&h);
        let args = ListArgs {
            include_albums: Some(false),
            include_tracks: Some(true),
            ..ListArgs::default()
        };
        cmd_list(&h.ctx(), &h.library_args(), &args).unwrap();
        assert_eq!(h.console.err_lines().len(), 1);
        assert!(h.console.err_lines()[0].contains("alphabetically"));
        assert_eq!(
            h.console.out_lines(),
            vec![
                "Artist: Beatles",
                "  Help",
                "Artist: Kinks",
                "  Victoria",
                "  Yes Sir, No Sir",
            ]
        );
    }

    #[test]
    fn test_nothing_included_is_no_work() {
        let h = Harness::new();
        library(&h);
        let args = ListArgs {
            include_artists: Some(false),
            include_albums: Some(false),
            include_tracks: Some(false),
            ..ListArgs::default()
        };
        let err = cmd_list(&h.ctx(), &h.library_args(), &args).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoWork(_))));
        assert!(h.console.out_lines().is_empty());
    }

    #[test]
    fn test_bad_sort_is_rejected() {
        let h = Harness::new();
        library(&h);
        let args = ListArgs {
            sort: Some("random".into()),
            ..ListArgs::default()
        };
        let err = cmd_list(&h.ctx(), &h.library_args(), &args).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::UserInput { .. })));
    }

    #[test]
    fn test_details_ignored_without_tracks() {
        let h = Harness::new();
        library(&h);
        let args = ListArgs {
            details: Some(true),
            ..ListArgs::default()
        };
        cmd_list(&h.ctx(), &h.library_args(), &args).unwrap();
        assert_eq!(h.console.err_lines().len(), 1);
        assert_eq!(h.console.out_lines().len(), 4);
    }

    #[test]
    fn test_diagnostic_lists_frames() {
        let h = Harness::new();
        track_file(&h.music(), "Artist", "bar", "01 trackname.mp3")
            .tags("foo", "Artist", "trackname", "1")
            .create();
        let args = ListArgs {
            include_tracks: Some(true),
            diagnostic: Some(true),
            ..ListArgs::default()
        };
        cmd_list(&h.ctx(), &h.library_args(), &args).unwrap();
        let out = h.console.out_lines();
        assert!(out.contains(&"      ID3V2 Version: ID3V2.4".to_string()));
        assert!(out.contains(&"      TALB = foo".to_string()));
        assert!(out.contains(&"      ID3V1 tag not present".to_string()));
    }

    #[test]
    fn test_config_defaults_apply() {
        let h = Harness::new().with_config("list:\n  includeTracks: true\n  sort: alpha\n");
        consistent_track(&h.music(), "Kinks", "Arthur", 2, "B");
        consistent_track(&h.music(), "Kinks", "Arthur", 1, "A");
        cmd_list(&h.ctx(), &h.library_args(), &ListArgs::default()).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec!["Artist: Kinks", "  Album: Arthur", "    A", "    B"]
        );
    }

    #[test]
    fn test_empty_library_reports_no_music() {
        let h = Harness::new();
        let err = cmd_list(&h.ctx(), &h.library_args(), &ListArgs::default()).unwrap_err();
        assert_eq!(err.to_string(), crate::cli::commands::NO_MUSIC_FOUND);
    }
}
