//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `list`: Library listing
//! - `check`: Empty folder, numbering gap and tag integrity analyses
//! - `repair`: Tag repair with backups, and `postRepair` backup cleanup
//! - `reset_database`: Media database reset
//! - `export`: Configuration export
//! - `about`: Version and build information
//!
//! Every flag is optional on the command line; an absent flag falls back to
//! the configuration file and then to the built-in default.

mod about;
mod check;
mod export;
mod list;
mod repair;
mod reset_database;

use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use regex::Regex;

use crate::config::{AppPaths, CommonDefaults, Configuration};
use crate::error::Error;
use crate::model::Library;
use crate::scanner::{self, Filters, ScanOptions};
use crate::service::ServiceManager;

use super::console::Console;

pub use about::cmd_about;
pub use check::cmd_check;
pub use export::cmd_export;
pub use list::cmd_list;
pub use repair::{cmd_post_repair, cmd_repair};
pub use reset_database::cmd_reset_database;

/// Printed when a library load finds nothing to work on.
pub const NO_MUSIC_FOUND: &str = "No music files could be found using the specified parameters.";

/// Repairs the tags of an MP3 library to match its directory layout
#[derive(Parser, Debug)]
#[command(name = "mp3repair", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub library: LibraryArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags selecting the part of the library to work on
#[derive(Args, Debug, Clone, Default)]
pub struct LibraryArgs {
    /// Top directory of the music library
    #[arg(long = "topDir", global = true, value_name = "DIR")]
    pub top_dir: Option<String>,
    /// Extension of track files
    #[arg(long = "ext", global = true, value_name = ".EXT")]
    pub ext: Option<String>,
    /// Regular expression selecting artists
    #[arg(long = "artistFilter", global = true, value_name = "REGEX")]
    pub artist_filter: Option<String>,
    /// Regular expression selecting albums
    #[arg(long = "albumFilter", global = true, value_name = "REGEX")]
    pub album_filter: Option<String>,
}

/// Flags of the `list` command
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// List artists
    #[arg(
        long = "includeArtists",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub include_artists: Option<bool>,
    /// List albums
    #[arg(
        long = "includeAlbums",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub include_albums: Option<bool>,
    /// List tracks
    #[arg(
        long = "includeTracks",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub include_tracks: Option<bool>,
    /// Qualify albums and tracks with their owners when those are not listed
    #[arg(
        long = "annotate",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub annotate: Option<bool>,
    /// Show tag details of each track
    #[arg(
        long = "details",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub details: Option<bool>,
    /// Show every tag frame of each track
    #[arg(
        long = "diagnostic",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub diagnostic: Option<bool>,
    /// Track order: numeric or alpha
    #[arg(long = "sort", value_name = "ORDER")]
    pub sort: Option<String>,
}

/// Flags of the `check` command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Report artists without albums and albums without tracks
    #[arg(
        long = "empty",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub empty: Option<bool>,
    /// Report missing, duplicated and out-of-range track numbers
    #[arg(
        long = "gaps",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub gaps: Option<bool>,
    /// Report tracks whose tags disagree with their names
    #[arg(
        long = "integrity",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub integrity: Option<bool>,
}

/// Flags of the `repair` command
#[derive(Args, Debug, Clone, Default)]
pub struct RepairArgs {
    /// Report what would be repaired without changing anything
    #[arg(
        long = "dryRun",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: Option<bool>,
}

/// Flags of the `resetDatabase` command
#[derive(Args, Debug, Clone, Default)]
pub struct ResetDatabaseArgs {
    /// Name of the media indexing service
    #[arg(long = "service", value_name = "NAME")]
    pub service: Option<String>,
    /// Seconds to wait for the service to stop
    #[arg(long = "timeout", value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..=60))]
    pub timeout: Option<u64>,
    /// Directory holding the media database files
    #[arg(long = "metadata", value_name = "DIR")]
    pub metadata: Option<String>,
    /// Extension of the media database files
    #[arg(long = "extension", value_name = ".EXT")]
    pub extension: Option<String>,
    /// Reset even if no track has been edited
    #[arg(
        long = "force",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub force: Option<bool>,
}

/// Flags of the `export` command
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Write the current defaults to the configuration file
    #[arg(
        long = "defaults",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub defaults: Option<bool>,
    /// Replace an existing configuration file, keeping a backup
    #[arg(
        long = "overwrite",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub overwrite: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
#[command(rename_all = "camelCase")]
pub enum Commands {
    /// List artists, albums and tracks
    #[command(alias = "ls")]
    List(ListArgs),
    /// Check the library for problems
    Check(CheckArgs),
    /// Make track tags agree with file and directory names
    Repair(RepairArgs),
    /// Delete the backups made by repair
    PostRepair,
    /// Delete the media database so it is rebuilt from the repaired tags
    ResetDatabase(ResetDatabaseArgs),
    /// Write the configuration file
    Export(ExportArgs),
    /// Show version and build information
    About,
}

/// What a command runs against.
pub struct Context<'a> {
    pub paths: &'a AppPaths,
    pub config: &'a Configuration,
    pub console: &'a dyn Console,
    pub services: &'a dyn ServiceManager,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli, ctx: &Context<'_>) -> anyhow::Result<()> {
    match &cli.command {
        Commands::List(args) => cmd_list(ctx, &cli.library, args),
        Commands::Check(args) => cmd_check(ctx, &cli.library, args),
        Commands::Repair(args) => cmd_repair(ctx, &cli.library, args),
        Commands::PostRepair => cmd_post_repair(ctx, &cli.library),
        Commands::ResetDatabase(args) => cmd_reset_database(ctx, args),
        Commands::Export(args) => cmd_export(ctx, args),
        Commands::About => cmd_about(ctx),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Resolved library selection.
#[derive(Debug, Clone)]
pub(crate) struct LibrarySettings {
    pub top_dir: PathBuf,
    pub extension: String,
    pub filters: Filters,
}

impl LibrarySettings {
    /// Combine flags with configured defaults and validate the result.
    pub fn resolve(args: &LibraryArgs, config: &Configuration) -> anyhow::Result<Self> {
        let defaults = CommonDefaults::load(config)?;
        let top_dir = args.top_dir.clone().unwrap_or(defaults.top_dir);
        let extension = args.ext.clone().unwrap_or(defaults.ext);
        let artist = args.artist_filter.clone().unwrap_or(defaults.artist_filter);
        let album = args.album_filter.clone().unwrap_or(defaults.album_filter);

        let top_dir = existing_dir("topDir", &top_dir)?;
        validate_extension("ext", &extension)?;
        Ok(Self {
            top_dir,
            extension,
            filters: Filters {
                artist: compile_filter("artistFilter", &artist)?,
                album: compile_filter("albumFilter", &album)?,
            },
        })
    }

    pub fn scan_options(&self) -> ScanOptions<'_> {
        ScanOptions {
            top_dir: &self.top_dir,
            extension: &self.extension,
        }
    }

    /// Filtered load; an empty result is an error.
    pub fn load(&self) -> anyhow::Result<Library> {
        let library = scanner::load_filtered(&self.scan_options(), &self.filters)?;
        non_empty(library)
    }

    /// Unfiltered load; an empty result is an error.
    pub fn load_unfiltered(&self) -> anyhow::Result<Library> {
        let library = scanner::load_unfiltered(&self.scan_options())?;
        non_empty(library)
    }
}

fn non_empty(library: Library) -> anyhow::Result<Library> {
    if library.is_empty() {
        anyhow::bail!(NO_MUSIC_FOUND);
    }
    Ok(library)
}

pub(crate) fn existing_dir(flag: &str, value: &str) -> Result<PathBuf, Error> {
    let path = Path::new(value);
    match path.metadata() {
        Ok(meta) if meta.is_dir() => Ok(path.to_path_buf()),
        Ok(_) => Err(Error::user_input(flag, value, "not a directory")),
        Err(e) => Err(Error::user_input(flag, value, e.to_string())),
    }
}

/// An extension is a dot followed by at least one character, with no further
/// dots or path separators.
pub(crate) fn validate_extension(flag: &str, value: &str) -> Result<(), Error> {
    let valid = value
        .strip_prefix('.')
        .is_some_and(|rest| !rest.is_empty() && !rest.contains(['.', '/', '\\']));
    if valid {
        Ok(())
    } else {
        Err(Error::user_input(
            flag,
            value,
            "must be a '.' followed by one or more characters, with no further '.' or path separators",
        ))
    }
}

pub(crate) fn compile_filter(flag: &str, value: &str) -> Result<Regex, Error> {
    Regex::new(value).map_err(|e| Error::user_input(flag, value, e.to_string()))
}

/// Report a warning to the user and to the log.
pub(crate) fn warn_user(ctx: &Context<'_>, message: &str) {
    tracing::warn!("{}", message);
    ctx.console.err(message);
}
