//! Media database reset command.
//!
//! The media player keeps its own copy of every track's tags. After tracks
//! are repaired that copy is stale, so the indexing service is stopped and
//! its database files deleted; the player rebuilds them from the files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use walkdir::WalkDir;

use crate::config::ResetDatabaseDefaults;
use crate::dirty::DirtyMarker;

use super::{Context, ResetDatabaseArgs, existing_dir, validate_extension};

/// Stop the indexing service and delete its database files
pub fn cmd_reset_database(ctx: &Context<'_>, args: &ResetDatabaseArgs) -> anyhow::Result<()> {
    let d = ResetDatabaseDefaults::load(ctx.config)?;
    let service = args.service.clone().unwrap_or(d.service);
    let timeout = Duration::from_secs(args.timeout.unwrap_or(d.timeout));
    let metadata = args.metadata.clone().unwrap_or(d.metadata);
    let extension = args.extension.clone().unwrap_or(d.extension);
    let force = args.force.unwrap_or(d.force);
    validate_extension("extension", &extension)?;

    let marker = DirtyMarker::new(ctx.paths.dirty_marker());
    if !marker.is_dirty() && !force {
        ctx.console.out(
            "Running \"resetDatabase\" is not necessary, as no track files have been edited",
        );
        return Ok(());
    }
    let dir = existing_dir("metadata", &metadata)?;

    match ctx.services.stop(&service, timeout) {
        Ok(()) => ctx
            .console
            .out(&format!("The service {:?} has been stopped", service)),
        Err(e) => {
            tracing::error!(service = %service, error = %e, "service not stopped");
            ctx.console
                .err(&format!("The service {:?} cannot be stopped: {}", service, e));
        }
    }

    let files = metadata_files(&dir, &extension);
    if files.is_empty() {
        ctx.console
            .out(&format!("No metadata files were found in {:?}", dir));
        clear(ctx, &marker);
        return Ok(());
    }

    let mut deleted = 0;
    for file in &files {
        match fs::remove_file(file) {
            Ok(()) => deleted += 1,
            Err(e) => {
                tracing::error!(path = ?file, error = %e, "metadata file not deleted");
                ctx.console
                    .err(&format!("The file {:?} cannot be deleted: {}", file, e));
            }
        }
    }
    ctx.console.out(&format!(
        "{} out of {} metadata files have been deleted from {:?}",
        deleted,
        files.len(),
        dir
    ));

    if deleted < files.len() {
        anyhow::bail!(
            "{} metadata files could not be deleted",
            files.len() - deleted
        );
    }
    clear(ctx, &marker);
    Ok(())
}

fn clear(ctx: &Context<'_>, marker: &DirtyMarker) {
    if let Err(e) = marker.clear_dirty() {
        ctx.console
            .err(&format!("The dirty marker cannot be cleared: {}", e));
    }
}

/// Files directly inside `dir` ending with `extension`.
fn metadata_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let extension = extension.to_lowercase();
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| name.to_lowercase().ends_with(&extension))
        })
        .map(|e| e.into_path())
        .collect()
}
