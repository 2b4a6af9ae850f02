//! Repair and post-repair cleanup commands.

use crate::config::RepairDefaults;
use crate::dirty::DirtyMarker;
use crate::reconcile::conflicted_tracks;
use crate::repair::{CleanupEvent, RepairEvent, apply_repairs, plan_lines, remove_backups};

use super::{Context, LibraryArgs, LibrarySettings, RepairArgs};

/// Make conflicted tracks' tags agree with their names
pub fn cmd_repair(ctx: &Context<'_>, library: &LibraryArgs, args: &RepairArgs) -> anyhow::Result<()> {
    let dry_run = args
        .dry_run
        .unwrap_or(RepairDefaults::load(ctx.config)?.dry_run);
    let mut library = LibrarySettings::resolve(library, ctx.config)?.load()?;

    let conflicted = conflicted_tracks(&mut library);
    if conflicted.is_empty() {
        ctx.console.out("No repairable track defects found");
        return Ok(());
    }

    if dry_run {
        for line in plan_lines(&library, &conflicted) {
            ctx.console.out(&line);
        }
        return Ok(());
    }

    let marker = DirtyMarker::new(ctx.paths.dirty_marker());
    let outcome = apply_repairs(&mut library, &conflicted, &marker);
    for event in &outcome.events {
        match event {
            RepairEvent::Repaired { track } => ctx.console.out(&format!("{:?} repaired.", track)),
            RepairEvent::BackupDirFailed { dir, message } => ctx
                .console
                .err(&format!("The directory {:?} cannot be created: {}", dir, message)),
            RepairEvent::BackupFailed { track, message } => ctx
                .console
                .err(&format!("The track {:?} cannot be backed up: {}", track, message)),
            RepairEvent::RepairFailed { track, message } => ctx
                .console
                .err(&format!("An error occurred repairing track {:?}: {}", track, message)),
            RepairEvent::BackedUp { .. } | RepairEvent::Unchanged { .. } => {}
        }
    }

    let failures = outcome.failures();
    if failures > 0 {
        anyhow::bail!(
            "{} of {} tracks could not be repaired",
            failures,
            conflicted.len()
        );
    }
    Ok(())
}

/// Delete the backup directories made by repair
pub fn cmd_post_repair(ctx: &Context<'_>, library: &LibraryArgs) -> anyhow::Result<()> {
    let library = LibrarySettings::resolve(library, ctx.config)?.load()?;
    let events = remove_backups(&library);
    if events.is_empty() {
        ctx.console.out("There are no backup directories to delete");
        return Ok(());
    }

    let mut failures = 0;
    for event in events {
        match event {
            CleanupEvent::Deleted { artist, album } => ctx.console.out(&format!(
                "The backup directory for artist {:?} album {:?} has been deleted",
                artist, album
            )),
            CleanupEvent::Failed {
                artist,
                album,
                message,
            } => {
                failures += 1;
                ctx.console.err(&format!(
                    "The backup directory for artist {:?} album {:?} cannot be deleted: {}",
                    artist, album, message
                ));
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{} backup directories could not be deleted", failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cli::commands::testing::Harness;
    use crate::metadata::read_tag;
    use crate::model::BACKUP_DIR_NAME;
    use crate::test_utils::{consistent_track, track_file};
    use id3::TagLike;

    fn conflicted(h: &Harness) -> std::path::PathBuf {
        track_file(&h.music(), "Artist", "bar", "01 trackname.mp3")
            .tags("foo", "Artist", "trackname", "1")
            .create()
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let h = Harness::new();
        let path = conflicted(&h);
        let before = fs::read(&path).unwrap();
        let args = RepairArgs {
            dry_run: Some(true),
        };
        cmd_repair(&h.ctx(), &h.library_args(), &args).unwrap();

        assert_eq!(
            h.console.out_lines(),
            vec![
                "\"Artist\"",
                "  \"bar\"",
                "    1 \"trackname\" need to repair album name;",
            ]
        );
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(!DirtyMarker::new(h.paths.dirty_marker()).is_dirty());
        assert!(!path.parent().unwrap().join(BACKUP_DIR_NAME).exists());
    }

    #[test]
    fn test_apply_repairs_and_marks_dirty() {
        let h = Harness::new();
        let path = conflicted(&h);
        let before = fs::read(&path).unwrap();
        cmd_repair(&h.ctx(), &h.library_args(), &RepairArgs::default()).unwrap();

        let backup = path.parent().unwrap().join(BACKUP_DIR_NAME).join("1.mp3");
        assert_eq!(fs::read(&backup).unwrap(), before);
        assert_eq!(read_tag(&path).unwrap().album(), Some("bar"));
        assert!(DirtyMarker::new(h.paths.dirty_marker()).is_dirty());
        assert_eq!(h.console.out_lines(), vec![format!("{:?} repaired.", path)]);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let h = Harness::new();
        conflicted(&h);
        cmd_repair(&h.ctx(), &h.library_args(), &RepairArgs::default()).unwrap();
        h.console.out.borrow_mut().clear();

        cmd_repair(&h.ctx(), &h.library_args(), &RepairArgs::default()).unwrap();
        assert_eq!(h.console.out_lines(), vec!["No repairable track defects found"]);
    }

    #[test]
    fn test_config_can_default_to_dry_run() {
        let h = Harness::new().with_config("repair:\n  dryRun: true\n");
        let path = conflicted(&h);
        let before = fs::read(&path).unwrap();
        cmd_repair(&h.ctx(), &h.library_args(), &RepairArgs::default()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_post_repair_deletes_backups() {
        let h = Harness::new();
        conflicted(&h);
        consistent_track(&h.music(), "Other", "Clean", 1, "fine");
        cmd_repair(&h.ctx(), &h.library_args(), &RepairArgs::default()).unwrap();
        h.console.out.borrow_mut().clear();

        cmd_post_repair(&h.ctx(), &h.library_args()).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec!["The backup directory for artist \"Artist\" album \"bar\" has been deleted"]
        );
        assert!(!h.music().join("Artist/bar").join(BACKUP_DIR_NAME).exists());
    }

    #[test]
    fn test_post_repair_without_backups() {
        let h = Harness::new();
        consistent_track(&h.music(), "Other", "Clean", 1, "fine");
        cmd_post_repair(&h.ctx(), &h.library_args()).unwrap();
        assert_eq!(
            h.console.out_lines(),
            vec!["There are no backup directories to delete"]
        );
    }
}
