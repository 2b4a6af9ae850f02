//! Library check command.

use crate::config::CheckDefaults;
use crate::error::Error;
use crate::reconcile::{IssueReport, check_empty, check_gaps, check_integrity};

use super::{CheckArgs, Context, LibraryArgs, LibrarySettings};

/// Run the enabled analyses and print their merged report
pub fn cmd_check(ctx: &Context<'_>, library: &LibraryArgs, args: &CheckArgs) -> anyhow::Result<()> {
    let d = CheckDefaults::load(ctx.config)?;
    let empty = args.empty.unwrap_or(d.empty);
    let gaps = args.gaps.unwrap_or(d.gaps);
    let integrity = args.integrity.unwrap_or(d.integrity);
    if !empty && !gaps && !integrity {
        return Err(Error::NoWork(
            "no checks will be executed: -empty, -gaps and -integrity are all false".into(),
        )
        .into());
    }

    let settings = LibrarySettings::resolve(library, ctx.config)?;
    let mut report = IssueReport::default();

    // Empty folders only show up before filtering prunes them
    let mut library = if empty {
        let unfiltered = settings.load_unfiltered()?;
        let found = check_empty(&unfiltered);
        if found.is_empty() {
            ctx.console.out("Empty Folder Analysis: no empty folders found");
        }
        report = report.merge(found);
        let filtered = unfiltered.filter(&settings.filters.artist, &settings.filters.album);
        if gaps || integrity {
            super::non_empty(filtered)?
        } else {
            filtered
        }
    } else {
        settings.load()?
    };

    if gaps {
        let found = check_gaps(&library);
        if found.is_empty() {
            ctx.console.out("Check Gaps: no gaps found");
        }
        report = report.merge(found);
    }
    if integrity {
        let found = check_integrity(&mut library);
        if found.is_empty() {
            ctx.console.out("Integrity Analysis: no issues found");
        }
        report = report.merge(found);
    }

    for line in report.lines() {
        ctx.console.out(&line);
    }
    Ok(())
}
