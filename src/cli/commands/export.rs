//! Configuration export command.

use std::fs;

use anyhow::Context as _;

use crate::config::{self, Defaults, ExportDefaults};
use crate::error::Error;

use super::{Context, ExportArgs};

/// Write the effective defaults to the configuration file
pub fn cmd_export(ctx: &Context<'_>, args: &ExportArgs) -> anyhow::Result<()> {
    let d = ExportDefaults::load(ctx.config)?;
    let defaults = args.defaults.unwrap_or(d.defaults);
    let overwrite = args.overwrite.unwrap_or(d.overwrite);
    if !defaults {
        return Err(Error::NoWork("no export will be done: -defaults is false".into()).into());
    }

    // Export what a command would use, not just the built-in values
    let values = Defaults::load(ctx.config)?;
    let path = ctx.paths.config_file();
    if path.exists() {
        if !overwrite {
            anyhow::bail!(
                "The file {:?} exists and cannot be overwritten without -overwrite",
                path
            );
        }
        let backup = ctx.paths.config_backup();
        fs::rename(&path, &backup)
            .with_context(|| format!("cannot back up {:?} to {:?}", path, backup))?;
        tracing::info!(from = ?path, to = ?backup, "configuration backed up");
    }

    config::save(&values, &path)?;
    ctx.console
        .out(&format!("Default configuration written to {:?}", path));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::Harness;
    use crate::config::Configuration;

    fn export_args(overwrite: bool) -> ExportArgs {
        ExportArgs {
            defaults: Some(true),
            overwrite: Some(overwrite),
        }
    }

    #[test]
    fn test_export_writes_loadable_defaults() {
        let h = Harness::new().with_config("check:\n  gaps: true\n");
        cmd_export(&h.ctx(), &export_args(false)).unwrap();

        let path = h.paths.config_file();
        assert_eq!(
            h.console.out_lines(),
            vec![format!("Default configuration written to {:?}", path)]
        );
        let written = Configuration::load(&path).unwrap();
        assert!(written.warnings().is_empty());
        assert!(Defaults::load(&written).unwrap().check.gaps);
    }

    #[test]
    fn test_existing_file_needs_overwrite() {
        let h = Harness::new();
        let path = h.paths.config_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "list:\n  annotate: true\n").unwrap();

        assert!(cmd_export(&h.ctx(), &export_args(false)).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "list:\n  annotate: true\n");

        cmd_export(&h.ctx(), &export_args(true)).unwrap();
        assert_eq!(
            fs::read_to_string(h.paths.config_backup()).unwrap(),
            "list:\n  annotate: true\n"
        );
        assert!(fs::read_to_string(&path).unwrap().contains("resetDatabase:"));
    }

    #[test]
    fn test_defaults_false_is_no_work() {
        let h = Harness::new();
        let err = cmd_export(&h.ctx(), &ExportArgs::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoWork(_))));
        assert!(!h.paths.config_file().exists());
    }
}
