//! Command-line preprocessing ahead of clap.
//!
//! Flags are written with a single dash (`-topDir dir`, `-dryRun=false`).
//! Clap only knows long flags by their double-dash form, so a single-dash
//! argument whose name is a known long flag is rewritten before parsing.
//! Invocations that start with a flag (or have no arguments at all) get the
//! configured default command inserted.

use std::collections::HashSet;

use clap::CommandFactory;

use super::commands::Cli;

/// Long flag names accepted anywhere on the command line.
pub fn known_long_flags() -> HashSet<String> {
    let cmd = Cli::command();
    let mut flags: HashSet<String> = ["help", "version"].iter().map(|s| s.to_string()).collect();
    let args = cmd
        .get_arguments()
        .chain(cmd.get_subcommands().flat_map(|sub| sub.get_arguments()));
    for arg in args {
        if let Some(long) = arg.get_long() {
            flags.insert(long.to_string());
        }
    }
    flags
}

fn is_help_or_version(arg: &str) -> bool {
    matches!(arg, "--help" | "-h" | "--version" | "-V")
}

/// Rewrite single-dash long flags and insert `default_command` if needed.
///
/// `args[0]` is the program name and is left alone.
pub fn normalize(args: Vec<String>, default_command: &str) -> Vec<String> {
    let known = known_long_flags();
    let mut out: Vec<String> = args
        .into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || arg.starts_with("--") || !arg.starts_with('-') {
                return arg;
            }
            let name = arg[1..].split('=').next().unwrap_or_default();
            if known.contains(name) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect();

    let needs_command = match out.get(1) {
        None => true,
        Some(first) => first.starts_with('-') && !is_help_or_version(first),
    };
    if needs_command {
        let at = out.len().min(1);
        out.insert(at, default_command.to_string());
    }
    out
}
