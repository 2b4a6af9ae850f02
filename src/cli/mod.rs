//! Command-line interface for mp3repair.
//!
//! This module turns an argument list into a command run: it loads the
//! configuration file, rewrites single-dash flags, supplies the default
//! command, parses with clap and dispatches.

mod args;
mod commands;
mod console;

use clap::Parser;

use crate::config::{AppPaths, CommandDefaults, Configuration};
use crate::service::ServiceManager;

pub use commands::{Cli, Commands, Context, run_command};
pub use console::{Console, Terminal};

/// Run the command named by `args` (program name first) and return the
/// process exit status.
pub fn run(
    args: Vec<String>,
    paths: &AppPaths,
    console: &dyn Console,
    services: &dyn ServiceManager,
) -> u8 {
    let config = match Configuration::load(&paths.config_file()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration not loaded");
            console.err(&e.to_string());
            return 1;
        }
    };
    for warning in config.warnings() {
        console.err(&format!("warning: configuration file: {}", warning));
    }

    let default_command = CommandDefaults::load(&config)
        .map(|d| d.default)
        .unwrap_or_else(|e| {
            console.err(&e.to_string());
            CommandDefaults::builtin().default
        });
    let args = args::normalize(args, &default_command);
    tracing::debug!(?args, "command line");

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) => {
            let text = e.render().to_string();
            // Help and version requests are not errors
            if e.use_stderr() {
                console.err(text.trim_end());
                return 1;
            }
            console.out(text.trim_end());
            return 0;
        }
    };

    let ctx = Context {
        paths,
        config: &config,
        console,
        services,
    };
    match run_command(&cli, &ctx) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "command failed");
            console.err(&format!("{:#}", e));
            1
        }
    }
}
