//! mp3repair - makes MP3 tags agree with the library's directory layout.
//!
//! The library is laid out as `<top>/<artist>/<album>/<NN name>.mp3`. The
//! tool lists and checks that tree, repairs track tags that disagree with it
//! (keeping backups), and resets the media player's database afterwards.

pub mod cli;
pub mod config;
pub mod dirty;
pub mod error;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod reconcile;
pub mod repair;
pub mod scanner;
pub mod service;
#[cfg(test)]
pub mod test_utils;

use std::fs::{self, OpenOptions};
use std::process::ExitCode;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Terminal;
use config::AppPaths;
use service::SystemServiceManager;

const LOG_FILE_NAME: &str = "mp3repair.log";

fn main() -> ExitCode {
    let paths = match AppPaths::discover() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };
    init_logging(&paths);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mp3repair starting");

    let args = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let status = cli::run(args, &paths, &Terminal, &SystemServiceManager);
    tracing::info!(status, "mp3repair finished");
    ExitCode::from(status)
}

/// Log to `<data dir>/logs/mp3repair.log`, or to stderr (warnings only) when
/// the file cannot be opened.
fn init_logging(paths: &AppPaths) {
    let log_dir = paths.log_dir();
    let file = fs::create_dir_all(&log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(LOG_FILE_NAME))
    });

    match file {
        Ok(file) => {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mp3repair=info"));
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .init();
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(EnvFilter::new("warn"))
                .init();
            tracing::warn!(dir = ?log_dir, error = %e, "log file unavailable");
        }
    }
}
