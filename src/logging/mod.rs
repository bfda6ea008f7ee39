//! Logging setup and secret masking
//!
//! Diagnostics go through `tracing`. The subscriber writes human-readable
//! lines to the console and, when a log file is configured, a plain-text
//! copy to that file.

mod mask;

pub use mask::SecretMask;

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Builds the filter for the given verbosity
///
/// An explicit `level` (from `--log-level`, `LOG_LEVEL` or the settings
/// file) applies to this crate when no `-v` flag was given.
pub fn build_filter(verbose: u8, quiet: bool, level: Option<&str>) -> EnvFilter {
    if quiet {
        // Only show errors
        return EnvFilter::new("error");
    }
    match (verbose, level) {
        (0, Some(level)) => EnvFilter::new(format!("part_scout={},warn", level.to_lowercase())),
        (0, None) => EnvFilter::new("part_scout=info,warn"),
        (1, _) => EnvFilter::new("part_scout=debug,info"),
        (2, _) => EnvFilter::new("part_scout=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Initializes the global tracing subscriber
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags
/// * `quiet` - Only log errors
/// * `level` - Optional explicit level for this crate
/// * `log_file` - Optional file receiving a copy of every log line
pub fn init_logging(
    verbose: u8,
    quiet: bool,
    level: Option<&str>,
    log_file: Option<&Path>,
) -> std::io::Result<()> {
    let filter = build_filter(verbose, quiet, level);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .init();
        }
    }

    Ok(())
}
