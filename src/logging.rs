//! Logging configuration for clusterdba.
//!
//! Logs go to stderr unless a log file is configured. `RUST_LOG` overrides
//! the configured level.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{ConsoleError, Result};

/// Installs the global subscriber.
///
/// `level` is the default filter directive; `file`, when given, receives
/// the records without ANSI colors.
pub fn init(level: &str, file: Option<&Path>) -> Result<()> {
    let filter = env_filter(level);

    match file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    ConsoleError::config(format!("Could not create log directory: {e}"))
                })?;
            }
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ConsoleError::config(format!(
                        "Could not open log file {}: {e}",
                        path.display()
                    ))
                })?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Builds the filter from `RUST_LOG`, falling back to `level`, then `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
