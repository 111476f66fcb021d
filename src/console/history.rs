//! History file location.
//!
//! The path is resolved once at startup, in order: `--history`, the
//! `CLUSTERDBA_HISTORY` environment variable, `console.history_file` from
//! the config file, then `~/.clusterdba/history`.

use std::env;
use std::path::{Path, PathBuf};

const HISTORY_ENV_VAR: &str = "CLUSTERDBA_HISTORY";
const DEFAULT_HISTORY_DIR: &str = ".clusterdba";
const DEFAULT_HISTORY_FILE: &str = "history";

/// Resolves the history file path.
pub fn history_path(flag: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    resolve(flag, env::var(HISTORY_ENV_VAR).ok().as_deref(), configured)
}

fn resolve(flag: Option<&Path>, from_env: Option<&str>, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = configured {
        return path.to_path_buf();
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HISTORY_DIR)
        .join(DEFAULT_HISTORY_FILE)
}
