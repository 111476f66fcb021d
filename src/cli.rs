//! Command-line argument parsing for clusterdba.

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::commands::definitions::ConsoleCommand;

/// An operator console for distributed MySQL-protocol SQL clusters.
#[derive(Parser, Debug)]
#[command(name = "clusterdba")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Cluster to log in to (interactive) or to act on (subcommand)
    #[arg(short = 'c', long = "cluster", value_name = "NAME")]
    pub cluster: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// History file path
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Do not start the interactive console
    #[arg(short = 'd', long)]
    pub disable_interactive: bool,

    /// Run one command and exit
    #[command(subcommand)]
    pub command: Option<ConsoleCommand>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns the cluster named with `-c`, if any.
    pub fn cluster_name(&self) -> Option<&str> {
        self.cluster.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns the log file from `--log-file`, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}
