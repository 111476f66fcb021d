//! Command definitions.
//!
//! Administrative commands are declared once with clap and parsed from shell
//! words, both in the interactive loop and as the process's subcommand.
//! `COMMANDS` adds the console metadata used for help and completion,
//! including the loop-level commands clap never sees.

use clap::{Args, Parser, Subcommand};

/// Administrative commands understood by the console.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConsoleCommand {
    /// Log in to a configured cluster
    Login {
        /// Cluster name from the configuration
        #[arg(short = 'c', long = "cluster")]
        cluster: String,
    },

    /// Log out of the active cluster
    Logout,

    /// Inspect configured clusters
    Cluster {
        #[command(subcommand)]
        action: ClusterAction,
    },

    /// Terminate matching sessions across the cluster
    Kill {
        #[command(subcommand)]
        target: KillCommand,
    },
}

/// `cluster` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ClusterAction {
    /// List configured clusters
    List,
}

/// `kill` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum KillCommand {
    /// Kill sessions running statements with the given digests
    Digest {
        /// Comma-separated statement digests
        #[arg(long = "sql-digest", value_delimiter = ',', required = true)]
        sql_digests: Vec<String>,

        #[command(flatten)]
        options: KillArgs,
    },

    /// Kill sessions logged in as the given users
    User {
        /// Comma-separated usernames
        #[arg(long = "username", value_delimiter = ',', required = true)]
        usernames: Vec<String>,

        #[command(flatten)]
        options: KillArgs,
    },
}

/// Tuning flags shared by the kill subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct KillArgs {
    /// Cluster to act on (defaults to the logged-in cluster)
    #[arg(short = 'c', long = "cluster")]
    pub cluster: Option<String>,

    /// Stop after this many seconds (0 runs until interrupted)
    #[arg(long, default_value_t = 0)]
    pub duration: u64,

    /// Pause between rounds, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub interval: u64,

    /// Maximum kills in flight at once
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: u64,
}

/// Parser for one interactive command line.
#[derive(Debug, Parser)]
#[command(
    name = "clusterdba",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: ConsoleCommand,
}

/// Category for grouping commands in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    /// Console commands handled by the input loop.
    Console,
    /// Session and cluster commands.
    Cluster,
    /// Session termination.
    Kill,
}

impl CommandCategory {
    /// Returns the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Console => "Console commands",
            Self::Cluster => "Cluster commands",
            Self::Kill => "Session termination",
        }
    }
}

/// Definition of a command.
#[derive(Debug, Clone)]
pub struct CommandDef {
    /// Command name as typed.
    pub name: &'static str,
    /// Short description shown in help.
    pub description: &'static str,
    /// Usage line.
    pub usage: &'static str,
    /// Category for grouping in help.
    pub category: CommandCategory,
}

/// All command definitions.
pub static COMMANDS: &[CommandDef] = &[
    CommandDef {
        name: "login",
        description: "Log in to a configured cluster",
        usage: "login -c <cluster>",
        category: CommandCategory::Cluster,
    },
    CommandDef {
        name: "logout",
        description: "Log out of the active cluster",
        usage: "logout",
        category: CommandCategory::Cluster,
    },
    CommandDef {
        name: "cluster",
        description: "List configured clusters",
        usage: "cluster list",
        category: CommandCategory::Cluster,
    },
    CommandDef {
        name: "kill",
        description: "Kill sessions by statement digest or username",
        usage: "kill digest --sql-digest <d1,d2> | kill user --username <u1,u2> \
                [-c <cluster>] [--duration <secs>] [--interval <ms>] [--concurrency <n>]",
        category: CommandCategory::Kill,
    },
    CommandDef {
        name: "clear",
        description: "Clear the screen",
        usage: "clear",
        category: CommandCategory::Console,
    },
    CommandDef {
        name: "help",
        description: "Show this help message",
        usage: "help",
        category: CommandCategory::Console,
    },
    CommandDef {
        name: "exit",
        description: "Exit the console",
        usage: "exit | quit",
        category: CommandCategory::Console,
    },
    CommandDef {
        name: "quit",
        description: "Exit the console",
        usage: "exit | quit",
        category: CommandCategory::Console,
    },
];

/// Finds a command definition by name, ignoring ASCII case.
pub fn find_command(name: &str) -> Option<&'static CommandDef> {
    COMMANDS
        .iter()
        .find(|cmd| cmd.name.eq_ignore_ascii_case(name))
}

/// Returns true if `name` is a console command.
pub fn is_command_name(name: &str) -> bool {
    find_command(name).is_some()
}

/// Returns all command names, for completion.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|cmd| cmd.name)
}
