//! Command handlers for clusterdba.
//!
//! Each handler takes the command context and returns an output describing
//! what to show. Errors are returned, not printed.

pub mod cluster;
pub mod kill;
pub mod session;

use tokio_util::sync::CancellationToken;

use super::definitions::{ClusterAction, ConsoleCommand};
use super::output::CommandOutput;
use crate::connection::ConnectionRegistry;
use crate::error::Result;
use crate::session::Session;

/// Context provided to command handlers.
pub struct CommandContext<'a> {
    /// Shared session of the console.
    pub session: &'a Session,
    /// Configured clusters and their cached connections.
    pub registry: &'a ConnectionRegistry,
    /// Cancelled when the whole process is shutting down.
    pub shutdown: &'a CancellationToken,
}

/// Executes a parsed command.
pub async fn execute(ctx: &CommandContext<'_>, command: ConsoleCommand) -> Result<CommandOutput> {
    match command {
        ConsoleCommand::Login { cluster } => session::handle_login(ctx, &cluster),
        ConsoleCommand::Logout => Ok(session::handle_logout(ctx)),
        ConsoleCommand::Cluster {
            action: ClusterAction::List,
        } => Ok(cluster::handle_list(ctx)),
        ConsoleCommand::Kill { target } => kill::handle_kill(ctx, target).await,
    }
}
