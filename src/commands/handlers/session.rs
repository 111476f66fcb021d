//! Session command handlers (login, logout).

use tracing::info;

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::error::{ConsoleError, Result};

/// Handle `login -c <cluster>`.
///
/// The connection is not opened here; the first SQL statement opens it.
pub fn handle_login(ctx: &CommandContext<'_>, cluster: &str) -> Result<CommandOutput> {
    let cluster = cluster.trim();
    if cluster.is_empty() {
        return Err(ConsoleError::command(
            "the cluster_name cannot be empty, required flag(s) -c {clusterName} not set",
        ));
    }
    if !ctx.registry.contains(cluster) {
        return Err(ConsoleError::config(format!(
            "cluster '{cluster}' is not configured, run [cluster list] to view configured clusters"
        )));
    }

    ctx.session.login(cluster);
    info!("Logged in to cluster '{}'", cluster);
    Ok(CommandOutput::success(format!(
        "Logged in to cluster [{cluster}]"
    )))
}

/// Handle `logout`.
pub fn handle_logout(ctx: &CommandContext<'_>) -> CommandOutput {
    let cluster = ctx.session.cluster();
    if cluster.is_empty() {
        return CommandOutput::info("Not logged in to any cluster");
    }

    ctx.session.logout();
    info!("Logged out of cluster '{}'", cluster);
    CommandOutput::success(format!("Logged out of cluster [{cluster}]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionRegistry;
    use crate::db::MockDatabaseClient;
    use crate::session::Session;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn registry() -> ConnectionRegistry {
        let registry = ConnectionRegistry::new(Default::default());
        registry.register("prod", Arc::new(MockDatabaseClient::new()));
        registry
    }

    #[test]
    fn test_login_sets_cluster_and_resets_schema() {
        let session = Session::new();
        let registry = registry();
        let shutdown = CancellationToken::new();
        let ctx = CommandContext {
            session: &session,
            registry: &registry,
            shutdown: &shutdown,
        };

        session.login("prod");
        session.set_schema("test");

        let output = handle_login(&ctx, "prod").unwrap();
        assert_eq!(output, CommandOutput::success("Logged in to cluster [prod]"));
        assert_eq!(session.cluster(), "prod");
        assert_eq!(session.schema(), "");
    }

    #[test]
    fn test_login_unknown_cluster_keeps_session() {
        let session = Session::new();
        let registry = registry();
        let shutdown = CancellationToken::new();
        let ctx = CommandContext {
            session: &session,
            registry: &registry,
            shutdown: &shutdown,
        };

        let err = handle_login(&ctx, "staging").unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));
        assert_eq!(session.cluster(), "");
    }

    #[test]
    fn test_logout() {
        let session = Session::new();
        let registry = registry();
        let shutdown = CancellationToken::new();
        let ctx = CommandContext {
            session: &session,
            registry: &registry,
            shutdown: &shutdown,
        };

        assert!(matches!(handle_logout(&ctx), CommandOutput::Info(_)));

        session.login("prod");
        assert_eq!(
            handle_logout(&ctx),
            CommandOutput::success("Logged out of cluster [prod]")
        );
        assert_eq!(session.cluster(), "");
    }
}
