//! Kill command handlers.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::CommandContext;
use crate::commands::definitions::{KillArgs, KillCommand};
use crate::commands::output::CommandOutput;
use crate::error::{ConsoleError, Result};
use crate::kill::{self, KillSummary};

/// Handle `kill digest ...` and `kill user ...`.
///
/// Blocks until the engine stops. Ctrl-C or SIGTERM interrupts the run and
/// still yields a summary.
pub async fn handle_kill(ctx: &CommandContext<'_>, command: KillCommand) -> Result<CommandOutput> {
    let (values, options, by_digest) = match command {
        KillCommand::Digest {
            sql_digests,
            options,
        } => (sql_digests, options, true),
        KillCommand::User { usernames, options } => (usernames, options, false),
    };

    let cluster = resolve_cluster(ctx, &options)?;
    let concurrency = usize::try_from(options.concurrency)
        .map_err(|_| ConsoleError::command("concurrency is out of range"))?;

    let cancel = ctx.shutdown.child_token();
    let listener = spawn_interrupt_listener(cancel.clone());

    let result = if by_digest {
        kill::kill_by_fingerprint(
            &cancel,
            ctx.registry,
            &cluster,
            &values,
            options.duration,
            options.interval,
            concurrency,
        )
        .await
    } else {
        kill::kill_by_username(
            &cancel,
            ctx.registry,
            &cluster,
            &values,
            options.duration,
            options.interval,
            concurrency,
        )
        .await
    };
    listener.abort();

    result.map(|summary| summary_output(&cluster, &summary))
}

/// Picks `-c` when given, else the logged-in cluster.
fn resolve_cluster(ctx: &CommandContext<'_>, options: &KillArgs) -> Result<String> {
    let cluster = options
        .cluster
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| ctx.session.cluster());

    if cluster.is_empty() {
        return Err(ConsoleError::command(
            "the cluster_name cannot be empty, required flag(s) -c {clusterName} not set",
        ));
    }
    Ok(cluster)
}

fn summary_output(cluster: &str, summary: &KillSummary) -> CommandOutput {
    let mut message = format!(
        "Kill on cluster [{}] stopped ({}): {} session(s) killed in {} round(s)",
        cluster, summary.stop, summary.killed, summary.rounds
    );
    if let Some(round) = summary.unfinished_round {
        message.push_str(&format!(
            "; round {} left {} of {} session(s) unkilled",
            round.round, round.remaining, round.discovered
        ));
    }
    CommandOutput::success(message)
}

/// Cancels `cancel` on Ctrl-C or SIGTERM.
fn spawn_interrupt_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, interrupting kill"),
                        _ = sigterm.recv() => info!("received SIGTERM, interrupting kill"),
                        _ = cancel.cancelled() => return,
                    }
                }
                Err(e) => {
                    warn!("failed to register SIGTERM handler: {e}, listening for SIGINT only");
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, interrupting kill"),
                        _ = cancel.cancelled() => return,
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => info!("received SIGINT, interrupting kill"),
                _ = cancel.cancelled() => return,
            }
        }

        cancel.cancel();
    })
}
