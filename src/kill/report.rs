//! Progress events of the kill engine and their log rendering.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use super::{RoundTally, StopReason};

/// One step of kill engine progress.
#[derive(Debug, Clone, PartialEq)]
pub enum KillEvent {
    RoundStarted {
        round: u64,
    },
    SessionsDiscovered {
        round: u64,
        discovered: usize,
        elapsed: Duration,
    },
    SessionKilled {
        round: u64,
        instance: String,
        session_id: u64,
        remaining: usize,
        elapsed: Duration,
    },
    RoundCompleted {
        round: u64,
        discovered: usize,
        killed: usize,
        elapsed: Duration,
    },
    RoundAborted {
        round: u64,
        discovered: usize,
        killed: usize,
        failed: usize,
        unresolved: usize,
        error: String,
    },
    Stopped {
        reason: StopReason,
        rounds: u64,
        killed: usize,
        unfinished_round: Option<RoundTally>,
    },
}

/// Turns kill events into log records, one message at a time.
#[derive(Debug, Clone)]
pub struct KillReporter {
    cluster: String,
    kind: String,
}

impl KillReporter {
    /// Creates a reporter labelling records with the cluster and target kind.
    pub fn new(cluster: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            kind: kind.into(),
        }
    }

    /// Logs events until every sender is dropped.
    pub async fn drain(self, mut events: UnboundedReceiver<KillEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event);
        }
    }

    /// Logs one event.
    pub fn handle(&self, event: &KillEvent) {
        let cluster = self.cluster.as_str();
        let kind = self.kind.as_str();

        match event {
            KillEvent::RoundStarted { round } => {
                info!(cluster, kind, round, "started kill round");
            }
            KillEvent::SessionsDiscovered {
                round,
                discovered,
                elapsed,
            } => {
                info!(
                    cluster,
                    kind,
                    round,
                    discovered,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "discovered matching sessions"
                );
            }
            KillEvent::SessionKilled {
                round,
                instance,
                session_id,
                remaining,
                elapsed,
            } => {
                info!(
                    cluster,
                    kind,
                    round,
                    instance = instance.as_str(),
                    session_id,
                    remaining,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "killed session"
                );
            }
            KillEvent::RoundCompleted {
                round,
                discovered,
                killed,
                elapsed,
            } => {
                info!(
                    cluster,
                    kind,
                    round,
                    discovered,
                    killed,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "completed kill round"
                );
            }
            KillEvent::RoundAborted {
                round,
                discovered,
                killed,
                failed,
                unresolved,
                error,
            } => {
                error!(
                    cluster,
                    kind,
                    round,
                    discovered,
                    killed,
                    failed,
                    unresolved,
                    error = error.as_str(),
                    "kill round aborted"
                );
            }
            KillEvent::Stopped {
                reason,
                rounds,
                killed,
                unfinished_round,
            } => {
                if let Some(tally) = unfinished_round {
                    warn!(
                        cluster,
                        kind,
                        round = tally.round,
                        discovered = tally.discovered,
                        killed = tally.killed,
                        remaining = tally.remaining,
                        reason = %reason,
                        "kill round cut short"
                    );
                }
                warn!(
                    cluster,
                    kind,
                    rounds,
                    killed,
                    reason = %reason,
                    "kill engine stopped"
                );
            }
        }
    }
}
