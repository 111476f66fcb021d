//! Round-based kill loop.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::query::{check_global_kill, discovery_sql, kill_sql, parse_sessions};
use super::{
    KillEvent, KillOptions, KillRound, KillSummary, KillTarget, RoundTally, StopReason,
    TargetSession,
};
use crate::db::SqlExecutor;
use crate::error::{ConsoleError, Result};

/// Totals shared between the round loop and the stop summary.
///
/// `killed` grows with every successful kill, so a run stopped in the middle
/// of a round still counts the kills that round finished.
#[derive(Debug, Default)]
struct Progress {
    rounds: AtomicU64,
    killed: AtomicUsize,
    /// The round currently killing, if any.
    current: Mutex<Option<Arc<KillRound>>>,
}

impl Progress {
    fn set_current(&self, round: Option<Arc<KillRound>>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = round;
    }

    fn current_tally(&self) -> Option<RoundTally> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|round| round.tally())
    }
}

/// Runs kill rounds against one cluster.
pub struct KillEngine {
    cluster: String,
    executor: Arc<dyn SqlExecutor>,
    target: KillTarget,
    options: KillOptions,
}

impl KillEngine {
    pub fn new(
        cluster: impl Into<String>,
        executor: Arc<dyn SqlExecutor>,
        target: KillTarget,
        options: KillOptions,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            executor,
            target,
            options,
        }
    }

    /// Runs until the deadline, cancellation of `cancel`, or a round error.
    ///
    /// Deadline and cancellation return a summary; a failed capability
    /// check, discovery or kill returns the error. Events go to `events`
    /// and the sender is dropped when the run ends.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        events: UnboundedSender<KillEvent>,
    ) -> Result<KillSummary> {
        let progress = Progress::default();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(self.stop(StopReason::Interrupted, &progress, &events));
            }
            checked = check_global_kill(self.executor.as_ref(), &self.cluster) => checked?,
        }

        let deadline = self.options.duration.map(|d| Instant::now() + d);
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        let reason = tokio::select! {
            biased;
            _ = cancel.cancelled() => StopReason::Interrupted,
            _ = expired => StopReason::DeadlineExceeded,
            err = self.rounds(&cancel, &progress, &events) => return Err(err),
        };

        Ok(self.stop(reason, &progress, &events))
    }

    fn stop(
        &self,
        reason: StopReason,
        progress: &Progress,
        events: &UnboundedSender<KillEvent>,
    ) -> KillSummary {
        let summary = KillSummary {
            rounds: progress.rounds.load(Ordering::SeqCst),
            killed: progress.killed.load(Ordering::SeqCst),
            stop: reason,
            unfinished_round: progress.current_tally(),
        };
        let _ = events.send(KillEvent::Stopped {
            reason,
            rounds: summary.rounds,
            killed: summary.killed,
            unfinished_round: summary.unfinished_round,
        });
        summary
    }

    /// Loops over rounds; only returns with the error that ended them.
    async fn rounds(
        &self,
        cancel: &CancellationToken,
        progress: &Progress,
        events: &UnboundedSender<KillEvent>,
    ) -> ConsoleError {
        let discovery = discovery_sql(&self.target);
        let mut round = 0u64;

        loop {
            progress.rounds.store(round + 1, Ordering::SeqCst);
            let _ = events.send(KillEvent::RoundStarted { round });
            let started = Instant::now();

            let sessions = match self.executor.query(&discovery).await {
                Ok(result) => parse_sessions(&result),
                Err(e) => {
                    let error = format!("discovery failed in round {round}: {e}");
                    let _ = events.send(KillEvent::RoundAborted {
                        round,
                        discovered: 0,
                        killed: 0,
                        failed: 0,
                        unresolved: 0,
                        error: error.clone(),
                    });
                    return ConsoleError::kill(error);
                }
            };

            let _ = events.send(KillEvent::SessionsDiscovered {
                round,
                discovered: sessions.len(),
                elapsed: started.elapsed(),
            });

            if !sessions.is_empty() {
                let state = Arc::new(KillRound::new(round, sessions.len()));
                progress.set_current(Some(Arc::clone(&state)));
                let outcome = self
                    .kill_all(cancel, &state, sessions, progress, events)
                    .await;
                progress.set_current(None);

                if let Err(e) = outcome {
                    let killed = state.killed();
                    let unresolved = state.remaining().saturating_sub(1);
                    let _ = events.send(KillEvent::RoundAborted {
                        round,
                        discovered: state.discovered,
                        killed,
                        failed: 1,
                        unresolved,
                        error: e.clone(),
                    });
                    return ConsoleError::kill(format!(
                        "round {round} aborted: {e} (discovered {}, killed {killed}, \
                         failed 1, unresolved {unresolved})",
                        state.discovered
                    ));
                }

                let _ = events.send(KillEvent::RoundCompleted {
                    round,
                    discovered: state.discovered,
                    killed: state.killed(),
                    elapsed: started.elapsed(),
                });
            }

            debug!("Sleeping {:?} before round {}", self.options.interval, round + 1);
            tokio::time::sleep(self.options.interval).await;
            round += 1;
        }
    }

    /// Kills every session of a round with at most `concurrency` in flight.
    ///
    /// The first failure cancels the round token and drops the other
    /// in-flight kills.
    async fn kill_all(
        &self,
        cancel: &CancellationToken,
        state: &Arc<KillRound>,
        sessions: Vec<TargetSession>,
        progress: &Progress,
        events: &UnboundedSender<KillEvent>,
    ) -> std::result::Result<(), String> {
        let round_token = cancel.child_token();

        let result = stream::iter(sessions)
            .map(Ok::<_, String>)
            .try_for_each_concurrent(self.options.concurrency, |session| {
                let executor = Arc::clone(&self.executor);
                let state = Arc::clone(state);
                let token = round_token.clone();
                let events = events.clone();
                let progress = progress;
                async move {
                    let started = Instant::now();
                    let statement = kill_sql(&session);
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            return Err(format!(
                                "kill of session {} cancelled",
                                session.session_id
                            ));
                        }
                        killed = executor.execute(&statement) => killed.map_err(|e| {
                            format!(
                                "failed to kill session {} on {}: {e}",
                                session.session_id, session.instance
                            )
                        })?,
                    }

                    let remaining = state.complete_one();
                    progress.killed.fetch_add(1, Ordering::SeqCst);
                    let _ = events.send(KillEvent::SessionKilled {
                        round: state.round,
                        instance: session.instance,
                        session_id: session.session_id,
                        remaining,
                        elapsed: started.elapsed(),
                    });
                    Ok(())
                }
            })
            .await;

        if result.is_err() {
            round_token.cancel();
        }
        result
    }
}
