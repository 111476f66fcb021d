//! Cluster-wide session termination.
//!
//! The engine repeatedly discovers live sessions matching a set of statement
//! digests or usernames and kills them with bounded parallelism, until a
//! deadline passes, the operator interrupts, or a round fails.

mod engine;
pub mod query;
mod report;

pub use engine::KillEngine;
pub use report::{KillEvent, KillReporter};

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionRegistry;
use crate::error::{ConsoleError, Result};

/// Which sessions to terminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillTarget {
    /// Sessions whose current statement has one of these digests.
    Digests(Vec<String>),
    /// Sessions logged in as one of these users.
    Usernames(Vec<String>),
}

impl KillTarget {
    /// Short label used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Digests(_) => "digest",
            Self::Usernames(_) => "user",
        }
    }

    fn values(&self) -> &[String] {
        match self {
            Self::Digests(values) | Self::Usernames(values) => values,
        }
    }
}

/// Tuning of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillOptions {
    /// Overall bound; `None` polls until interrupted.
    pub duration: Option<Duration>,
    /// Sleep between rounds.
    pub interval: Duration,
    /// Maximum kills in flight at once.
    pub concurrency: usize,
}

impl KillOptions {
    /// Builds options from operator units. A duration of 0 means unbounded.
    pub fn new(duration_secs: u64, interval_millis: u64, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(ConsoleError::command("concurrency must be at least 1"));
        }
        Ok(Self {
            duration: (duration_secs > 0).then(|| Duration::from_secs(duration_secs)),
            interval: Duration::from_millis(interval_millis),
            concurrency,
        })
    }
}

/// A live session discovered in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSession {
    /// Address of the instance owning the session.
    pub instance: String,
    /// Cluster-wide session id.
    pub session_id: u64,
}

/// Bookkeeping of one round.
///
/// `remaining` starts at `discovered` and drops by one per successful kill,
/// so it never exceeds `discovered`.
#[derive(Debug)]
pub struct KillRound {
    pub round: u64,
    pub discovered: usize,
    remaining: AtomicUsize,
}

impl KillRound {
    pub fn new(round: u64, discovered: usize) -> Self {
        Self {
            round,
            discovered,
            remaining: AtomicUsize::new(discovered),
        }
    }

    /// Records one successful kill and returns the sessions still remaining.
    pub fn complete_one(&self) -> usize {
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn killed(&self) -> usize {
        self.discovered - self.remaining()
    }

    /// Counts of the round as of now.
    pub fn tally(&self) -> RoundTally {
        let remaining = self.remaining();
        RoundTally {
            round: self.round,
            discovered: self.discovered,
            killed: self.discovered - remaining,
            remaining,
        }
    }
}

/// Point-in-time counts of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTally {
    pub round: u64,
    pub discovered: usize,
    pub killed: usize,
    pub remaining: usize,
}

/// Why an engine run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The duration bound elapsed.
    DeadlineExceeded,
    /// The operator or the caller cancelled the run.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Outcome of an engine run that stopped cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillSummary {
    /// Rounds started.
    pub rounds: u64,
    /// Sessions killed across all rounds.
    pub killed: usize,
    pub stop: StopReason,
    /// The round that was still killing when the run stopped.
    pub unfinished_round: Option<RoundTally>,
}

/// Kills sessions whose current statement matches one of `fingerprints`.
pub async fn kill_by_fingerprint(
    cancel: &CancellationToken,
    registry: &ConnectionRegistry,
    cluster: &str,
    fingerprints: &[String],
    duration_secs: u64,
    interval_millis: u64,
    concurrency: usize,
) -> Result<KillSummary> {
    let target = KillTarget::Digests(fingerprints.to_vec());
    let options = KillOptions::new(duration_secs, interval_millis, concurrency)?;
    run(cancel, registry, cluster, target, options).await
}

/// Kills sessions logged in as one of `usernames`.
pub async fn kill_by_username(
    cancel: &CancellationToken,
    registry: &ConnectionRegistry,
    cluster: &str,
    usernames: &[String],
    duration_secs: u64,
    interval_millis: u64,
    concurrency: usize,
) -> Result<KillSummary> {
    let target = KillTarget::Usernames(usernames.to_vec());
    let options = KillOptions::new(duration_secs, interval_millis, concurrency)?;
    run(cancel, registry, cluster, target, options).await
}

async fn run(
    cancel: &CancellationToken,
    registry: &ConnectionRegistry,
    cluster: &str,
    target: KillTarget,
    options: KillOptions,
) -> Result<KillSummary> {
    if target.values().iter().all(|v| v.trim().is_empty()) {
        return Err(ConsoleError::command(format!(
            "at least one {} is required",
            target.kind()
        )));
    }

    let executor = registry.get_connection(cluster).await?;
    let reporter = KillReporter::new(cluster, target.kind());
    let engine = KillEngine::new(cluster, executor, target, options);

    let (tx, rx) = mpsc::unbounded_channel();
    let (result, ()) = tokio::join!(engine.run(cancel.clone(), tx), reporter.drain(rx));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_zero_duration_is_unbounded() {
        let options = KillOptions::new(0, 500, 4).unwrap();
        assert_eq!(options.duration, None);
        assert_eq!(options.interval, Duration::from_millis(500));

        let options = KillOptions::new(5, 500, 4).unwrap();
        assert_eq!(options.duration, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_options_reject_zero_concurrency() {
        assert!(KillOptions::new(0, 500, 0).is_err());
    }

    #[test]
    fn test_round_counter_never_underflows() {
        let round = KillRound::new(0, 2);
        assert_eq!(round.complete_one(), 1);
        assert_eq!(round.complete_one(), 0);
        assert_eq!(round.complete_one(), 0);
        assert_eq!(round.killed(), 2);
    }

    #[test]
    fn test_round_tally() {
        let round = KillRound::new(3, 5);
        round.complete_one();
        round.complete_one();
        assert_eq!(
            round.tally(),
            RoundTally {
                round: 3,
                discovered: 5,
                killed: 2,
                remaining: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_predicate_is_rejected() {
        let registry = ConnectionRegistry::new(Default::default());
        let err = kill_by_username(
            &CancellationToken::new(),
            &registry,
            "prod",
            &[String::new()],
            0,
            500,
            4,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConsoleError::Command(_)));
    }
}
