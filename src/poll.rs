//! The poll / detect / react control loop.
//!
//! One cycle: fetch a [`StatusSnapshot`], feed the lag through the
//! [`LagTrendEstimator`], test `Last_SQL_Error` with the [`ErrorMatcher`],
//! hand the result to the [`Presenter`], then either sleep for the polling
//! interval or, when an error pattern matched, run the recovery action and
//! poll again straight away.
//!
//! ```text
//!            ┌──────────── interval elapsed ────────────┐
//!            ▼                                          │
//!   Idle ─▶ Polling ─▶ Reporting ─┬─ no match ─────▶ Sleeping
//!            ▲                    │
//!            │                    └─ match ─▶ Recovering
//!            └────────────── immediately ────────┘
//! ```
//!
//! There is no retry cap and no backoff after a recovery: a persistent error is
//! hit with the recovery action once per cycle until it clears.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::data::{ErrorMatcher, LagTrendEstimator, TrendReport};
use crate::present::Presenter;
use crate::status::{RecoveryInvoker, StatusSnapshot, StatusSource};

/// Default time between polls when no error was detected.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Everything one successful poll produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleResult {
    pub checked_at: DateTime<Utc>,
    pub snapshot: StatusSnapshot,
    /// Present when the snapshot carried a lag value.
    pub trend: Option<TrendReport>,
    /// The first error pattern that matched `Last_SQL_Error`.
    pub matched_pattern: Option<String>,
}

impl CycleResult {
    pub fn matched(&self) -> bool {
        self.matched_pattern.is_some()
    }
}

/// Outcome of a recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    Succeeded,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub attempted_at: DateTime<Utc>,
    /// The action that was run (e.g. the SQL statement).
    pub action: String,
    pub outcome: RecoveryOutcome,
}

/// What the loop reports to its presenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    /// A recovery action is about to run for the given pattern.
    RecoveryStarted { pattern: String, action: String },
    Cycle(CycleResult),
    /// The server answered but has no replica status row.
    NoReplicaStatus { checked_at: DateTime<Utc> },
    /// The status could not be fetched.
    FetchFailed {
        checked_at: DateTime<Utc>,
        error: String,
    },
    Recovery(RecoveryReport),
}

/// What the loop does after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Wait the polling interval before the next fetch.
    Sleep,
    /// A recovery ran; fetch again with no delay.
    PollImmediately,
}

/// Counters over the lifetime of a loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub empty_status: u64,
    pub matches: u64,
    pub recoveries_succeeded: u64,
    pub recoveries_failed: u64,
}

/// Drives the monitoring of one replica.
///
/// Owns the only [`LagTrendEstimator`] for its target. Cycles never overlap.
pub struct PollLoop {
    source: Box<dyn StatusSource>,
    recovery: Box<dyn RecoveryInvoker>,
    presenter: Box<dyn Presenter>,
    estimator: LagTrendEstimator,
    matcher: ErrorMatcher,
    interval: Duration,
    stats: PollStats,
}

impl PollLoop {
    /// Create a loop with the default error patterns and a 5 second interval.
    pub fn new(
        source: Box<dyn StatusSource>,
        recovery: Box<dyn RecoveryInvoker>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            source,
            recovery,
            presenter,
            estimator: LagTrendEstimator::new(),
            matcher: ErrorMatcher::default(),
            interval: DEFAULT_INTERVAL,
            stats: PollStats::default(),
        }
    }

    /// Use the given error patterns.
    pub fn with_matcher(mut self, matcher: ErrorMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Set the time between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn estimator(&self) -> &LagTrendEstimator {
        &self.estimator
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Run one cycle: fetch, estimate, match, report, and recover if needed.
    pub async fn poll_once(&mut self) -> Transition {
        let checked_at = Utc::now();
        self.stats.cycles += 1;

        let snapshot = match self.source.fetch_status().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                warn!(target_replica = %self.source.description(), "no replica status found");
                self.stats.empty_status += 1;
                self.presenter.present(&PollEvent::NoReplicaStatus { checked_at });
                return Transition::Sleep;
            }
            Err(e) => {
                warn!(target_replica = %self.source.description(), error = %e, "failed to fetch replica status");
                self.stats.fetch_failures += 1;
                self.presenter.present(&PollEvent::FetchFailed {
                    checked_at,
                    error: e.to_string(),
                });
                return Transition::Sleep;
            }
        };

        let trend = snapshot.seconds_behind.map(|lag| self.estimator.update(lag, checked_at));
        let matched_pattern = self
            .matcher
            .first_match(snapshot.last_sql_error.as_deref())
            .map(str::to_owned);

        if let Some(ref report) = trend {
            debug!(
                seconds_behind = report.seconds_behind,
                instant_rate = report.instant_rate,
                average_rate = report.average_rate,
                "lag updated"
            );
        }

        let matched = matched_pattern.clone();
        self.presenter.present(&PollEvent::Cycle(CycleResult {
            checked_at,
            snapshot,
            trend,
            matched_pattern,
        }));

        let Some(pattern) = matched else {
            return Transition::Sleep;
        };

        self.stats.matches += 1;
        warn!(%pattern, "error pattern found in Last_SQL_Error");
        self.recover(pattern).await;
        Transition::PollImmediately
    }

    async fn recover(&mut self, pattern: String) {
        let action = self.recovery.action().to_string();
        self.presenter.present(&PollEvent::RecoveryStarted {
            pattern,
            action: action.clone(),
        });

        let attempted_at = Utc::now();
        let outcome = match self.recovery.invoke_recovery().await {
            Ok(()) => {
                info!(%action, "recovery action succeeded");
                self.stats.recoveries_succeeded += 1;
                RecoveryOutcome::Succeeded
            }
            Err(e) => {
                error!(%action, error = %e, "recovery action failed");
                self.stats.recoveries_failed += 1;
                RecoveryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        self.presenter.present(&PollEvent::Recovery(RecoveryReport {
            attempted_at,
            action,
            outcome,
        }));
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// Only the inter-cycle sleep observes the token; a cycle in progress runs
    /// to completion first.
    pub async fn run(&mut self, shutdown: CancellationToken) -> PollStats {
        info!(
            target_replica = %self.source.description(),
            interval = ?self.interval,
            "starting replica status monitoring"
        );

        while !shutdown.is_cancelled() {
            match self.poll_once().await {
                Transition::PollImmediately => continue,
                Transition::Sleep => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.interval) => {}
                    }
                }
            }
        }

        info!(cycles = self.stats.cycles, "replica monitoring stopped");
        self.stats
    }
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("source", &self.source)
            .field("recovery", &self.recovery)
            .field("interval", &self.interval)
            .field("stats", &self.stats)
            .finish()
    }
}
