//! # replica-doctor
//!
//! A monitor for MySQL replication that estimates how fast a replica is
//! catching up and clears known fatal SQL errors on its own.
//!
//! Every few seconds the monitor reads `SHOW REPLICA STATUS`, reports the key
//! fields, derives an instant and a long-term catch-up rate from
//! `Seconds_Behind_Source`, and checks `Last_SQL_Error` against a list of
//! patterns. When a pattern matches it runs a recovery statement
//! (`CALL mysql.rds_skip_repl_error;` by default) and polls again at once.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           PollLoop                           │
//! │                                                              │
//! │  StatusSource ──▶ LagTrendEstimator ──▶ ErrorMatcher ──┐     │
//! │  (MySqlReplica)                                        │     │
//! │        ▲                                               ▼     │
//! │        └──── RecoveryInvoker ◀── match ──────────  Presenter │
//! └────────────────────────────────────────────────────────┬─────┘
//!                                                          │
//!              ConsolePresenter | JsonPresenter | ChannelPresenter ──▶ dashboard (app, ui)
//! ```
//!
//! - **[`status`]**: the [`StatusSource`] and [`RecoveryInvoker`] traits, the typed
//!   [`StatusSnapshot`], and the `mysql_async` implementation [`MySqlReplica`]
//! - **[`data`]**: lag trend estimation, error pattern matching, health and history
//! - **[`poll`]**: the [`PollLoop`] control loop and the [`PollEvent`]s it reports
//! - **[`present`]**: console, JSON-lines and channel presenters
//! - **[`config`]**: layered configuration and validation
//! - **[`app`]**, **[`ui`]**, **[`events`]**: the interactive terminal dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! replica-doctor --host replica-1.example.com --user monitor --password secret
//!
//! # Interactive dashboard
//! replica-doctor --host replica-1 --user monitor --password secret --tui
//!
//! # JSON lines, extra pattern
//! replica-doctor --host replica-1 --user monitor --password secret \
//!     --json --pattern "Error_code: 1062"
//! ```
//!
//! ### Estimating lag trends
//!
//! ```
//! use chrono::{TimeDelta, Utc};
//! use replica_doctor::LagTrendEstimator;
//!
//! let mut estimator = LagTrendEstimator::new();
//! let t0 = Utc::now();
//! estimator.update(120, t0);
//! let report = estimator.update(100, t0 + TimeDelta::seconds(10));
//! assert_eq!(report.instant_rate, -2.0);
//! ```
//!
//! ### Running the loop against a replica
//!
//! ```no_run
//! use replica_doctor::{ChannelPresenter, MySqlReplica, PollLoop};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let replica = MySqlReplica::builder()
//!     .host("replica-1.example.com")
//!     .credentials("monitor", "secret")
//!     .build();
//! let (presenter, mut events) = ChannelPresenter::create();
//!
//! let mut poll_loop = PollLoop::new(
//!     Box::new(replica.clone()),
//!     Box::new(replica),
//!     Box::new(presenter),
//! );
//! let shutdown = CancellationToken::new();
//! tokio::spawn(async move { poll_loop.run(shutdown).await });
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod poll;
pub mod present;
pub mod status;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::MonitorConfig;
pub use data::{
    ErrorMatcher, HealthStatus, LagHistory, LagTrendEstimator, Thresholds, Trend, TrendReport,
};
pub use error::SourceError;
pub use poll::{CycleResult, PollEvent, PollLoop, PollStats, RecoveryOutcome, Transition};
pub use present::{ChannelPresenter, ConsolePresenter, JsonPresenter, Presenter};
pub use status::{MySqlReplica, RecoveryInvoker, StatusSnapshot, StatusSource};
