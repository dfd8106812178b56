//! Replica status acquisition and the recovery action.
//!
//! The poll loop only sees two small traits: a [`StatusSource`] that produces one
//! [`StatusSnapshot`] per request, and a [`RecoveryInvoker`] that runs the
//! corrective command. [`MySqlReplica`] implements both against a live server;
//! tests substitute in-memory versions.

pub mod mysql;
mod snapshot;

pub use mysql::MySqlReplica;
pub use snapshot::{StatusSnapshot, KEY_FIELDS};

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::SourceError;

/// Supplies replica status snapshots.
///
/// # Example
///
/// ```no_run
/// use replica_doctor::{MySqlReplica, StatusSource};
///
/// # tokio_test::block_on(async {
/// let mut replica = MySqlReplica::builder()
///     .host("replica.example.com")
///     .credentials("monitor", "secret")
///     .build();
/// match replica.fetch_status().await {
///     Ok(Some(snapshot)) => println!("lag: {:?}", snapshot.seconds_behind),
///     Ok(None) => println!("replication not configured"),
///     Err(e) => println!("fetch failed: {}", e),
/// }
/// # });
/// ```
#[async_trait]
pub trait StatusSource: Send + Debug {
    /// Fetch one status snapshot.
    ///
    /// Returns `Ok(None)` when the server answered but has no replica status
    /// row (replication is not configured).
    async fn fetch_status(&mut self) -> Result<Option<StatusSnapshot>, SourceError>;

    /// Returns a human-readable description of the monitored target.
    fn description(&self) -> &str;
}

/// Executes the corrective command against the replica.
#[async_trait]
pub trait RecoveryInvoker: Send + Debug {
    /// Run the recovery action once.
    async fn invoke_recovery(&mut self) -> Result<(), SourceError>;

    /// Short label for the action, used in reports (e.g. the SQL statement).
    fn action(&self) -> &str;
}
