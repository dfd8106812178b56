//! Data processing for replica status snapshots.
//!
//! This module turns raw status snapshots into the figures the poll loop and
//! the presenters work with.
//!
//! ## Submodules
//!
//! - [`trend`]: Lag trend estimation ([`LagTrendEstimator`], [`TrendReport`])
//! - [`matcher`]: Fatal error detection on `Last_SQL_Error` ([`ErrorMatcher`])
//! - [`health`]: Health classification ([`HealthStatus`], [`Thresholds`])
//! - [`history`]: Bounded lag history for sparklines
//! - [`duration`]: Parsing of interval strings and d/h/m/s formatting
//!
//! ## Data Flow
//!
//! ```text
//! StatusSnapshot
//!        │
//!        ├──▶ LagTrendEstimator::update() ──▶ TrendReport
//!        │
//!        ├──▶ ErrorMatcher::first_match() ──▶ matched pattern?
//!        │
//!        └──▶ HealthStatus::assess() (display only)
//! ```

pub mod duration;
pub mod health;
pub mod history;
pub mod matcher;
pub mod trend;

pub use health::{HealthStatus, Thresholds};
pub use history::LagHistory;
pub use matcher::{ErrorMatcher, DEFAULT_ERROR_PATTERNS};
pub use trend::{LagState, LagTrendEstimator, Trend, TrendReport};
