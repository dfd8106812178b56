//! Replica health classification.
//!
//! Health is a display concern only; it never drives the poll loop's
//! recovery decision.

use serde::Serialize;

use crate::status::StatusSnapshot;

/// Lag thresholds for health status computation.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Lag in seconds that triggers a warning.
    pub lag_warning: u64,
    /// Lag in seconds that triggers critical status.
    pub lag_critical: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lag_warning: 60,
            lag_critical: 600,
        }
    }
}

/// Health status for a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }

    /// Assess a snapshot against the thresholds.
    pub fn assess(snapshot: &StatusSnapshot, thresholds: &Thresholds) -> Self {
        let threads_down = !snapshot.io_thread_running() || !snapshot.sql_thread_running();
        let has_error = snapshot.sql_error().is_some() || snapshot.io_error().is_some();

        match snapshot.seconds_behind {
            _ if threads_down || has_error => HealthStatus::Critical,
            Some(lag) if lag >= thresholds.lag_critical => HealthStatus::Critical,
            Some(lag) if lag >= thresholds.lag_warning => HealthStatus::Warning,
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(lag: Option<u64>) -> StatusSnapshot {
        StatusSnapshot {
            io_running: Some("Yes".into()),
            sql_running: Some("Yes".into()),
            seconds_behind: lag,
            ..Default::default()
        }
    }

    #[test]
    fn test_lag_thresholds() {
        let thresholds = Thresholds::default();
        assert_eq!(HealthStatus::assess(&running(Some(0)), &thresholds), HealthStatus::Healthy);
        assert_eq!(HealthStatus::assess(&running(Some(60)), &thresholds), HealthStatus::Warning);
        assert_eq!(HealthStatus::assess(&running(Some(600)), &thresholds), HealthStatus::Critical);
        assert_eq!(HealthStatus::assess(&running(None), &thresholds), HealthStatus::Warning);
    }

    #[test]
    fn test_stopped_thread_is_critical() {
        let snapshot = StatusSnapshot {
            sql_running: Some("No".into()),
            ..running(Some(0))
        };
        assert_eq!(
            HealthStatus::assess(&snapshot, &Thresholds::default()),
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_reported_error_is_critical() {
        let snapshot = StatusSnapshot {
            last_io_error: Some("error connecting to source".into()),
            ..running(Some(1))
        };
        assert_eq!(
            HealthStatus::assess(&snapshot, &Thresholds::default()),
            HealthStatus::Critical
        );
    }
}
