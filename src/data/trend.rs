//! Replication lag trend estimation.
//!
//! [`LagTrendEstimator`] ingests successive `(lag, time)` samples and derives
//! two velocities, in seconds of lag per second of wall time:
//!
//! - the **instant** rate, from the two most recent samples only;
//! - the **average** rate, from the first sample ever observed to the current one.
//!
//! A negative rate means the replica is catching up. For a negative rate the
//! estimator projects when the lag will reach zero if the rate holds.
//!
//! One estimator tracks one replica. It is owned by the poll loop and updated
//! serially; a second target gets its own estimator.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Mutable estimator state. Lives as long as the process; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LagState {
    /// Most recently observed lag.
    pub last_seconds_behind: Option<u64>,
    /// When that sample was taken.
    pub last_check_time: Option<DateTime<Utc>>,
    /// Lag change per second over the most recent interval. Zero until there is a signal.
    pub instant_rate: f64,
    /// Projected catch-up instant from `instant_rate`; present only while it is negative.
    pub instant_eta: Option<DateTime<Utc>>,
    /// Anchor for long-term averaging, set on the first sample.
    pub start_seconds_behind: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
    /// Lag change per second since `start_time`.
    pub average_rate: f64,
}

/// Direction of a lag rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    /// No change (or no signal yet).
    Steady,
    /// Lag shrinking at the given positive speed (seconds per second).
    CatchingUp(f64),
    /// Lag growing at the given positive speed (seconds per second).
    FallingBehind(f64),
}

impl Trend {
    /// Classify a signed rate.
    pub fn from_rate(rate: f64) -> Self {
        if rate < 0.0 {
            Trend::CatchingUp(-rate)
        } else if rate > 0.0 {
            Trend::FallingBehind(rate)
        } else {
            Trend::Steady
        }
    }
}

/// Result of one estimator update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub seconds_behind: u64,
    pub observed_at: DateTime<Utc>,
    pub instant_rate: f64,
    pub instant_eta: Option<DateTime<Utc>>,
    pub average_rate: f64,
    pub average_eta: Option<DateTime<Utc>>,
}

impl TrendReport {
    /// The replica reports zero lag.
    pub fn is_caught_up(&self) -> bool {
        self.seconds_behind == 0
    }

    pub fn instant_trend(&self) -> Trend {
        Trend::from_rate(self.instant_rate)
    }

    pub fn average_trend(&self) -> Trend {
        Trend::from_rate(self.average_rate)
    }
}

/// Tracks lag samples for a single replica.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use replica_doctor::LagTrendEstimator;
///
/// let mut estimator = LagTrendEstimator::new();
/// let t0 = Utc::now();
/// estimator.update(100, t0);
/// let report = estimator.update(90, t0 + TimeDelta::seconds(10));
///
/// assert_eq!(report.instant_rate, -1.0);
/// assert_eq!(report.instant_eta, Some(t0 + TimeDelta::seconds(100)));
/// ```
#[derive(Debug, Default)]
pub struct LagTrendEstimator {
    state: LagState,
}

impl LagTrendEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, for inspection.
    pub fn state(&self) -> &LagState {
        &self.state
    }

    /// Ingest one sample and return the derived figures.
    ///
    /// `now` is expected to increase between calls. A zero or negative interval
    /// leaves the corresponding rate at its previous value.
    pub fn update(&mut self, sample: u64, now: DateTime<Utc>) -> TrendReport {
        let state = &mut self.state;

        let (start_lag, start_time) = match (state.start_seconds_behind, state.start_time) {
            (Some(lag), Some(time)) => (lag, time),
            _ => {
                state.start_seconds_behind = Some(sample);
                state.start_time = Some(now);
                (sample, now)
            }
        };

        if let (Some(last_lag), Some(last_time)) = (state.last_seconds_behind, state.last_check_time)
        {
            let interval = seconds_between(last_time, now);
            if interval > 0.0 {
                state.instant_rate = (sample as f64 - last_lag as f64) / interval;
            }
        }
        state.instant_eta = catch_up_eta(sample, state.instant_rate, now);

        let total_elapsed = seconds_between(start_time, now);
        if total_elapsed > 0.0 {
            state.average_rate = (sample as f64 - start_lag as f64) / total_elapsed;
        }
        let average_eta = if sample > 0 {
            catch_up_eta(sample, state.average_rate, now)
        } else {
            None
        };

        state.last_seconds_behind = Some(sample);
        state.last_check_time = Some(now);

        TrendReport {
            seconds_behind: sample,
            observed_at: now,
            instant_rate: state.instant_rate,
            instant_eta: state.instant_eta,
            average_rate: state.average_rate,
            average_eta,
        }
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Instant at which `lag` reaches zero at `rate`, for negative rates only.
fn catch_up_eta(lag: u64, rate: f64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if rate >= 0.0 {
        return None;
    }
    let seconds = lag as f64 / -rate;
    Some(project(now, seconds))
}

/// `now + seconds`, saturating at the largest representable instant.
fn project(now: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    let nanos = seconds * 1e9;
    if nanos.is_finite() && nanos < i64::MAX as f64 {
        if let Some(eta) = now.checked_add_signed(TimeDelta::nanoseconds(nanos as i64)) {
            return eta;
        }
    }
    DateTime::<Utc>::MAX_UTC
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + TimeDelta::seconds(secs)
    }

    #[test]
    fn test_first_sample_sets_anchor_only() {
        let mut estimator = LagTrendEstimator::new();
        let report = estimator.update(100, t0());

        assert_eq!(report.instant_rate, 0.0);
        assert_eq!(report.average_rate, 0.0);
        assert!(report.instant_eta.is_none());
        assert!(report.average_eta.is_none());
        assert_eq!(estimator.state().start_seconds_behind, Some(100));
        assert_eq!(estimator.state().start_time, Some(t0()));
    }

    #[test]
    fn test_catching_up_projects_instant_eta() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(100, t0());
        let report = estimator.update(90, at(10));

        assert_eq!(report.instant_rate, -1.0);
        assert_eq!(report.instant_eta, Some(at(100)));
        assert_eq!(report.average_rate, -1.0);
        assert_eq!(report.average_eta, Some(at(100)));
        assert_eq!(report.instant_trend(), Trend::CatchingUp(1.0));
    }

    #[test]
    fn test_flat_lag_has_no_eta() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(100, t0());
        estimator.update(100, at(10));
        let report = estimator.update(100, at(20));

        assert_eq!(report.instant_rate, 0.0);
        assert_eq!(report.average_rate, 0.0);
        assert!(report.instant_eta.is_none());
        assert!(report.average_eta.is_none());
        assert!(!report.is_caught_up());
        assert_eq!(report.average_trend(), Trend::Steady);
    }

    #[test]
    fn test_first_sample_zero_is_caught_up() {
        let mut estimator = LagTrendEstimator::new();
        let report = estimator.update(0, t0());

        assert!(report.is_caught_up());
        assert_eq!(report.average_rate, 0.0);
        assert!(report.average_eta.is_none());
        assert!(report.instant_eta.is_none());
    }

    #[test]
    fn test_falling_behind_clears_instant_eta() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(100, t0());
        let catching_up = estimator.update(80, at(10));
        assert!(catching_up.instant_eta.is_some());

        let report = estimator.update(120, at(20));
        assert_eq!(report.instant_rate, 4.0);
        assert!(report.instant_eta.is_none());
        assert!(estimator.state().instant_eta.is_none());
        assert_eq!(report.instant_trend(), Trend::FallingBehind(4.0));
    }

    #[test]
    fn test_zero_interval_keeps_previous_rate() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(100, t0());
        let before = estimator.update(90, at(10));
        let report = estimator.update(50, at(10));

        assert_eq!(report.instant_rate, before.instant_rate);
        assert!(report.instant_rate.is_finite());
        assert!(report.instant_eta.is_some());
        assert_eq!(estimator.state().last_seconds_behind, Some(50));
    }

    #[test]
    fn test_backwards_clock_keeps_previous_rate() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(100, t0());
        estimator.update(90, at(10));
        let report = estimator.update(10, at(5));

        assert_eq!(report.instant_rate, -1.0);
        assert_eq!(report.average_rate, -18.0);
    }

    #[test]
    fn test_no_average_eta_when_caught_up() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(30, t0());
        let report = estimator.update(0, at(10));

        assert!(report.is_caught_up());
        assert_eq!(report.average_rate, -3.0);
        assert!(report.average_eta.is_none());
        // The instant branch has no lag guard: catch-up is "now".
        assert_eq!(report.instant_eta, Some(at(10)));
    }

    #[test]
    fn test_average_rate_spans_whole_window() {
        let samples: [(u64, i64); 6] = [(500, 0), (480, 5), (470, 10), (490, 15), (300, 40), (310, 41)];
        let mut estimator = LagTrendEstimator::new();
        let (first_lag, first_time) = samples[0];

        for (i, &(lag, secs)) in samples.iter().enumerate() {
            let report = estimator.update(lag, at(secs));
            if i == 0 {
                continue;
            }
            let expected = (lag as f64 - first_lag as f64) / (secs - first_time) as f64;
            assert!(
                (report.average_rate - expected).abs() < 1e-9,
                "step {}: {} != {}",
                i,
                report.average_rate,
                expected
            );
        }
    }

    #[test]
    fn test_instant_eta_present_iff_rate_negative() {
        let samples: [(u64, i64); 7] = [(50, 0), (40, 2), (40, 4), (60, 6), (60, 6), (10, 9), (0, 12)];
        let mut estimator = LagTrendEstimator::new();

        for &(lag, secs) in &samples {
            let report = estimator.update(lag, at(secs));
            assert_eq!(report.instant_eta.is_some(), report.instant_rate < 0.0);
            assert_eq!(estimator.state().instant_eta, report.instant_eta);
        }
    }

    #[test]
    fn test_tiny_rate_saturates_eta() {
        let mut estimator = LagTrendEstimator::new();
        estimator.update(1_000_000_000, t0());
        let report = estimator.update(999_999_999, t0() + TimeDelta::days(365 * 100));

        assert!(report.instant_rate < 0.0);
        assert_eq!(report.instant_eta, Some(DateTime::<Utc>::MAX_UTC));
    }
}
