//! Human-readable console report.

use std::fmt::Write as _;
use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use super::Presenter;
use crate::data::duration::{format_breakdown, format_remaining};
use crate::data::{HealthStatus, Thresholds, Trend, TrendReport};
use crate::poll::{CycleResult, PollEvent, RecoveryOutcome, RecoveryReport};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR_WIDTH: usize = 50;

/// Writes a text report per event, the way an operator watches a terminal.
pub struct ConsolePresenter<W: Write + Send> {
    writer: W,
    thresholds: Thresholds,
}

impl ConsolePresenter<io::Stdout> {
    /// Report to standard output.
    pub fn stdout(thresholds: Thresholds) -> Self {
        Self::new(io::stdout(), thresholds)
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(writer: W, thresholds: Thresholds) -> Self {
        Self { writer, thresholds }
    }

    /// Consume the presenter and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn present(&mut self, event: &PollEvent) {
        let text = render_event(event, &self.thresholds);
        if let Err(e) = self.writer.write_all(text.as_bytes()).and_then(|_| self.writer.flush()) {
            debug!(error = %e, "failed to write console report");
        }
    }
}

/// Render one event as console text.
pub fn render_event(event: &PollEvent, thresholds: &Thresholds) -> String {
    match event {
        PollEvent::Cycle(result) => render_cycle(result, thresholds),
        PollEvent::NoReplicaStatus { checked_at } => {
            format!("\n[{}] No replica status found\n", local_time(checked_at))
        }
        PollEvent::FetchFailed { checked_at, error } => {
            format!(
                "\n[{}] Error executing SHOW REPLICA STATUS: {}\n",
                local_time(checked_at),
                error
            )
        }
        PollEvent::RecoveryStarted { action, .. } => {
            format!("⚠️  WARNING: SQL Error detected!\n🔄 Executing {}...\n", action)
        }
        PollEvent::Recovery(report) => render_recovery(report),
    }
}

fn render_cycle(result: &CycleResult, thresholds: &Thresholds) -> String {
    let mut out = String::new();
    let health = HealthStatus::assess(&result.snapshot, thresholds);

    let _ = writeln!(
        out,
        "\n[{}] Replica Status ({}):",
        local_time(&result.checked_at),
        health.symbol()
    );
    let _ = writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH));

    for (name, value) in result.snapshot.fields() {
        if name == "Seconds_Behind_Source" {
            if let Some(ref report) = result.trend {
                render_lag(&mut out, name, report);
                continue;
            }
        }
        let _ = writeln!(out, "{}: {}", name, value.as_deref().unwrap_or("NULL"));
    }
    out.push('\n');

    if let Some(ref pattern) = result.matched_pattern {
        let _ = writeln!(out, "🚨 Pattern '{}' found in Last_SQL_Error!", pattern);
    }
    out
}

fn render_lag(out: &mut String, name: &str, report: &TrendReport) {
    if report.is_caught_up() {
        let _ = writeln!(out, "{}: 0s (caught up!)", name);
    } else {
        let _ = writeln!(out, "{}: {}", name, format_breakdown(report.seconds_behind));
    }

    let _ = writeln!(out, "📊 Replication Performance:");

    match report.instant_trend() {
        Trend::CatchingUp(speed) => {
            let _ = writeln!(out, "  🚀 Instant: Catching up at {:.2} seconds/second", speed);
            if let Some(eta) = report.instant_eta {
                render_eta(out, "Instant", report.observed_at, eta);
            }
        }
        Trend::FallingBehind(speed) => {
            let _ = writeln!(out, "  ⚠️  Instant: Falling behind at {:.2} seconds/second", speed);
        }
        Trend::Steady => {}
    }

    match report.average_trend() {
        Trend::CatchingUp(speed) => {
            let _ = writeln!(out, "  📈 Average: Catching up at {:.2} seconds/second", speed);
            if let Some(eta) = report.average_eta {
                render_eta(out, "Average", report.observed_at, eta);
            }
        }
        Trend::FallingBehind(speed) => {
            let _ = writeln!(out, "  ⚠️  Average: Falling behind at {:.2} seconds/second", speed);
        }
        Trend::Steady => {}
    }
}

fn render_eta(out: &mut String, label: &str, now: DateTime<Utc>, eta: DateTime<Utc>) {
    let _ = writeln!(
        out,
        "  ⏰ {} ETA: {} ({})",
        label,
        format_remaining(eta - now),
        local_time(&eta)
    );
}

fn render_recovery(report: &RecoveryReport) -> String {
    match report.outcome {
        RecoveryOutcome::Succeeded => format!("✅ Successfully executed {}\n", report.action),
        RecoveryOutcome::Failed { ref error } => {
            format!("❌ Error executing {}: {}\n", report.action, error)
        }
    }
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LagTrendEstimator;
    use crate::status::StatusSnapshot;
    use chrono::TimeDelta;

    fn snapshot(lag: Option<u64>, sql_error: Option<&str>) -> StatusSnapshot {
        StatusSnapshot {
            io_state: Some("Waiting for source to send event".into()),
            source_host: Some("primary.internal".into()),
            source_port: Some("3306".into()),
            io_running: Some("Yes".into()),
            sql_running: Some("Yes".into()),
            do_db: Some(String::new()),
            last_sql_error: sql_error.map(str::to_string),
            seconds_behind: lag,
            ..Default::default()
        }
    }

    fn cycle(lag: Option<u64>, trend: Option<TrendReport>) -> PollEvent {
        PollEvent::Cycle(CycleResult {
            checked_at: Utc::now(),
            snapshot: snapshot(lag, None),
            trend,
            matched_pattern: None,
        })
    }

    #[test]
    fn test_renders_fields_and_nulls() {
        let text = render_event(&cycle(None, None), &Thresholds::default());

        assert!(text.contains("Replica Status (WARN):"));
        assert!(text.contains(&"=".repeat(50)));
        assert!(text.contains("Source_Host: primary.internal\n"));
        assert!(text.contains("Replicate_Do_DB: \n"));
        assert!(text.contains("Last_IO_Error: NULL\n"));
        assert!(text.contains("Seconds_Behind_Source: NULL\n"));
        assert!(!text.contains("Replication Performance"));
    }

    #[test]
    fn test_renders_unparsed_lag_as_received() {
        let event = PollEvent::Cycle(CycleResult {
            checked_at: Utc::now(),
            snapshot: StatusSnapshot {
                seconds_behind_raw: Some("soon".into()),
                ..snapshot(None, None)
            },
            trend: None,
            matched_pattern: None,
        });
        let text = render_event(&event, &Thresholds::default());
        assert!(text.contains("Seconds_Behind_Source: soon\n"));
    }

    #[test]
    fn test_renders_catch_up_estimates() {
        let mut estimator = LagTrendEstimator::new();
        let t0 = Utc::now();
        estimator.update(100, t0);
        let report = estimator.update(90, t0 + TimeDelta::seconds(10));

        let text = render_event(&cycle(Some(90), Some(report)), &Thresholds::default());

        assert!(text.contains("Seconds_Behind_Source: 1m 30s\n"));
        assert!(text.contains("📊 Replication Performance:"));
        assert!(text.contains("🚀 Instant: Catching up at 1.00 seconds/second"));
        assert!(text.contains("⏰ Instant ETA: 1m 30s ("));
        assert!(text.contains("📈 Average: Catching up at 1.00 seconds/second"));
        assert!(text.contains("⏰ Average ETA: 1m 30s ("));
    }

    #[test]
    fn test_renders_caught_up_and_falling_behind() {
        let mut estimator = LagTrendEstimator::new();
        let t0 = Utc::now();
        let first = estimator.update(0, t0);
        let text = render_event(&cycle(Some(0), Some(first)), &Thresholds::default());
        assert!(text.contains("Seconds_Behind_Source: 0s (caught up!)"));
        assert!(!text.contains("Instant:"));

        let report = estimator.update(20, t0 + TimeDelta::seconds(10));
        let text = render_event(&cycle(Some(20), Some(report)), &Thresholds::default());
        assert!(text.contains("⚠️  Instant: Falling behind at 2.00 seconds/second"));
        assert!(text.contains("⚠️  Average: Falling behind at 2.00 seconds/second"));
        assert!(!text.contains("ETA"));
    }

    #[test]
    fn test_renders_match_and_recovery() {
        let event = PollEvent::Cycle(CycleResult {
            checked_at: Utc::now(),
            snapshot: snapshot(None, Some("Coordinator stopped because of worker errors")),
            trend: None,
            matched_pattern: Some("Coordinator stopped".into()),
        });
        let text = render_event(&event, &Thresholds::default());
        assert!(text.contains("Replica Status (CRIT):"));
        assert!(text.contains("🚨 Pattern 'Coordinator stopped' found in Last_SQL_Error!"));

        let ok = PollEvent::Recovery(RecoveryReport {
            attempted_at: Utc::now(),
            action: "CALL mysql.rds_skip_repl_error;".into(),
            outcome: RecoveryOutcome::Succeeded,
        });
        assert_eq!(
            render_event(&ok, &Thresholds::default()),
            "✅ Successfully executed CALL mysql.rds_skip_repl_error;\n"
        );

        let failed = PollEvent::Recovery(RecoveryReport {
            attempted_at: Utc::now(),
            action: "CALL mysql.rds_skip_repl_error;".into(),
            outcome: RecoveryOutcome::Failed {
                error: "Request timed out".into(),
            },
        });
        assert!(render_event(&failed, &Thresholds::default()).starts_with("❌ Error executing"));
    }

    #[test]
    fn test_presenter_writes_to_writer() {
        let mut presenter = ConsolePresenter::new(Vec::new(), Thresholds::default());
        presenter.present(&PollEvent::NoReplicaStatus {
            checked_at: Utc::now(),
        });
        let written = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(written.ends_with("No replica status found\n"));
    }
}
