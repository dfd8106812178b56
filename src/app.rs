//! Dashboard state and navigation logic.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::data::duration::format_breakdown;
use crate::data::{HealthStatus, LagHistory, Thresholds};
use crate::poll::{CycleResult, PollEvent, RecoveryOutcome};
use crate::ui::Theme;

/// Maximum number of entries kept in the event log.
const MAX_LOG_ENTRIES: usize = 200;

/// How long a status bar message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Latest status fields, lag trend and sparkline.
    Status,
    /// Log of matches, recoveries, fetch failures and health changes.
    Events,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Status => View::Events,
            View::Events => View::Status,
        }
    }

    // Two views, so previous and next coincide.
    pub fn prev(self) -> Self {
        self.next()
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Status => "Status",
            View::Events => "Events",
        }
    }
}

/// One line in the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub severity: HealthStatus,
    pub message: String,
}

/// Main dashboard state.
///
/// Fed by the poll loop through the receiving end of a
/// [`ChannelPresenter`](crate::ChannelPresenter).
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    events: mpsc::UnboundedReceiver<PollEvent>,
    /// `host:port` of the monitored replica.
    pub target: String,
    pub thresholds: Thresholds,

    pub latest: Option<CycleResult>,
    pub history: LagHistory,
    /// Set when the last poll produced no usable snapshot.
    pub load_error: Option<String>,
    pub last_update: Option<Instant>,
    /// The poll loop has gone away.
    pub disconnected: bool,

    /// Newest entry first.
    pub log: VecDeque<LogEntry>,
    pub log_scroll: usize,
    pub recoveries_succeeded: u64,
    pub recoveries_failed: u64,

    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the dashboard state with an auto-detected theme.
    pub fn new(
        events: mpsc::UnboundedReceiver<PollEvent>,
        target: impl Into<String>,
        thresholds: Thresholds,
    ) -> Self {
        Self::with_theme(events, target, thresholds, Theme::auto_detect())
    }

    pub fn with_theme(
        events: mpsc::UnboundedReceiver<PollEvent>,
        target: impl Into<String>,
        thresholds: Thresholds,
        theme: Theme,
    ) -> Self {
        Self {
            running: true,
            current_view: View::Status,
            show_help: false,
            events,
            target: target.into(),
            thresholds,
            latest: None,
            history: LagHistory::new(),
            load_error: None,
            last_update: None,
            disconnected: false,
            log: VecDeque::new(),
            log_scroll: 0,
            recoveries_succeeded: 0,
            recoveries_failed: 0,
            theme,
            status_message: None,
        }
    }

    /// Apply every event waiting on the channel. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(&event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        self.disconnected = true;
                        self.push_log(Utc::now(), HealthStatus::Critical, "Poll loop stopped");
                    }
                    break;
                }
            }
        }
        applied
    }

    /// Fold one poll event into the dashboard state.
    pub fn apply(&mut self, event: &PollEvent) {
        match event {
            PollEvent::Cycle(result) => self.apply_cycle(result),
            PollEvent::NoReplicaStatus { checked_at } => {
                self.last_update = Some(Instant::now());
                if self.load_error.is_none() {
                    self.push_log(*checked_at, HealthStatus::Warning, "No replica status found");
                }
                self.load_error = Some("No replica status found".to_string());
            }
            PollEvent::FetchFailed { checked_at, error } => {
                self.last_update = Some(Instant::now());
                self.push_log(
                    *checked_at,
                    HealthStatus::Critical,
                    format!("Error executing SHOW REPLICA STATUS: {}", error),
                );
                self.load_error = Some(error.clone());
            }
            PollEvent::RecoveryStarted { pattern, action } => {
                self.push_log(
                    Utc::now(),
                    HealthStatus::Warning,
                    format!("Pattern '{}' matched, executing {}", pattern, action),
                );
            }
            PollEvent::Recovery(report) => match report.outcome {
                RecoveryOutcome::Succeeded => {
                    self.recoveries_succeeded += 1;
                    self.push_log(
                        report.attempted_at,
                        HealthStatus::Healthy,
                        format!("Successfully executed {}", report.action),
                    );
                }
                RecoveryOutcome::Failed { ref error } => {
                    self.recoveries_failed += 1;
                    self.push_log(
                        report.attempted_at,
                        HealthStatus::Critical,
                        format!("Error executing {}: {}", report.action, error),
                    );
                }
            },
        }
    }

    fn apply_cycle(&mut self, result: &CycleResult) {
        let previous = self.health();
        let current = HealthStatus::assess(&result.snapshot, &self.thresholds);

        if self.load_error.take().is_some() {
            self.push_log(result.checked_at, current, "Replica status available again");
        } else if previous.is_some_and(|p| p != current) {
            let lag = result
                .snapshot
                .seconds_behind
                .map(format_breakdown)
                .unwrap_or_else(|| "NULL".to_string());
            self.push_log(
                result.checked_at,
                current,
                format!("Health changed to {} (lag {})", current.symbol(), lag),
            );
        }

        if let Some(lag) = result.snapshot.seconds_behind {
            self.history.record(result.checked_at, lag);
        }
        self.latest = Some(result.clone());
        self.last_update = Some(Instant::now());
    }

    fn push_log(&mut self, at: DateTime<Utc>, severity: HealthStatus, message: impl Into<String>) {
        self.log.push_front(LogEntry {
            at,
            severity,
            message: message.into(),
        });
        self.log.truncate(MAX_LOG_ENTRIES);
        // Keep the viewport on the same entries when scrolled back.
        if self.log_scroll > 0 {
            self.log_scroll = (self.log_scroll + 1).min(self.log.len().saturating_sub(1));
        }
    }

    /// Health of the latest snapshot, if any.
    pub fn health(&self) -> Option<HealthStatus> {
        self.latest
            .as_ref()
            .map(|result| HealthStatus::assess(&result.snapshot, &self.thresholds))
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// The current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Scroll the event log towards older entries.
    pub fn scroll_down(&mut self, n: usize) {
        let max = self.log.len().saturating_sub(1);
        self.log_scroll = (self.log_scroll + n).min(max);
    }

    /// Scroll the event log towards newer entries.
    pub fn scroll_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    /// Empty the event log.
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.log_scroll = 0;
        self.set_status_message("Event log cleared");
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}
