//! Status view rendering.
//!
//! Left: the replica status fields of the latest poll. Right: the lag trend
//! figures and a sparkline of recent lag samples.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::duration::{format_breakdown, format_remaining};
use crate::data::{Trend, TrendReport};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [fields_area, side_area] =
        Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).areas(area);
    let [trend_area, spark_area] =
        Layout::vertical([Constraint::Min(8), Constraint::Length(4)]).areas(side_area);

    render_fields(frame, app, fields_area);
    render_trend(frame, app, trend_area);
    render_sparkline(frame, app, spark_area);
}

fn panel<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_fields(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref result) = app.latest else {
        let text = app.load_error.as_deref().unwrap_or("Waiting for replica status...");
        let paragraph = Paragraph::new(text)
            .style(app.theme.muted_style())
            .block(panel(app, " Replica Status ".to_string()));
        frame.render_widget(paragraph, area);
        return;
    };

    let snapshot = &result.snapshot;
    let rows: Vec<Row> = snapshot
        .fields()
        .into_iter()
        .map(|(name, value)| {
            let value_cell = match (name, value) {
                ("Replica_IO_Running", Some(v)) => {
                    Cell::from(v).style(app.theme.thread_style(snapshot.io_thread_running()))
                }
                ("Replica_SQL_Running", Some(v)) => {
                    Cell::from(v).style(app.theme.thread_style(snapshot.sql_thread_running()))
                }
                ("Last_IO_Error" | "Last_SQL_Error", Some(v)) if !v.is_empty() => {
                    Cell::from(v).style(Style::default().fg(app.theme.crit))
                }
                ("Seconds_Behind_Source", Some(v)) => {
                    let secs = snapshot.seconds_behind.map(format_breakdown).unwrap_or(v);
                    Cell::from(secs).style(Style::default().add_modifier(Modifier::BOLD))
                }
                (_, Some(v)) => Cell::from(v),
                (_, None) => Cell::from("NULL").style(app.theme.muted_style()),
            };
            Row::new(vec![Cell::from(name), value_cell])
        })
        .collect();

    let header = Row::new(vec!["Field", "Value"]).style(app.theme.title).bottom_margin(0);
    let widths = [Constraint::Length(24), Constraint::Fill(1)];

    let title = match result.matched_pattern {
        Some(ref pattern) => format!(" Replica Status [pattern '{}' matched] ", pattern),
        None => format!(" Replica Status @ {} ", local_time(&result.checked_at)),
    };

    let table = Table::new(rows, widths).header(header).block(panel(app, title));
    frame.render_widget(table, area);
}

fn render_trend(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(app, " Replication Performance ".to_string());

    let Some(report) = app.latest.as_ref().and_then(|r| r.trend.as_ref()) else {
        let paragraph = Paragraph::new("No lag reported")
            .style(app.theme.muted_style())
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = Vec::new();
    if report.is_caught_up() {
        lines.push(Line::from(Span::styled(
            "Caught up!",
            Style::default().fg(app.theme.ok).add_modifier(Modifier::BOLD),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::raw("Behind by "),
            Span::styled(
                format_breakdown(report.seconds_behind),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    lines.push(Line::from(""));
    trend_lines(&mut lines, app, "Instant", report.instant_trend(), report.instant_eta, report);
    trend_lines(&mut lines, app, "Average", report.average_trend(), report.average_eta, report);

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, area);
}

fn trend_lines(
    lines: &mut Vec<Line<'static>>,
    app: &App,
    label: &'static str,
    trend: Trend,
    eta: Option<DateTime<Utc>>,
    report: &TrendReport,
) {
    let text = match trend {
        Trend::CatchingUp(speed) => format!("{}: catching up at {:.2} s/s", label, speed),
        Trend::FallingBehind(speed) => format!("{}: falling behind at {:.2} s/s", label, speed),
        Trend::Steady => format!("{}: steady", label),
    };
    lines.push(Line::from(Span::styled(text, app.theme.trend_style(trend))));

    if let Some(eta) = eta {
        lines.push(Line::from(vec![
            Span::raw("  ETA "),
            Span::styled(
                format_remaining(eta - report.observed_at),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({})", local_time(&eta)), app.theme.muted_style()),
        ]));
    }
}

fn render_sparkline(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.history.peak() {
        Some(peak) => format!(" Lag history (peak {}) ", format_breakdown(peak)),
        None => " Lag history ".to_string(),
    };
    let width = area.width.saturating_sub(2) as usize;
    let line = sparkline(&app.history.sparkline(), width);

    let paragraph = Paragraph::new(line)
        .style(Style::default().fg(app.theme.accent))
        .block(panel(app, title));
    frame.render_widget(paragraph, area);
}

/// The last `width` levels as bar characters.
fn sparkline(levels: &[u8], width: usize) -> String {
    let skip = levels.len().saturating_sub(width);
    levels[skip..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_keeps_newest() {
        assert_eq!(sparkline(&[0, 3, 7], 8), "▁▄█");
        assert_eq!(sparkline(&[0, 1, 2, 7], 2), "▃█");
        assert_eq!(sparkline(&[], 4), "");
    }
}
