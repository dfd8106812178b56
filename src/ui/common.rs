//! Header, tab bar, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_breakdown;

/// Render the header bar: health, target, lag and thread states.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" REPLICA DOCTOR ", Style::default().add_modifier(Modifier::BOLD));

    let (Some(result), Some(health)) = (app.latest.as_ref(), app.health()) else {
        let line = Line::from(vec![
            title,
            Span::raw(format!("│ {} │ Waiting for first poll...", app.target)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let snapshot = &result.snapshot;
    let lag = match snapshot.seconds_behind {
        Some(0) => "caught up".to_string(),
        Some(secs) => format_breakdown(secs),
        None => "NULL".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.health_style(health)),
        title,
        Span::raw(format!("│ {} │ ", app.target)),
        Span::styled(health.symbol(), app.theme.health_style(health)),
        Span::raw(" │ lag "),
        Span::styled(lag, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" │ IO "),
        Span::styled(
            snapshot.io_running.as_deref().unwrap_or("NULL").to_string(),
            app.theme.thread_style(snapshot.io_thread_running()),
        ),
        Span::raw(" SQL "),
        Span::styled(
            snapshot.sql_running.as_deref().unwrap_or("NULL").to_string(),
            app.theme.thread_style(snapshot.sql_thread_running()),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar, highlighting the active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let events_title = if app.log.is_empty() {
        " 2:Events ".to_string()
    } else {
        format!(" 2:Events ({}) ", app.log.len())
    };
    let titles: Vec<Line> = vec![Line::from(" 1:Status "), Line::from(events_title)];

    let selected = match app.current_view {
        View::Status => 0,
        View::Events => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Temporary messages win over errors, which win over the update age.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.accent));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Status => "Tab:switch c:clear log ?:help q:quit",
        View::Events => "↑↓:scroll Tab:switch c:clear ?:help q:quit",
    };

    let (status, style) = if app.disconnected {
        (
            format!(" Poll loop stopped | {}", controls),
            Style::default().fg(app.theme.crit),
        )
    } else if let Some(ref err) = app.load_error {
        (
            format!(" Error: {} | {}", err, controls),
            Style::default().fg(app.theme.warn),
        )
    } else if let Some(at) = app.last_update {
        (
            format!(
                " {} | Updated {:.1}s ago | Recoveries {} ok / {} failed | {}",
                app.current_view.label(),
                at.elapsed().as_secs_f64(),
                app.recoveries_succeeded,
                app.recoveries_failed,
                controls
            ),
            Style::default().add_modifier(Modifier::DIM),
        )
    } else {
        (
            format!(" Connecting... | {}", controls),
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.title)]),
        Line::from(""),
        section(" Views"),
        Line::from("  Tab/S-Tab   Switch views"),
        Line::from("  1 / 2       Status / Events"),
        Line::from(""),
        section(" Events"),
        Line::from("  ↑/↓ j/k     Scroll"),
        Line::from("  PgUp/PgDn   Scroll 10 entries"),
        Line::from("  Home        Newest entry"),
        Line::from("  c           Clear log"),
        Line::from(""),
        section(" General"),
        Line::from("  ?           Toggle help"),
        Line::from("  q / Esc     Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.accent));

    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 20u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
