//! Events view: the dashboard's event log, newest first.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.log.is_empty() {
        " Events ".to_string()
    } else {
        format!(" Events [{}/{}] ", app.log_scroll + 1, app.log.len())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.log.is_empty() {
        let paragraph = Paragraph::new("No events yet. Matches, recoveries and failures show up here.")
            .style(app.theme.muted_style())
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = app
        .log
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                    .style(app.theme.muted_style()),
                Cell::from(entry.severity.symbol()).style(app.theme.health_style(entry.severity)),
                Cell::from(entry.message.as_str()),
            ])
        })
        .collect();

    let header = Row::new(vec!["Time", "Level", "Event"]).style(app.theme.title);
    let widths = [Constraint::Length(19), Constraint::Length(5), Constraint::Fill(1)];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .row_highlight_style(Style::default().bg(app.theme.border).fg(app.theme.accent))
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.log_scroll));

    frame.render_stateful_widget(table, area, &mut state);
}
