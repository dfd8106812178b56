use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, View};

/// Rows moved by PgUp/PgDn in the event log.
const PAGE: usize = 10;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Status),
        KeyCode::Char('2') => app.set_view(View::Events),

        // Scrolling only applies to the event log
        KeyCode::Up | KeyCode::Char('k') if app.current_view == View::Events => app.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') if app.current_view == View::Events => {
            app.scroll_down(1)
        }
        KeyCode::PageUp if app.current_view == View::Events => app.scroll_up(PAGE),
        KeyCode::PageDown if app.current_view == View::Events => app.scroll_down(PAGE),
        KeyCode::Home if app.current_view == View::Events => app.log_scroll = 0,

        KeyCode::Char('c') => app.clear_log(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}
