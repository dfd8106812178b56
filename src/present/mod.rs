//! Rendering of poll loop results.
//!
//! The loop hands every [`PollEvent`] to a [`Presenter`]; what happens next is
//! entirely the presenter's business.
//!
//! - [`ConsolePresenter`]: human-readable report on a writer (stdout by default)
//! - [`JsonPresenter`]: one JSON object per line, for log shippers
//! - [`ChannelPresenter`]: forwards events to the interactive dashboard

mod channel;
mod console;
mod json;

pub use channel::ChannelPresenter;
pub use console::{render_event, ConsolePresenter};
pub use json::JsonPresenter;

use crate::poll::PollEvent;

/// Receives the results of each poll cycle.
pub trait Presenter: Send {
    /// Render one event. Must not block for long: the loop waits on it.
    fn present(&mut self, event: &PollEvent);
}
