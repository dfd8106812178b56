//! Channel-based presenter.
//!
//! Forwards poll events to the dashboard via a tokio mpsc channel. The
//! dashboard drains the receiver on its own thread, so the loop never waits
//! on rendering.

use tokio::sync::mpsc;
use tracing::debug;

use super::Presenter;
use crate::poll::PollEvent;

/// A presenter that sends every event down a channel.
///
/// # Example
///
/// ```
/// use replica_doctor::ChannelPresenter;
///
/// let (presenter, mut events) = ChannelPresenter::create();
/// assert!(events.try_recv().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    sender: mpsc::UnboundedSender<PollEvent>,
}

impl ChannelPresenter {
    pub fn new(sender: mpsc::UnboundedSender<PollEvent>) -> Self {
        Self { sender }
    }

    /// Create a presenter and the receiver that gets its events.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Presenter for ChannelPresenter {
    fn present(&mut self, event: &PollEvent) {
        if self.sender.send(event.clone()).is_err() {
            // Receiver dropped; the dashboard is shutting down.
            debug!("dashboard receiver dropped, discarding poll event");
        }
    }
}
