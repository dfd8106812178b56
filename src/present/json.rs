//! JSON-lines output.

use std::io::{self, Write};

use tracing::{debug, warn};

use super::Presenter;
use crate::poll::PollEvent;

/// Writes each event as a single-line JSON object.
pub struct JsonPresenter<W: Write + Send> {
    writer: W,
}

impl JsonPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonPresenter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Presenter for JsonPresenter<W> {
    fn present(&mut self, event: &PollEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to serialize poll event");
                return;
            }
        };
        if let Err(e) = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush()) {
            debug!(error = %e, "failed to write poll event");
        }
    }
}
