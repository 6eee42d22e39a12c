//! # Finished-report collaborator.
//!
//! Invoked exactly once, after the live frame was drained and closed, with the
//! terminal [`EventKind::Finished`](crate::EventKind::Finished) event. Output
//! here is ordinary, non-live text; stdout by default so it can be piped while
//! the live frame stays on stderr.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use etui::{Event, FinishedReport, RenderError};
//!
//! struct Silent;
//!
//! #[async_trait]
//! impl FinishedReport for Silent {
//!     async fn finish(&self, _ev: &Event) -> Result<(), RenderError> { Ok(()) }
//! }
//! ```

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RenderError;
use crate::events::{Event, Payload};
use crate::sync::lock;

/// Receives the terminal event once the live session is gone.
#[async_trait]
pub trait FinishedReport: Send + Sync + 'static {
    /// Emits the final report for `event`.
    ///
    /// Errors are logged by the dispatcher and never reach its caller.
    async fn finish(&self, event: &Event) -> Result<(), RenderError>;
}

/// Writes [`Payload::Report`] bodies to a writer, newline-terminated.
pub struct WriterReport {
    out: Mutex<Box<dyn Write + Send>>,
}

impl WriterReport {
    /// Reports to an arbitrary writer.
    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Reports to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

#[async_trait]
impl FinishedReport for WriterReport {
    async fn finish(&self, event: &Event) -> Result<(), RenderError> {
        let body = match &event.payload {
            Payload::Report(body) => body,
            Payload::Empty => return Ok(()),
            _ => {
                return Err(RenderError::Payload {
                    kind: event.kind.as_label(),
                    expected: "report",
                });
            }
        };
        let mut out = lock(&self.out);
        out.write_all(body.as_bytes())?;
        if !body.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::terminal::tests::Capture;

    #[tokio::test]
    async fn report_is_newline_terminated() {
        let cap = Capture::default();
        let report = WriterReport::new(cap.clone());
        report.finish(&Event::finished("3 packages")).await.unwrap();
        report.finish(&Event::finished("done\n")).await.unwrap();
        assert_eq!(cap.text(), "3 packages\ndone\n");
    }

    #[tokio::test]
    async fn empty_payload_writes_nothing() {
        let cap = Capture::default();
        let report = WriterReport::new(cap.clone());
        report.finish(&Event::new(EventKind::Finished)).await.unwrap();
        assert!(cap.text().is_empty());
    }
}
