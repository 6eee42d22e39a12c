//! Error types used by the dispatcher and its handlers.
//!
//! This module defines two main error enums:
//!
//! - [`UiError`]: errors that cross the dispatcher boundary (fatal worker errors, setup failures).
//! - [`RenderError`]: errors raised while rendering a single event; logged and swallowed.
//!
//! Both types provide [`as_label`](UiError::as_label) for logs.

use std::io;

use thiserror::Error;

use crate::terminal::LoopState;

/// A fatal failure reported by the worker pipeline on the error feed.
pub type WorkerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors returned by the dispatcher.
///
/// Only these ever reach the caller of [`Dispatcher::run`](crate::Dispatcher::run);
/// render-level failures are recovered inside the loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UiError {
    /// The worker pipeline reported a fatal error; the loop aborted.
    #[error("worker failed: {0}")]
    Worker(#[source] WorkerError),

    /// The terminal session could not be set up (cursor or frame).
    #[error("unable to setup screen: {0}")]
    Setup(#[source] io::Error),

    /// A session state transition was attempted out of order.
    #[error("illegal session transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// State the session was in.
        from: LoopState,
        /// State that was requested.
        to: LoopState,
    },
}

impl UiError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use etui::UiError;
    ///
    /// let err = UiError::Worker("disk full".into());
    /// assert_eq!(err.as_label(), "ui_worker_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UiError::Worker(_) => "ui_worker_failed",
            UiError::Setup(_) => "ui_setup_failed",
            UiError::InvalidTransition { .. } => "ui_invalid_transition",
        }
    }

    /// Returns the worker error, if this is a fatal worker failure.
    pub fn into_worker(self) -> Option<WorkerError> {
        match self {
            UiError::Worker(e) => Some(e),
            _ => None,
        }
    }
}

/// # Errors produced while rendering one event.
///
/// Never fatal: the dispatcher logs them and keeps going.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RenderError {
    /// The session was closed before this write; the writer must stop.
    #[error("write after session close")]
    SessionClosed,

    /// The event payload did not match what the handler expects.
    #[error("unexpected payload for {kind}: expected {expected}")]
    Payload {
        /// Event kind label.
        kind: &'static str,
        /// Payload variant the handler wanted.
        expected: &'static str,
    },

    /// No active indicator is tracked under this task name.
    #[error("unknown task {0:?}")]
    UnknownTask(String),

    /// A task with this name is already being rendered.
    #[error("task {0:?} already started")]
    DuplicateTask(String),

    /// Writing to the terminal failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),

    /// The handler panicked; the panic was caught.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl RenderError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RenderError::SessionClosed => "render_session_closed",
            RenderError::Payload { .. } => "render_bad_payload",
            RenderError::UnknownTask(_) => "render_unknown_task",
            RenderError::DuplicateTask(_) => "render_duplicate_task",
            RenderError::Io(_) => "render_io",
            RenderError::Panicked(_) => "render_panicked",
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
