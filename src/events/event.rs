//! # Pipeline events consumed by the dispatcher.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: progress of individual pipeline tasks (started, progress, completed, failed)
//! - **Notices**: one-shot information (update available)
//! - **Terminal event**: [`EventKind::Finished`], the last live event of a session
//!
//! The [`Event`] struct carries the kind, a typed [`Payload`], a timestamp and a sequence number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use etui::{Event, EventKind, Payload};
//!
//! let ev = Event::task_progress("catalog", 3, Some(10));
//!
//! assert_eq!(ev.kind, EventKind::TaskProgress);
//! assert_eq!(ev.task_name(), Some("catalog"));
//! assert!(matches!(ev.payload, Payload::Step { current: 3, .. }));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use super::progress::Progress;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Task events ===
    /// A task began; carries its shared [`Progress`] monitor.
    ///
    /// Payload: [`Payload::Task`]
    TaskStarted,

    /// A task advanced.
    ///
    /// Payload: [`Payload::Step`]
    TaskProgress,

    /// A task finished successfully.
    ///
    /// Payload: [`Payload::Done`] (no reason)
    TaskCompleted,

    /// A task finished with an error (non-fatal for the session).
    ///
    /// Payload: [`Payload::Done`] with a reason
    TaskFailed,

    // === Notices ===
    /// A newer release of the application exists.
    ///
    /// Payload: [`Payload::Version`]
    AppUpdateAvailable,

    // === Terminal ===
    /// All work finished; no further live updates follow.
    ///
    /// Payload: usually [`Payload::Report`]
    Finished,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::TaskStarted => "task_started",
            EventKind::TaskProgress => "task_progress",
            EventKind::TaskCompleted => "task_completed",
            EventKind::TaskFailed => "task_failed",
            EventKind::AppUpdateAvailable => "app_update_available",
            EventKind::Finished => "finished",
        }
    }

    /// True for the kind that ends the live session.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Finished)
    }
}

/// Event payload. The dispatcher never inspects it; handlers do.
#[derive(Debug, Clone)]
pub enum Payload {
    /// No payload.
    Empty,
    /// Task name plus its live progress monitor.
    Task {
        /// Task name, also the key for later step/done events.
        name: Arc<str>,
        /// Monitor shared with the producer.
        progress: Arc<Progress>,
    },
    /// Absolute progress update for a named task.
    Step {
        /// Task name.
        name: Arc<str>,
        /// Units done so far.
        current: u64,
        /// New total, if it changed or became known.
        total: Option<u64>,
    },
    /// End of a named task, with an optional failure reason.
    Done {
        /// Task name.
        name: Arc<str>,
        /// Failure reason; `None` on success.
        reason: Option<Arc<str>>,
    },
    /// Version information for the update banner.
    Version {
        /// Version currently running.
        current: Arc<str>,
        /// Newest version available.
        latest: Arc<str>,
    },
    /// Final report body, emitted after the live session is torn down.
    Report(Arc<str>),
}

impl Payload {
    /// Returns a short variant name for error messages.
    pub fn variant(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Task { .. } => "task",
            Payload::Step { .. } => "step",
            Payload::Done { .. } => "done",
            Payload::Version { .. } => "version",
            Payload::Report(_) => "report",
        }
    }
}

/// Immutable pipeline event.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `payload`: depends on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Kind-specific data.
    pub payload: Payload,
}

impl Event {
    /// Creates a new event of the given kind with an empty payload.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            payload: Payload::Empty,
        }
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Creates a [`EventKind::TaskStarted`] event.
    pub fn task_started(name: impl Into<Arc<str>>, progress: Arc<Progress>) -> Self {
        Event::new(EventKind::TaskStarted).with_payload(Payload::Task {
            name: name.into(),
            progress,
        })
    }

    /// Creates a [`EventKind::TaskProgress`] event.
    pub fn task_progress(name: impl Into<Arc<str>>, current: u64, total: Option<u64>) -> Self {
        Event::new(EventKind::TaskProgress).with_payload(Payload::Step {
            name: name.into(),
            current,
            total,
        })
    }

    /// Creates a [`EventKind::TaskCompleted`] event.
    pub fn task_completed(name: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::TaskCompleted).with_payload(Payload::Done {
            name: name.into(),
            reason: None,
        })
    }

    /// Creates a [`EventKind::TaskFailed`] event.
    pub fn task_failed(name: impl Into<Arc<str>>, reason: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::TaskFailed).with_payload(Payload::Done {
            name: name.into(),
            reason: Some(reason.into()),
        })
    }

    /// Creates a [`EventKind::AppUpdateAvailable`] event.
    pub fn update_available(current: impl Into<Arc<str>>, latest: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::AppUpdateAvailable).with_payload(Payload::Version {
            current: current.into(),
            latest: latest.into(),
        })
    }

    /// Creates the terminal [`EventKind::Finished`] event carrying a report body.
    pub fn finished(report: impl Into<Arc<str>>) -> Self {
        Event::new(EventKind::Finished).with_payload(Payload::Report(report.into()))
    }

    /// Returns the task name for task events.
    pub fn task_name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Task { name, .. } | Payload::Step { name, .. } | Payload::Done { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarted);
        let b = Event::new(EventKind::TaskStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn only_finished_is_terminal() {
        assert!(EventKind::Finished.is_terminal());
        assert!(!EventKind::TaskCompleted.is_terminal());
        assert!(!EventKind::AppUpdateAvailable.is_terminal());
    }

    #[test]
    fn constructors_set_kind_and_payload() {
        let ev = Event::task_failed("index", "permission denied");
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(ev.task_name(), Some("index"));
        match ev.payload {
            Payload::Done { reason, .. } => assert_eq!(reason.as_deref(), Some("permission denied")),
            other => panic!("unexpected payload {other:?}"),
        }

        let ev = Event::update_available("1.0.0", "1.2.0");
        assert_eq!(ev.task_name(), None);
        assert_eq!(ev.payload.variant(), "version");
    }
}
