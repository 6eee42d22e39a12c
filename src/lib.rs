//! # etui
//!
//! **etui** is an ephemeral terminal UI dispatcher for long-running command-line jobs.
//!
//! While a worker pipeline runs, it shows a live, self-updating region of progress
//! lines on the terminal. When the pipeline finishes, the live region is torn down
//! and a final report is printed as ordinary output. On cancellation or a fatal
//! worker error the terminal is always left in a sane state: frame closed, cursor
//! visible.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   worker pipeline                                 worker pipeline
//!   (publishes Events)                              (sends fatal errors)
//!          │                                                │
//!          ▼                                                ▼
//!   ┌──────────────┐                             ┌────────────────────┐
//!   │ Bus          │── Subscription ──┐   ┌──────│ mpsc::Receiver     │
//!   │ (mpsc)       │                  │   │      │ <WorkerError>      │
//!   └──────────────┘                  ▼   ▼      └────────────────────┘
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher::run (select loop)                                    │
//! │  - HandlerRegistry (EventKind → handler group, first claim wins)  │
//! │  - Tracker (outstanding background updaters)                      │
//! │  - Session (cursor hidden + frame open; restored on drop)         │
//! └──────┬──────────────────────────┬──────────────────────────┬──────┘
//!        ▼                          ▼                          ▼
//!  ProgressHandler             UpdateHandler              FinishedReport
//!  (line + updater per task)   (one-shot banner)          (after frame close)
//!        │                          │
//!        ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Frame (live region on the caller-owned Terminal)                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Terminal::session() ──► hide cursor ──► open frame          (Running)
//!
//! loop until:
//!   ├─ fatal worker error  ─► cancel updaters ─► Err(UiError::Worker)
//!   ├─ Finished event      ─► drain updaters ─► close frame ─► report   (Draining → Closed)
//!   ├─ end of stream       ─► cancel + bounded drain
//!   └─ cancellation        ─► cancel + bounded drain
//!
//! Session drop: close frame if still open ─► show cursor      (every path, also on panic)
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                        |
//! |-------------------|------------------------------------------------------------------|-------------------------------------------|
//! | **Dispatch**      | Select loop over error feed, events and cancellation.            | [`Dispatcher`], [`DispatcherBuilder`]     |
//! | **Handlers**      | Route event kinds to rendering groups.                           | [`Handler`], [`HandlerRegistry`]          |
//! | **Events**        | Typed events, lossless bus, shared progress monitors.             | [`Event`], [`Bus`], [`Progress`]          |
//! | **Terminal**      | Cursor guard, live frame, per-task lines.                        | [`Terminal`], [`Session`], [`Frame`]      |
//! | **Errors**        | Typed errors for the loop and for rendering.                     | [`UiError`], [`RenderError`]              |
//! | **Configuration** | Centralize repaint, placement and drain settings.                | [`UiConfig`]                              |
//!
//! ## Example
//! ```rust
//! use etui::{Bus, Dispatcher, Event, Progress, Terminal, UiConfig, WorkerError, WriterReport};
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = UiConfig::default();
//!     let (bus, events) = Bus::channel();
//!     let (_errors_tx, errors) = mpsc::channel::<WorkerError>(1);
//!
//!     let ui = Dispatcher::builder(cfg)
//!         .with_default_handlers()
//!         .with_finished(Arc::new(WriterReport::new(std::io::sink())))
//!         .build();
//!
//!     let progress = Progress::new(3);
//!     bus.publish(Event::task_started("catalog", progress.clone()));
//!     progress.set(3);
//!     progress.complete();
//!     bus.publish(Event::finished("3 packages"));
//!
//!     let terminal = Terminal::new(std::io::sink());
//!     ui.run(&terminal, errors, events, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod handlers;
mod sync;
mod terminal;

// ---- Public re-exports ----

pub use config::{MIN_REPAINT, UiConfig};
pub use core::{
    Dispatcher, DispatcherBuilder, ErrorFeed, TaskGuard, Tracker, cancel_on_signal,
    wait_for_shutdown_signal,
};
pub use error::{RenderError, UiError, WorkerError};
pub use events::{Bus, Event, EventKind, Payload, Progress, ProgressSnapshot, Subscription};
pub use handlers::{
    Ctx, Dispatched, FinishedReport, Handler, HandlerRegistry, ProgressHandler, UpdateHandler,
    WriterReport,
};
pub use terminal::{Frame, Line, LoopState, Placement, Session, Terminal, TerminalStats};
