//! Runtime core: the dispatch loop and its lifecycle helpers.
//!
//! The only entry point most callers need from this module is [`Dispatcher`],
//! which multiplexes the error feed and the event stream onto a live session.
//!
//! Internal modules:
//! - [`dispatcher`]: the select loop, routing and the per-exit shutdown paths;
//! - [`tracker`]: counts background updaters so shutdown can wait for them;
//! - [`shutdown`]: cross-platform termination signal handling.

mod dispatcher;
mod shutdown;
mod tracker;

pub use dispatcher::{Dispatcher, DispatcherBuilder, ErrorFeed};
pub use shutdown::{cancel_on_signal, wait_for_shutdown_signal};
pub use tracker::{TaskGuard, Tracker};
