//! Pipeline events: types, progress monitors and the event bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Payload`] event classification and data
//! - [`Progress`] shared progress monitor carried by task events
//! - [`Bus`], [`Subscription`] lossless wrapper over an unbounded `tokio::sync::mpsc` channel
//!
//! ## Quick reference
//! - **Publishers**: pipeline workers (outside this crate), via [`Bus::publish`].
//! - **Consumer**: the dispatcher loop, via [`Subscription::next`].

mod bus;
mod event;
mod progress;

pub use bus::{Bus, Subscription};
pub use event::{Event, EventKind, Payload};
pub use progress::{Progress, ProgressSnapshot};
