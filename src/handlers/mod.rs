//! # Event handlers.
//!
//! This module provides the [`Handler`] trait, the [`HandlerRegistry`]
//! capability table and the built-in handler groups.
//!
//! ## Built-in groups
//! - [`ProgressHandler`]: task started/progress/completed/failed, one live line per task
//! - [`UpdateHandler`]: one-shot "new version available" banner
//! - [`WriterReport`]: the [`FinishedReport`] collaborator for the terminal event

mod handler;
mod progress;
mod registry;
mod report;
mod update;

pub use handler::{Ctx, Handler};
pub use progress::ProgressHandler;
pub use registry::{Dispatched, HandlerRegistry};
pub use report::{FinishedReport, WriterReport};
pub use update::UpdateHandler;
