//! # Event handler trait.
//!
//! Provides [`Handler`], the extension point for rendering one group of event
//! kinds onto the live frame.
//!
//! ## Rules
//! - `handle` is synchronous: it runs inside the dispatch loop and must return quickly.
//! - Long-lived rendering goes through [`Tracker::spawn`](crate::Tracker::spawn),
//!   so the drain can wait for it.
//! - Errors and panics are caught by the registry and logged; they never stop the loop.
//!
//! ## Example
//! ```rust
//! use etui::{Ctx, Event, EventKind, Handler, RenderError};
//!
//! struct Beep;
//!
//! impl Handler for Beep {
//!     fn kinds(&self) -> &'static [EventKind] { &[EventKind::AppUpdateAvailable] }
//!
//!     fn handle(&self, ctx: &Ctx<'_>, _ev: &Event) -> Result<(), RenderError> {
//!         ctx.frame.append()?.render("\u{7} update!")
//!     }
//!
//!     fn name(&self) -> &'static str { "beep" }
//! }
//! ```

use crate::config::UiConfig;
use crate::core::Tracker;
use crate::events::{Event, EventKind};
use crate::terminal::Frame;

/// What a handler gets to work with while the session is open.
pub struct Ctx<'a> {
    /// The live frame; clone it to hand it to an updater.
    pub frame: &'a Frame,
    /// Tracker that updaters must be spawned through.
    pub tracker: &'a Tracker,
    /// Dispatcher configuration.
    pub cfg: &'a UiConfig,
}

/// Renderer for one group of event kinds.
pub trait Handler: Send + Sync + 'static {
    /// Event kinds this group responds to.
    fn kinds(&self) -> &'static [EventKind];

    /// Renders one event.
    fn handle(&self, ctx: &Ctx<'_>, event: &Event) -> Result<(), crate::error::RenderError>;

    /// Returns the handler name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
