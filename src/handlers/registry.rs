//! # Capability table from event kind to handler group.
//!
//! [`HandlerRegistry`] is built once from a list of groups. Each group declares
//! the kinds it claims through [`Handler::kinds`]; the table keeps the first
//! claim per kind, so dispatch is exclusive by construction.
//!
//! ```text
//! groups: [Progress, Update, Custom]
//!             │        │        │
//!             ▼        ▼        ▼
//! table:  TaskStarted→0, TaskProgress→0, ..., AppUpdateAvailable→1, ...
//!
//! dispatch(ev) ─► table[ev.kind] ─► groups[i].handle(ctx, ev)
//!                      └─ miss ─► Unclaimed (no call, no error)
//! ```
//!
//! ## Rules
//! - [`EventKind::Finished`] is never routed here; the dispatch loop owns it.
//! - A later group claiming an already-claimed kind is ignored for that kind.
//! - Handler panics are caught and reported as [`RenderError::Panicked`].

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::warn;

use super::handler::{Ctx, Handler};
use crate::error::{RenderError, panic_message};
use crate::events::{Event, EventKind};

/// Outcome of routing one event.
#[derive(Debug)]
pub enum Dispatched {
    /// No group claims this kind.
    Unclaimed,
    /// The named group handled it.
    Handled(&'static str),
    /// The named group failed; the error is for the diagnostic sink only.
    Failed {
        /// Handler name.
        handler: &'static str,
        /// What went wrong.
        error: RenderError,
    },
}

/// Kind → handler lookup table.
pub struct HandlerRegistry {
    groups: Vec<Arc<dyn Handler>>,
    table: HashMap<EventKind, usize>,
}

impl HandlerRegistry {
    /// Builds the table; earlier groups win on overlapping kinds.
    pub fn new(groups: Vec<Arc<dyn Handler>>) -> Self {
        let mut table = HashMap::new();
        for (idx, group) in groups.iter().enumerate() {
            for kind in group.kinds() {
                if kind.is_terminal() {
                    warn!(
                        target: "etui",
                        handler = group.name(),
                        kind = kind.as_label(),
                        "terminal kind cannot be claimed by a handler"
                    );
                    continue;
                }
                if let Some(&owner) = table.get(kind) {
                    let owner: &Arc<dyn Handler> = &groups[owner];
                    warn!(
                        target: "etui",
                        handler = group.name(),
                        owner = owner.name(),
                        kind = kind.as_label(),
                        "kind already claimed; ignoring"
                    );
                    continue;
                }
                table.insert(*kind, idx);
            }
        }
        Self { groups, table }
    }

    /// Returns the group that responds to `kind`, if any.
    pub fn responds_to(&self, kind: EventKind) -> Option<&Arc<dyn Handler>> {
        self.table.get(&kind).map(|&idx| &self.groups[idx])
    }

    /// Routes `event` to its group and reports the outcome.
    pub fn dispatch(&self, ctx: &Ctx<'_>, event: &Event) -> Dispatched {
        let Some(group) = self.responds_to(event.kind) else {
            return Dispatched::Unclaimed;
        };
        let handler = group.name();
        match catch_unwind(AssertUnwindSafe(|| group.handle(ctx, event))) {
            Ok(Ok(())) => Dispatched::Handled(handler),
            Ok(Err(error)) => Dispatched::Failed { handler, error },
            Err(panic_err) => Dispatched::Failed {
                handler,
                error: RenderError::Panicked(panic_message(&*panic_err)),
            },
        }
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if no group is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
