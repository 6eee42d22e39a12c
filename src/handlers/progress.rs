//! # Progress handler: one live line per running task.
//!
//! ```text
//! TaskStarted{name, progress} ─► frame.append() ─► Tracker::spawn(repaint loop)
//!                                                     every repaint_interval:
//!                                                       snapshot → format → line.render
//!                                                     until progress.is_complete()
//! TaskProgress{name, current}  ─► active[name].set(current)
//! TaskCompleted{name}          ─► active[name].complete()
//! TaskFailed{name, reason}     ─► active[name].fail(reason)
//! ```
//!
//! The active map has no upper bound; an entry is removed by its own updater
//! once the final state has been painted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::handler::{Ctx, Handler};
use crate::error::RenderError;
use crate::events::{Event, EventKind, Payload, Progress, ProgressSnapshot};
use crate::sync::lock;
use crate::terminal::Line;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const DONE_MARK: char = '✔';
const FAIL_MARK: char = '✘';

type Active = Arc<Mutex<HashMap<Arc<str>, Arc<Progress>>>>;

/// Renders task lifecycle events as live progress lines.
#[derive(Default)]
pub struct ProgressHandler {
    active: Active,
}

impl ProgressHandler {
    /// Creates a handler with no active tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks whose final state has not been painted yet.
    pub fn active(&self) -> usize {
        lock(&self.active).len()
    }

    fn start(&self, ctx: &Ctx<'_>, name: &Arc<str>, progress: &Arc<Progress>) -> Result<(), RenderError> {
        let mut active = lock(&self.active);
        if active.contains_key(name) {
            return Err(RenderError::DuplicateTask(name.to_string()));
        }
        let line = ctx.frame.append()?;
        active.insert(Arc::clone(name), Arc::clone(progress));
        drop(active);

        let updater = Updater {
            line,
            name: Arc::clone(name),
            progress: Arc::clone(progress),
            every: ctx.cfg.repaint(),
            bar_width: ctx.cfg.bar_width,
            active: Arc::clone(&self.active),
        };
        ctx.tracker.spawn(Arc::clone(name), updater.run(ctx.tracker.token()));
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<Arc<Progress>, RenderError> {
        lock(&self.active)
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownTask(name.to_string()))
    }
}

impl Handler for ProgressHandler {
    fn kinds(&self) -> &'static [EventKind] {
        &[
            EventKind::TaskStarted,
            EventKind::TaskProgress,
            EventKind::TaskCompleted,
            EventKind::TaskFailed,
        ]
    }

    fn handle(&self, ctx: &Ctx<'_>, event: &Event) -> Result<(), RenderError> {
        match (&event.kind, &event.payload) {
            (EventKind::TaskStarted, Payload::Task { name, progress }) => {
                self.start(ctx, name, progress)
            }
            (EventKind::TaskProgress, Payload::Step { name, current, total }) => {
                let progress = self.lookup(name)?;
                if let Some(total) = total {
                    progress.set_total(*total);
                }
                progress.set(*current);
                Ok(())
            }
            (EventKind::TaskCompleted | EventKind::TaskFailed, Payload::Done { name, reason }) => {
                // The producer may already have finished the monitor and its
                // updater may be gone; a late done event is not an error.
                let Ok(progress) = self.lookup(name) else {
                    debug!(target: "etui", task = %name, "done event for inactive task");
                    return Ok(());
                };
                match reason {
                    Some(reason) => progress.fail(Arc::clone(reason)),
                    None if event.kind == EventKind::TaskFailed => progress.fail("failed"),
                    None => progress.complete(),
                }
                Ok(())
            }
            (kind, _) => Err(RenderError::Payload {
                kind: kind.as_label(),
                expected: expected_payload(*kind),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "progress"
    }
}

fn expected_payload(kind: EventKind) -> &'static str {
    match kind {
        EventKind::TaskStarted => "task",
        EventKind::TaskProgress => "step",
        _ => "done",
    }
}

/// Background repaint loop for one task line.
struct Updater {
    line: Line,
    name: Arc<str>,
    progress: Arc<Progress>,
    every: Duration,
    bar_width: usize,
    active: Active,
}

impl Updater {
    async fn run(self, token: CancellationToken) {
        let mut tick = tokio::time::interval(self.every);
        let mut frame_idx = 0usize;
        loop {
            let cancelled = tokio::select! {
                _ = token.cancelled() => true,
                _ = tick.tick() => false,
            };

            let snap = self.progress.snapshot();
            let spin = SPINNER[frame_idx % SPINNER.len()];
            frame_idx = frame_idx.wrapping_add(1);

            match self.line.render(&format_line(&self.name, &snap, spin, self.bar_width)) {
                Ok(()) => {}
                Err(RenderError::SessionClosed) => {
                    debug!(target: "etui", task = %self.name, "session closed; updater stops");
                    break;
                }
                Err(e) => {
                    warn!(target: "etui", task = %self.name, error = %e, "repaint failed");
                    break;
                }
            }
            if snap.complete || cancelled {
                break;
            }
        }

        let mut active = lock(&self.active);
        if active
            .get(&self.name)
            .is_some_and(|p| Arc::ptr_eq(p, &self.progress))
        {
            active.remove(&self.name);
        }
    }
}

/// Formats one progress line.
///
/// ```text
/// ⠙ catalog [██████░░░░] 6/10 reading
/// ✔ catalog 10/10
/// ✘ catalog 3/10 (permission denied)
/// ⠹ walk 1402
/// ```
pub(crate) fn format_line(name: &str, snap: &ProgressSnapshot, spin: char, bar_width: usize) -> String {
    let mark = match (snap.complete, snap.failure.is_some()) {
        (true, true) => FAIL_MARK,
        (true, false) => DONE_MARK,
        (false, _) => spin,
    };
    let mut out = format!("{mark} {name}");

    match snap.total {
        Some(total) => {
            if !snap.complete && bar_width > 0 {
                out.push_str(" [");
                out.push_str(&bar(snap.current, total, bar_width));
                out.push(']');
            }
            out.push_str(&format!(" {}/{}", snap.current.min(total), total));
        }
        None if snap.current > 0 => out.push_str(&format!(" {}", snap.current)),
        None => {}
    }

    if let Some(reason) = &snap.failure {
        out.push_str(&format!(" ({reason})"));
    } else if let (false, Some(stage)) = (snap.complete, &snap.stage) {
        out.push(' ');
        out.push_str(stage);
    }
    out
}

fn bar(current: u64, total: u64, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((current.min(total) as u128 * width as u128) / total as u128) as usize
    };
    let mut s = String::with_capacity(width * 3);
    s.extend(std::iter::repeat_n('█', filled));
    s.extend(std::iter::repeat_n('░', width - filled));
    s
}
