//! # Shared progress monitor.
//!
//! A [`Progress`] is created by the producer of a task, published inside a
//! `TaskStarted` event and read by the background updater that repaints the
//! task's line. Producers may update it directly or through `TaskProgress`
//! events; both paths land in the same atomics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::sync::lock;

/// Lock-free progress counters plus optional stage text and failure reason.
#[derive(Debug, Default)]
pub struct Progress {
    current: AtomicU64,
    /// `0` = unknown total.
    total: AtomicU64,
    complete: AtomicBool,
    stage: Mutex<Option<Arc<str>>>,
    failure: Mutex<Option<Arc<str>>>,
}

/// Point-in-time copy of a [`Progress`], used for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Units done.
    pub current: u64,
    /// Total units, if known.
    pub total: Option<u64>,
    /// Whether the task reached a final state.
    pub complete: bool,
    /// Current stage description.
    pub stage: Option<Arc<str>>,
    /// Failure reason, if the task failed.
    pub failure: Option<Arc<str>>,
}

impl Progress {
    /// Creates a monitor; `total = 0` means unknown.
    pub fn new(total: u64) -> Arc<Self> {
        Arc::new(Self {
            total: AtomicU64::new(total),
            ..Self::default()
        })
    }

    /// Sets the absolute number of units done.
    pub fn set(&self, current: u64) {
        self.current.store(current, Ordering::Relaxed);
    }

    /// Adds `n` units.
    pub fn add(&self, n: u64) {
        self.current.fetch_add(n, Ordering::Relaxed);
    }

    /// Replaces the total.
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Replaces the stage text shown after the counters.
    pub fn set_stage(&self, stage: impl Into<Arc<str>>) {
        *lock(&self.stage) = Some(stage.into());
    }

    /// Marks the task as successfully complete. If the total is known, current snaps to it.
    pub fn complete(&self) {
        let total = self.total.load(Ordering::Relaxed);
        if total > 0 {
            self.current.store(total, Ordering::Relaxed);
        }
        self.complete.store(true, Ordering::Release);
    }

    /// Marks the task as failed.
    pub fn fail(&self, reason: impl Into<Arc<str>>) {
        *lock(&self.failure) = Some(reason.into());
        self.complete.store(true, Ordering::Release);
    }

    /// True once [`complete`](Self::complete) or [`fail`](Self::fail) was called.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Returns a consistent-enough copy for one repaint.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        ProgressSnapshot {
            current: self.current.load(Ordering::Relaxed),
            total: (total > 0).then_some(total),
            complete: self.is_complete(),
            stage: lock(&self.stage).clone(),
            failure: lock(&self.failure).clone(),
        }
    }
}
