//! # Background task tracker.
//!
//! Counts the background updaters currently painting into the session so the
//! dispatcher knows when it is safe to close the frame.
//!
//! ## Architecture
//! ```text
//! Handler ──► Tracker::spawn(fut)
//!               ├─► register()      count += 1   (before the task exists)
//!               └─► tokio::spawn ─► fut ─► catch_unwind ─► guard drop: count -= 1
//!                                                                │
//! Dispatcher ──► Tracker::wait() ◄──────── notify when count == 0 ┘
//! ```
//!
//! ## Rules
//! - Registration happens before spawn, so a drain never misses a task that was started.
//! - Deregistration is tied to a guard: it runs on completion, panic, or abort.
//! - Updaters receive [`Tracker::token`] and should stop when it is cancelled.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::{sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::panic_message;

struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Shared counter of outstanding background updaters.
///
/// Cheap to clone; clones share the same count and token.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
    token: CancellationToken,
}

/// Registration of one background updater. Dropping it marks the updater done.
#[must_use = "dropping the guard deregisters the task immediately"]
pub struct TaskGuard {
    inner: Arc<Inner>,
}

impl TaskGuard {
    /// Marks the updater done. Equivalent to dropping the guard.
    pub fn done(self) {}
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl Tracker {
    /// Creates a tracker whose updaters stop when `token` is cancelled.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                count: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
            token,
        }
    }

    /// Registers one updater; the returned guard deregisters it on drop.
    pub fn register(&self) -> TaskGuard {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        TaskGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Registers and spawns a supervised updater.
    ///
    /// A panic inside `fut` is caught and logged; the registration is released either way.
    pub fn spawn<F>(&self, name: impl Into<Arc<str>>, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.register();
        let name = name.into();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                error!(
                    target: "etui",
                    task = %name,
                    info = %panic_message(&*panic_err),
                    "background updater panicked"
                );
            }
        })
    }

    /// Number of updaters currently registered.
    pub fn outstanding(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Token handed to updaters.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Asks every updater to stop at its next repaint boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits until no updater is registered.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Waits up to `grace` for the count to reach zero.
    ///
    /// Returns `Err(outstanding)` if the bound was hit.
    pub async fn wait_for(&self, grace: Duration) -> Result<(), usize> {
        match tokio::time::timeout(grace, self.wait()).await {
            Ok(()) => Ok(()),
            Err(_elapsed) => Err(self.outstanding()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn wait_returns_immediately_when_idle() {
        let tracker = Tracker::new(CancellationToken::new());
        tracker.wait().await;
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn wait_blocks_until_all_guards_drop() {
        let tracker = Tracker::new(CancellationToken::new());
        let a = tracker.register();
        let b = tracker.register();
        assert_eq!(tracker.outstanding(), 2);

        let waiter = {
            let t = tracker.clone();
            tokio::spawn(async move { t.wait().await })
        };
        a.done();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        drop(b);
        waiter.await.unwrap();
        assert_eq!(tracker.outstanding(), 0);
    }

    #[tokio::test]
    async fn spawn_registers_before_running() {
        let tracker = Tracker::new(CancellationToken::new());
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let handle = tracker.spawn("job", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(tracker.outstanding(), 1);
        tracker.wait().await;
        assert!(ran.load(Ordering::SeqCst));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn panicking_updater_still_deregisters() {
        let tracker = Tracker::new(CancellationToken::new());
        let handle = tracker.spawn("bad", async {
            if true {
                panic!("boom");
            }
        });
        handle.await.unwrap();
        assert_eq!(tracker.outstanding(), 0);
        tracker.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_reports_stragglers() {
        let tracker = Tracker::new(CancellationToken::new());
        let _stuck = tracker.register();
        let res = tracker.wait_for(Duration::from_millis(50)).await;
        assert_eq!(res, Err(1));
    }

    #[tokio::test]
    async fn cancel_reaches_updaters() {
        let parent = CancellationToken::new();
        let tracker = Tracker::new(parent.child_token());
        let token = tracker.token();
        tracker.spawn("loop", async move { token.cancelled().await });
        parent.cancel();
        tracker.wait().await;
    }
}
