//! # Dispatcher: multiplexes the error feed and the event stream onto the live frame.
//!
//! The [`Dispatcher`] owns the handler registry, the finished-report collaborator and
//! the configuration. [`Dispatcher::run`] borrows a caller-owned [`Terminal`], opens a
//! [`Session`] on it and drives the loop until one of the exit conditions fires.
//!
//! ## High-level architecture
//! ```text
//! run(terminal, errors, events, cancel):
//!   terminal.session()                 hide cursor → open frame      (guard)
//!   loop_token = cancel.child_token()  (+ OS signal listener if configured)
//!   tracker    = Tracker(loop_token.child_token())
//!
//!   loop select! (biased: a ready fatal error wins over buffered events)
//!     ├─ errors.recv()  = Some(e)  ─► Exit::Fatal(e)
//!     ├─ errors.recv()  = None     ─► stop polling the feed, keep looping
//!     ├─ loop_token.cancelled()    ─► Exit::Cancelled
//!     ├─ events.next()  = None     ─► Exit::EndOfStream
//!     ├─ events.next()  = Finished ─► Exit::Finished(ev)
//!     └─ events.next()  = other    ─► registry.dispatch(ctx, ev)   (non-blocking, errors logged)
//!
//! Shutdown path:
//!   Finished:              begin_drain → tracker.wait() → close (in-band) → finished.finish(ev)
//!   EndOfStream/Cancelled: begin_drain → tracker.cancel() → tracker.wait_for(grace)
//!   Fatal:                 tracker.cancel() → return Err(Worker(e))
//!   every path:            Session drop → close frame if still open → show cursor
//! ```
//!
//! ## Rules
//! - Only fatal worker errors and setup failures are returned; handler errors are logged.
//! - The finished collaborator runs at most once, after the frame is closed.
//! - Events are handled in subscription order; a ready fatal error pre-empts buffered events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    config::UiConfig,
    core::{shutdown, tracker::Tracker},
    error::{UiError, WorkerError},
    events::{Event, Subscription},
    handlers::{
        Ctx, Dispatched, FinishedReport, Handler, HandlerRegistry, ProgressHandler, UpdateHandler,
        WriterReport,
    },
    terminal::{Session, Terminal},
};

/// Feed of fatal errors from the worker pipeline.
pub type ErrorFeed = mpsc::Receiver<WorkerError>;

/// Why the loop stopped.
#[derive(Debug)]
enum Exit {
    Fatal(WorkerError),
    EndOfStream,
    Cancelled,
    Finished(Event),
}

/// Coordinates event routing, background updaters and the terminal session lifecycle.
pub struct Dispatcher {
    cfg: UiConfig,
    registry: HandlerRegistry,
    finished: Arc<dyn FinishedReport>,
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in handlers and a stdout report.
    pub fn new(cfg: UiConfig) -> Self {
        Self::builder(cfg).with_default_handlers().build()
    }

    /// Returns a builder for custom handler sets.
    pub fn builder(cfg: UiConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(cfg)
    }

    /// The dispatcher configuration.
    pub fn config(&self) -> &UiConfig {
        &self.cfg
    }

    /// Runs one live session until the terminal event, end of stream, cancellation
    /// or a fatal worker error.
    ///
    /// ### Errors
    /// - [`UiError::Setup`] if the session cannot be opened (nothing else runs).
    /// - [`UiError::Worker`] with the first error received on `errors`.
    pub async fn run(
        &self,
        terminal: &Terminal,
        mut errors: ErrorFeed,
        mut events: Subscription,
        cancel: CancellationToken,
    ) -> Result<(), UiError> {
        let mut session = terminal.session(self.cfg.placement)?;

        let loop_token = cancel.child_token();
        let _stop_listeners = loop_token.clone().drop_guard();
        if self.cfg.cancel_on_signal {
            shutdown::cancel_on_signal(loop_token.clone());
        }
        let tracker = Tracker::new(loop_token.child_token());

        let exit = self
            .drive(&session, &tracker, &mut errors, &mut events, &loop_token)
            .await;
        self.shutdown(&mut session, &tracker, exit).await
    }

    /// The loop proper. Returns as soon as an exit condition fires.
    async fn drive(
        &self,
        session: &Session<'_>,
        tracker: &Tracker,
        errors: &mut ErrorFeed,
        events: &mut Subscription,
        token: &CancellationToken,
    ) -> Exit {
        let ctx = Ctx {
            frame: session.frame(),
            tracker,
            cfg: &self.cfg,
        };
        let mut errors_open = true;

        loop {
            tokio::select! {
                biased;

                maybe = errors.recv(), if errors_open => match maybe {
                    Some(e) => return Exit::Fatal(e),
                    None => {
                        debug!(target: "etui", "error feed closed");
                        errors_open = false;
                    }
                },
                _ = token.cancelled() => return Exit::Cancelled,
                next = events.next() => match next {
                    None => return Exit::EndOfStream,
                    Some(ev) if ev.kind.is_terminal() => return Exit::Finished(ev),
                    Some(ev) => self.route(&ctx, &ev),
                },
            }
        }
    }

    fn route(&self, ctx: &Ctx<'_>, ev: &Event) {
        match self.registry.dispatch(ctx, ev) {
            Dispatched::Handled(_) => {}
            Dispatched::Unclaimed => {
                debug!(target: "etui", kind = ev.kind.as_label(), seq = ev.seq, "no handler for event");
            }
            Dispatched::Failed { handler, error } => {
                error!(
                    target: "etui",
                    kind = ev.kind.as_label(),
                    seq = ev.seq,
                    handler,
                    label = error.as_label(),
                    error = %error,
                    "unable to show event"
                );
            }
        }
    }

    /// Runs the exit-specific part of shutdown. The session guard does the rest on drop.
    async fn shutdown(
        &self,
        session: &mut Session<'_>,
        tracker: &Tracker,
        exit: Exit,
    ) -> Result<(), UiError> {
        match exit {
            Exit::Fatal(e) => {
                tracker.cancel();
                warn!(
                    target: "etui",
                    error = %e,
                    outstanding = tracker.outstanding(),
                    "worker failed; closing without drain"
                );
                Err(UiError::Worker(e))
            }
            Exit::Finished(ev) => {
                // Other updaters may still be painting; the report must not start
                // until the live region is gone.
                session.begin_drain()?;
                tracker.wait().await;
                session.close()?;

                if let Err(e) = self.finished.finish(&ev).await {
                    error!(
                        target: "etui",
                        kind = ev.kind.as_label(),
                        label = e.as_label(),
                        error = %e,
                        "unable to show event"
                    );
                }
                Ok(())
            }
            Exit::EndOfStream | Exit::Cancelled => {
                if matches!(exit, Exit::Cancelled) {
                    info!(target: "etui", "cancelled");
                } else {
                    debug!(target: "etui", "event stream closed before finish");
                }
                session.begin_drain()?;
                tracker.cancel();
                if let Some(grace) = self.cfg.grace_period() {
                    if let Err(stuck) = tracker.wait_for(grace).await {
                        warn!(
                            target: "etui",
                            grace = ?grace,
                            stuck,
                            "updaters still running after grace; closing anyway"
                        );
                    }
                }
                Ok(())
            }
        }
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    cfg: UiConfig,
    handlers: Vec<Arc<dyn Handler>>,
    finished: Option<Arc<dyn FinishedReport>>,
}

impl DispatcherBuilder {
    /// Creates a builder with no handlers.
    pub fn new(cfg: UiConfig) -> Self {
        Self {
            cfg,
            handlers: Vec::new(),
            finished: None,
        }
    }

    /// Adds a handler group. Earlier groups win on overlapping kinds.
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Adds [`ProgressHandler`] and [`UpdateHandler`].
    pub fn with_default_handlers(self) -> Self {
        self.with_handler(Arc::new(ProgressHandler::new()))
            .with_handler(Arc::new(UpdateHandler::new()))
    }

    /// Sets the finished-report collaborator (default: [`WriterReport::stdout`]).
    pub fn with_finished(mut self, finished: Arc<dyn FinishedReport>) -> Self {
        self.finished = Some(finished);
        self
    }

    /// Builds the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: HandlerRegistry::new(self.handlers),
            finished: self
                .finished
                .unwrap_or_else(|| Arc::new(WriterReport::stdout())),
            cfg: self.cfg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::events::{Bus, EventKind};
    use crate::terminal::tests::Capture;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorded(Mutex<Vec<Event>>);

    #[async_trait]
    impl FinishedReport for Recorded {
        async fn finish(&self, event: &Event) -> Result<(), RenderError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Failing(AtomicUsize);

    impl Handler for Failing {
        fn kinds(&self) -> &'static [EventKind] {
            &[EventKind::AppUpdateAvailable]
        }

        fn handle(&self, _ctx: &Ctx<'_>, _event: &Event) -> Result<(), RenderError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(RenderError::UnknownTask("nope".into()))
        }
    }

    #[test]
    fn builder_defaults_register_builtin_groups() {
        let d = Dispatcher::new(UiConfig::default());
        assert!(d.registry.responds_to(EventKind::TaskStarted).is_some());
        assert!(d.registry.responds_to(EventKind::AppUpdateAvailable).is_some());
        assert!(d.registry.responds_to(EventKind::Finished).is_none());
        assert_eq!(d.registry.len(), 2);
    }

    #[tokio::test]
    async fn handler_errors_do_not_stop_the_loop() {
        let failing = Arc::new(Failing::default());
        let report = Arc::new(Recorded::default());
        let d = Dispatcher::builder(UiConfig::default())
            .with_handler(failing.clone())
            .with_finished(report.clone())
            .build();

        let term = Terminal::new(Capture::default());
        let (bus, sub) = Bus::channel();
        let (_err_tx, err_rx) = mpsc::channel(1);
        bus.publish(Event::update_available("1", "2"));
        bus.publish(Event::new(EventKind::TaskStarted));
        bus.publish(Event::update_available("1", "3"));
        bus.publish(Event::finished("ok"));

        d.run(&term, err_rx, sub, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(failing.0.load(Ordering::SeqCst), 2);
        assert_eq!(report.0.lock().unwrap().len(), 1);
        assert_eq!(term.stats().closed_in_band, 1);
    }

    #[tokio::test]
    async fn closed_error_feed_is_not_fatal() {
        let report = Arc::new(Recorded::default());
        let d = Dispatcher::builder(UiConfig::default())
            .with_default_handlers()
            .with_finished(report.clone())
            .build();

        let term = Terminal::new(Capture::default());
        let (bus, sub) = Bus::channel();
        let (err_tx, err_rx) = mpsc::channel::<WorkerError>(1);
        drop(err_tx);

        let publisher = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            bus.publish(Event::finished("late"));
        });

        d.run(&term, err_rx, sub, CancellationToken::new())
            .await
            .unwrap();
        publisher.await.unwrap();
        assert_eq!(report.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ready_error_wins_over_buffered_finish() {
        let report = Arc::new(Recorded::default());
        let d = Dispatcher::builder(UiConfig::default())
            .with_finished(report.clone())
            .build();

        let term = Terminal::new(Capture::default());
        let (bus, sub) = Bus::channel();
        bus.publish(Event::finished("too late"));
        let (err_tx, err_rx) = mpsc::channel::<WorkerError>(1);
        err_tx.send("boom".into()).await.unwrap();

        let err = d
            .run(&term, err_rx, sub, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "ui_worker_failed");
        assert!(report.0.lock().unwrap().is_empty());
        assert_eq!(term.stats().closed_on_release, 1);
    }

    #[tokio::test]
    async fn setup_failure_runs_nothing() {
        let report = Arc::new(Recorded::default());
        let d = Dispatcher::builder(UiConfig::default())
            .with_finished(report.clone())
            .build();

        let term = Terminal::new(Capture::default());
        let _held = term.session(crate::terminal::Placement::FloatForward).unwrap();

        let (bus, sub) = Bus::channel();
        bus.publish(Event::finished("never"));
        let (_err_tx, err_rx) = mpsc::channel(1);

        let err = d
            .run(&term, err_rx, sub, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "ui_setup_failed");
        assert!(report.0.lock().unwrap().is_empty());
    }
}
