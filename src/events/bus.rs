//! # Event bus and subscription.
//!
//! [`Bus`] is a thin wrapper around an unbounded [`tokio::sync::mpsc`] channel that provides
//! non-blocking event publishing from many pipeline workers. [`Subscription`]
//! is the single-consumer end read by the dispatcher.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                Consumer (one):
//!   Worker 1 ──┐
//!   Worker 2 ──┼──────► Bus ───────► Subscription ────► Dispatcher loop
//!   Worker N ──┘   (mpsc, unbounded)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Lossless**: every published event is delivered exactly once, in publish order
//!   per producer. A dropped completion would leave its updater running and stall the drain.
//! - **End of stream**: once every `Bus` clone is dropped, buffered events are still
//!   delivered, then [`Subscription::next`] returns `None`.

use tokio::sync::mpsc;
use tracing::trace;

use super::event::Event;

/// Channel for pipeline events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Unbounded**: the subscription buffers everything not yet consumed.
/// - **Cloneable**: cheap to clone; the stream ends when the last clone drops.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::UnboundedSender<Event>,
}

impl Bus {
    /// Creates a bus together with its only subscription.
    pub fn channel() -> (Self, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        (Self { tx }, Subscription { rx })
    }

    /// Publishes an event to the subscription.
    ///
    /// If the subscription is gone (the dispatcher returned), the event is dropped.
    pub fn publish(&self, ev: Event) {
        if let Err(mpsc::error::SendError(ev)) = self.tx.send(ev) {
            trace!(target: "etui", kind = ev.kind.as_label(), "no subscription; event dropped");
        }
    }

    /// True once the subscription has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Finite, single-consumer stream of events.
///
/// Not cloneable and not restartable: once [`next`](Self::next) returned `None`
/// it keeps returning `None`.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Subscription {
    /// Waits for the next event; `None` once every producer is gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn buffered_events_survive_producer_drop() {
        let (bus, mut sub) = Bus::channel();
        bus.publish(Event::new(EventKind::TaskStarted));
        bus.publish(Event::new(EventKind::Finished));
        drop(bus);

        assert_eq!(sub.next().await.map(|e| e.kind), Some(EventKind::TaskStarted));
        assert_eq!(sub.next().await.map(|e| e.kind), Some(EventKind::Finished));
        assert!(sub.next().await.is_none());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn burst_from_slow_consumer_is_not_dropped() {
        let (bus, mut sub) = Bus::channel();
        bus.publish(Event::task_completed("t"));
        for i in 0..5000 {
            bus.publish(Event::task_progress("t", i, None));
        }
        bus.publish(Event::new(EventKind::Finished));
        drop(bus);

        let mut kinds = Vec::new();
        while let Some(ev) = sub.next().await {
            kinds.push(ev.kind);
        }
        assert_eq!(kinds.len(), 5002);
        assert_eq!(kinds.first(), Some(&EventKind::TaskCompleted));
        assert_eq!(kinds.last(), Some(&EventKind::Finished));
    }

    #[test]
    fn publish_after_subscription_drop_is_silent() {
        let (bus, sub) = Bus::channel();
        drop(sub);
        assert!(bus.is_closed());
        bus.publish(Event::new(EventKind::TaskStarted));
    }
}
