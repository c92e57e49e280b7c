//! In-process publish/subscribe for domain events.
//!
//! The bus maps an [`EventKind`] to an ordered list of handlers. Publishing
//! spawns one task per subscribed handler and returns immediately; the
//! publisher never waits for handlers, and a failing handler cannot affect
//! delivery to the others.
//!
//! # Guarantees
//!
//! - Subscribe/unsubscribe are atomic with respect to publish: a concurrent
//!   publish sees the handler list before or after the mutation, never torn.
//! - Every handler subscribed at the instant of publish receives the event
//!   exactly once.
//! - No ordering across kinds, and no ordering across publishes of the same
//!   kind: each delivery is its own task.
//!
//! # Failure
//!
//! A handler error is logged with the handler name and event kind, and that
//! is the end of it: no retry, no dead-lettering.

use crate::event::{EventKind, LiftEvent};
use crate::repository::RepositoryError;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::warn;

/// Error returned by an event handler.
///
/// The bus only logs these; the taxonomy exists so handlers can propagate
/// repository failures with `?`.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A repository call inside the handler failed.
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),

    /// Anything else worth logging.
    #[error("{0}")]
    Other(String),
}

/// A subscriber on the bus.
///
/// Handlers are pure consumers: the event payload carries all context, and
/// the returned future owns its captures (implementations clone their `Arc`
/// dependencies into it), so the bus can run it on a detached task.
pub trait EventHandler: Send + Sync {
    /// Stable name, used for unsubscription and in failure logs.
    fn name(&self) -> &str;

    /// Consume one event.
    fn handle(&self, event: LiftEvent) -> BoxFuture<'static, Result<(), HandlerError>>;
}

/// Publish/subscribe port for domain events.
pub trait EventBus: Send + Sync {
    /// Append `handler` to the list for `kind`.
    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>);

    /// Remove the handler registered under `name` for `kind`, if present.
    fn unsubscribe(&self, kind: EventKind, name: &str);

    /// Deliver `event` to every handler subscribed to its kind, each on its
    /// own task. Returns without waiting for any handler.
    fn publish(&self, event: LiftEvent);
}

/// The in-process bus implementation.
///
/// Handler lists live behind an `RwLock`; publish snapshots the list under
/// the read lock and releases it before spawning, so a slow handler never
/// holds up subscription changes.
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers subscribed to `kind`. Mostly useful in tests.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .expect("event bus lock poisoned")
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl EventBus for InMemoryEventBus {
    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().expect("event bus lock poisoned");
        handlers.entry(kind).or_default().push(handler);
    }

    fn unsubscribe(&self, kind: EventKind, name: &str) {
        let mut handlers = self.handlers.write().expect("event bus lock poisoned");
        if let Some(list) = handlers.get_mut(&kind) {
            list.retain(|handler| handler.name() != name);
        }
    }

    fn publish(&self, event: LiftEvent) {
        let kind = event.kind();
        let snapshot: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().expect("event bus lock poisoned");
            handlers.get(&kind).cloned().unwrap_or_default()
        };

        for handler in snapshot {
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(error) = handler.handle(event).await {
                    warn!(handler = handler.name(), %kind, %error, "event handler failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting {
        name: &'static str,
        seen: Arc<AtomicUsize>,
        fail: bool,
    }

    impl EventHandler for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn handle(&self, _event: LiftEvent) -> BoxFuture<'static, Result<(), HandlerError>> {
            let seen = Arc::clone(&self.seen);
            let fail = self.fail;
            Box::pin(async move {
                seen.fetch_add(1, Ordering::SeqCst);
                if fail {
                    Err(HandlerError::Other("boom".into()))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn requested() -> LiftEvent {
        LiftEvent::LiftRequested {
            floor_number: 1,
            direction: Direction::Up,
        }
    }

    async fn settle() {
        // Give spawned handler tasks a chance to run.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn every_subscribed_handler_receives_the_event_once() {
        let bus = InMemoryEventBus::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            EventKind::LiftRequested,
            Arc::new(Counting { name: "a", seen: Arc::clone(&a), fail: false }),
        );
        bus.subscribe(
            EventKind::LiftRequested,
            Arc::new(Counting { name: "b", seen: Arc::clone(&b), fail: false }),
        );

        bus.publish(requested());
        settle().await;

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handlers_only_see_their_kind() {
        let bus = InMemoryEventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            EventKind::FloorAtCapacity,
            Arc::new(Counting { name: "cap", seen: Arc::clone(&seen), fail: false }),
        );

        bus.publish(requested());
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn a_failing_handler_does_not_block_the_others() {
        let bus = InMemoryEventBus::new();
        let ok = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            EventKind::LiftRequested,
            Arc::new(Counting { name: "bad", seen: Arc::new(AtomicUsize::new(0)), fail: true }),
        );
        bus.subscribe(
            EventKind::LiftRequested,
            Arc::new(Counting { name: "good", seen: Arc::clone(&ok), fail: false }),
        );

        bus.publish(requested());
        settle().await;

        assert_eq!(ok.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_removes_by_name() {
        let bus = InMemoryEventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            EventKind::LiftRequested,
            Arc::new(Counting { name: "gone", seen: Arc::clone(&seen), fail: false }),
        );
        assert_eq!(bus.handler_count(EventKind::LiftRequested), 1);

        bus.unsubscribe(EventKind::LiftRequested, "gone");
        assert_eq!(bus.handler_count(EventKind::LiftRequested), 0);

        bus.publish(requested());
        settle().await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
