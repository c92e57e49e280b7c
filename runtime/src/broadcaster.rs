//! Fan-out of status updates to per-topic subscribers.
//!
//! The broadcaster knows nothing about WebSockets: the transport adapts a
//! connection to a [`StatusSink`] and registers it. Each subscriber filters
//! on an optional floor topic and an optional lift topic; an update is
//! delivered to every subscriber whose matching topic equals the update's
//! id.
//!
//! # Delivery contract
//!
//! Best-effort, fire-and-forget. [`StatusBroadcaster::broadcast`] pushes
//! onto a bounded channel; a full channel throttles publishers, which is
//! acceptable at simulation scale. The run loop delivers to each matching
//! subscriber on its own task under that subscriber's write gate, so two
//! updates to one subscriber never interleave on the wire and a stalled
//! subscriber never wedges the others. A failed write unregisters the
//! subscriber and closes its sink.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Which entity kind an update (or a subscription) refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    /// Floor updates, keyed by floor number.
    Floor,
    /// Lift updates, keyed by lift id.
    Lift,
}

/// A status update pushed to subscribed observers.
///
/// Wire shape: `{"type": "lift", "id": "…", "status": "Available",
/// "currentFloor": 2}`; `currentFloor` is omitted for floor updates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Update kind.
    #[serde(rename = "type")]
    pub kind: TopicKind,
    /// Floor number or lift id, as a string topic.
    pub id: String,
    /// Status label.
    pub status: String,
    /// Current floor, for lift updates.
    #[serde(rename = "currentFloor", skip_serializing_if = "Option::is_none")]
    pub current_floor: Option<u32>,
}

impl StatusUpdate {
    /// Build a lift-topic update.
    #[must_use]
    pub fn lift(id: impl ToString, status: impl Into<String>, current_floor: Option<u32>) -> Self {
        Self {
            kind: TopicKind::Lift,
            id: id.to_string(),
            status: status.into(),
            current_floor,
        }
    }

    /// Build a floor-topic update.
    #[must_use]
    pub fn floor(number: u32, status: impl Into<String>) -> Self {
        Self {
            kind: TopicKind::Floor,
            id: number.to_string(),
            status: status.into(),
            current_floor: None,
        }
    }
}

/// Errors raised by a subscriber's sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The write failed; the subscriber will be dropped.
    #[error("subscriber write failed: {0}")]
    Write(String),

    /// The connection is already gone.
    #[error("subscriber connection closed")]
    Closed,
}

/// One subscriber's outbound channel.
///
/// The transport implements this over its connection; `send` failures cause
/// the broadcaster to unregister the subscriber and call `close`.
pub trait StatusSink: Send + Sync {
    /// Write one update to the subscriber.
    fn send(&self, update: StatusUpdate) -> BoxFuture<'_, Result<(), SinkError>>;

    /// Tear the connection down. Best effort.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Opaque subscriber handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct Topics {
    floor: Option<String>,
    lift: Option<String>,
}

struct Subscriber {
    id: SubscriberId,
    topics: Mutex<Topics>,
    sink: Arc<dyn StatusSink>,
    /// Serialises writes to this subscriber across delivery tasks.
    write_gate: tokio::sync::Mutex<()>,
}

impl Subscriber {
    fn matches(&self, update: &StatusUpdate) -> bool {
        let topics = self.topics.lock().expect("subscriber topics lock poisoned");
        match update.kind {
            TopicKind::Floor => topics.floor.as_deref() == Some(update.id.as_str()),
            TopicKind::Lift => topics.lift.as_deref() == Some(update.id.as_str()),
        }
    }
}

#[derive(Default)]
struct Registry {
    subscribers: Mutex<HashMap<SubscriberId, Arc<Subscriber>>>,
}

impl Registry {
    fn remove(&self, id: SubscriberId) -> Option<Arc<Subscriber>> {
        self.subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .remove(&id)
    }

    fn matching(&self, update: &StatusUpdate) -> Vec<Arc<Subscriber>> {
        self.subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .values()
            .filter(|subscriber| subscriber.matches(update))
            .cloned()
            .collect()
    }
}

/// Topic-filtered status fan-out.
pub struct StatusBroadcaster {
    registry: Arc<Registry>,
    tx: mpsc::Sender<StatusUpdate>,
}

impl StatusBroadcaster {
    /// Create a broadcaster with a bounded channel of `depth`, together with
    /// the run loop that drains it. Spawn the runner once at startup.
    #[must_use]
    pub fn new(depth: usize) -> (Arc<Self>, BroadcastRunner) {
        let (tx, rx) = mpsc::channel(depth);
        let registry = Arc::new(Registry::default());
        let broadcaster = Arc::new(Self {
            registry: Arc::clone(&registry),
            tx,
        });
        (broadcaster, BroadcastRunner { registry, rx })
    }

    /// Register a new subscriber with no topics yet.
    pub fn register(&self, sink: Arc<dyn StatusSink>) -> SubscriberId {
        let subscriber = Arc::new(Subscriber {
            id: SubscriberId::new(),
            topics: Mutex::new(Topics::default()),
            sink,
            write_gate: tokio::sync::Mutex::new(()),
        });
        let id = subscriber.id;
        self.registry
            .subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .insert(id, subscriber);
        info!(subscriber = %id, "status subscriber registered");
        id
    }

    /// Point the subscriber's floor topic at `floor_number`. Returns `false`
    /// for an unknown subscriber.
    pub fn subscribe_floor(&self, id: SubscriberId, floor_number: u32) -> bool {
        self.set_topic(id, TopicKind::Floor, floor_number.to_string())
    }

    /// Point the subscriber's lift topic at `lift_id`. Returns `false` for
    /// an unknown subscriber.
    pub fn subscribe_lift(&self, id: SubscriberId, lift_id: impl ToString) -> bool {
        self.set_topic(id, TopicKind::Lift, lift_id.to_string())
    }

    fn set_topic(&self, id: SubscriberId, kind: TopicKind, topic: String) -> bool {
        let subscribers = self
            .registry
            .subscribers
            .lock()
            .expect("subscriber registry lock poisoned");
        let Some(subscriber) = subscribers.get(&id) else {
            return false;
        };
        let mut topics = subscriber
            .topics
            .lock()
            .expect("subscriber topics lock poisoned");
        match kind {
            TopicKind::Floor => topics.floor = Some(topic),
            TopicKind::Lift => topics.lift = Some(topic),
        }
        true
    }

    /// Remove a subscriber and close its sink.
    pub async fn unregister(&self, id: SubscriberId) {
        if let Some(subscriber) = self.registry.remove(id) {
            subscriber.sink.close().await;
            info!(subscriber = %id, "status subscriber unregistered");
        }
    }

    /// Queue an update for delivery. Waits while the channel is full; a slow
    /// broadcaster thus throttles its publishers rather than dropping
    /// updates.
    pub async fn broadcast(&self, update: StatusUpdate) {
        if self.tx.send(update).await.is_err() {
            debug!("broadcast channel closed, dropping update");
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .subscribers
            .lock()
            .expect("subscriber registry lock poisoned")
            .len()
    }
}

/// Drains the broadcast channel and delivers updates to subscribers.
pub struct BroadcastRunner {
    registry: Arc<Registry>,
    rx: mpsc::Receiver<StatusUpdate>,
}

impl BroadcastRunner {
    /// Run until the shutdown signal flips or every sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("status broadcaster shutting down");
                        return;
                    }
                }
                update = self.rx.recv() => {
                    let Some(update) = update else {
                        debug!("broadcast channel closed, run loop exiting");
                        return;
                    };
                    self.deliver(update);
                }
            }
        }
    }

    /// Fan one update out to every matching subscriber, each on its own
    /// task so a stalled connection cannot block the rest.
    fn deliver(&self, update: StatusUpdate) {
        for subscriber in self.registry.matching(&update) {
            let registry = Arc::clone(&self.registry);
            let update = update.clone();
            tokio::spawn(async move {
                let _gate = subscriber.write_gate.lock().await;
                if let Err(error) = subscriber.sink.send(update).await {
                    warn!(subscriber = %subscriber.id, %error, "dropping status subscriber");
                    registry.remove(subscriber.id);
                    subscriber.sink.close().await;
                }
            });
        }
    }
}
