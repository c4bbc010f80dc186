//! Application-wide topic bus and synchronous listener lists
//!
//! [`SelectionBus`] connects components that have no structural relationship
//! (the results grid and the detail tabs). Delivery is scheduled on a
//! dispatcher task rather than invoked inside `publish`, so a handler may
//! publish or subscribe without re-entering the bus.
//!
//! [`Listeners`] is the direct, synchronous counterpart used for parent/child
//! notifications such as filter changes and loading signals.

use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::model::SelectionEvent;

/// A typed topic on the bus
pub trait Topic: 'static {
    type Payload: Send + Sync + 'static;

    /// Name used in logs
    const NAME: &'static str;
}

/// A boat was selected somewhere in the dashboard
pub struct BoatSelected;

impl Topic for BoatSelected {
    type Payload = SelectionEvent;
    const NAME: &'static str = "boat-selected";
}

type Payload = Arc<dyn Any + Send + Sync>;
type Handler = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

struct HandlerEntry {
    id: u64,
    active: Arc<AtomicBool>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: AHashMap<TypeId, Vec<HandlerEntry>>,
}

enum Dispatch {
    Deliver {
        topic: &'static str,
        payload: Payload,
        handlers: Vec<(Arc<AtomicBool>, Handler)>,
    },
    Flush(oneshot::Sender<()>),
}

/// Process-wide publish/subscribe channel.
///
/// Cloning is cheap; clones share subscribers and the dispatcher task.
/// A handler that panics is logged and skipped, the remaining handlers
/// still receive the payload. A component that both publishes and
/// subscribes to a topic receives its own publishes.
#[derive(Clone)]
pub struct SelectionBus {
    registry: Arc<Mutex<Registry>>,
    queue: mpsc::UnboundedSender<Dispatch>,
}

impl SelectionBus {
    /// Create a bus and spawn its dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(rx));

        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            queue,
        }
    }

    /// Register a handler for every future publish on `T`
    pub fn subscribe<T: Topic>(
        &self,
        handler: impl Fn(&T::Payload) + Send + Sync + 'static,
    ) -> Subscription {
        let handler: Handler = Arc::new(move |payload: &(dyn Any + Send + Sync)| {
            if let Some(payload) = payload.downcast_ref::<T::Payload>() {
                handler(payload);
            }
        });
        let active = Arc::new(AtomicBool::new(true));

        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .topics
            .entry(TypeId::of::<T>())
            .or_default()
            .push(HandlerEntry {
                id,
                active: active.clone(),
                handler,
            });
        drop(registry);

        debug!(topic = T::NAME, subscription = id, "Subscribed");

        Subscription {
            id,
            topic: TypeId::of::<T>(),
            topic_name: T::NAME,
            active,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Publish a payload to the current subscribers of `T`.
    ///
    /// With no subscribers this is a no-op; the payload is never replayed to
    /// handlers that register later.
    pub fn publish<T: Topic>(&self, payload: T::Payload) {
        let handlers: Vec<(Arc<AtomicBool>, Handler)> = {
            let registry = self.registry.lock();
            registry
                .topics
                .get(&TypeId::of::<T>())
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| (entry.active.clone(), entry.handler.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        if handlers.is_empty() {
            trace!(topic = T::NAME, "No subscribers, publish dropped");
            return;
        }

        let dispatch = Dispatch::Deliver {
            topic: T::NAME,
            payload: Arc::new(payload),
            handlers,
        };
        if self.queue.send(dispatch).is_err() {
            warn!(topic = T::NAME, "Bus dispatcher has stopped, publish dropped");
        }
    }

    /// Resolve once every publish issued before this call has been delivered
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.queue.send(Dispatch::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Number of live subscriptions on `T`
    pub fn subscriber_count<T: Topic>(&self) -> usize {
        self.registry
            .lock()
            .topics
            .get(&TypeId::of::<T>())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for SelectionBus {
    fn default() -> Self {
        Self::new()
    }
}

async fn dispatch_loop(mut rx: mpsc::UnboundedReceiver<Dispatch>) {
    while let Some(dispatch) = rx.recv().await {
        match dispatch {
            Dispatch::Deliver { topic, payload, handlers } => {
                for (active, handler) in handlers {
                    // Unsubscribed between publish and dispatch
                    if !active.load(Ordering::Acquire) {
                        continue;
                    }
                    let delivered =
                        panic::catch_unwind(AssertUnwindSafe(|| handler(payload.as_ref())));
                    if delivered.is_err() {
                        warn!(topic, "Subscriber panicked, continuing delivery");
                    }
                }
            }
            Dispatch::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Bus dispatcher stopped");
}

/// Handle to a bus subscription.
///
/// Dropping the handle unsubscribes.
pub struct Subscription {
    id: u64,
    topic: TypeId,
    topic_name: &'static str,
    active: Arc<AtomicBool>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Stop receiving publishes. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock();
            if let Some(entries) = registry.topics.get_mut(&self.topic) {
                entries.retain(|entry| entry.id != self.id);
            }
        }
        debug!(topic = self.topic_name, subscription = self.id, "Unsubscribed");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic_name)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Identifier returned by [`Listeners::on`]
pub type ListenerId = u64;

type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

/// Synchronous listener list.
///
/// `emit` snapshots the listeners and releases the lock before calling them,
/// so a listener may register or remove listeners while being called.
pub struct Listeners<T> {
    listeners: Mutex<Vec<(ListenerId, Arc<ListenerFn<T>>)>>,
    next_id: AtomicU64,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn on(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a listener; unknown ids are ignored
    pub fn off(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Arc<ListenerFn<T>>> = {
            let guard = self.listeners.lock();
            guard.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for cb in snapshot {
            cb(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
