//! # Event Bus
//!
//! A publish/subscribe primitive that any component can hold by composition.
//!
//! ## Key Types
//!
//! - [`EventBus`]: named events with ordered, synchronous delivery.
//! - [`SubscriptionHandle`]: removes one subscription, idempotently.
//! - [`Listener`]: a subscriber identity. Every subscription made through
//!   [`Listener::listen_to`] is remembered so that [`Listener::stop_listening`] can
//!   release all of them at once, whichever bus they live on.
//!
//! ## Delivery Rules
//!
//! - `trigger` runs every callback registered for the name, in registration order,
//!   on the caller's task, then every `"all"` callback.
//! - The callback list is snapshotted before delivery and no lock is held while a
//!   callback runs, so callbacks may subscribe, unsubscribe or trigger freely.
//! - A subscription removed during a trigger is skipped for the rest of it.
//! - A panicking callback is logged and the remaining callbacks still run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{trace, warn};

/// Name that receives every event triggered on a bus.
pub const ALL: &str = "all";

static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(1);

/// Locks a mutex, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Payloads that know their own event name.
pub trait Event: Send + Sync + 'static {
    fn name(&self) -> &str;
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscription<E> {
    id: u64,
    callback: Callback<E>,
    active: Arc<AtomicBool>,
    once: bool,
}

struct Registry<E> {
    next_id: u64,
    by_name: HashMap<String, Vec<Subscription<E>>>,
}

struct BusInner<E> {
    id: u64,
    registry: Mutex<Registry<E>>,
}

/// Type-erased removal, so handles of different payload types can share a list.
trait Detach: Send + Sync {
    fn detach(&self, name: &str, id: u64);
}

impl<E: 'static> Detach for BusInner<E> {
    fn detach(&self, name: &str, id: u64) {
        let mut registry = lock(&self.registry);
        if let Some(subs) = registry.by_name.get_mut(name) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                registry.by_name.remove(name);
            }
        }
    }
}

/// Removes a single subscription.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u64,
    bus_id: u64,
    name: String,
    active: Arc<AtomicBool>,
    bus: Weak<dyn Detach>,
}

impl SubscriptionHandle {
    /// Detaches the callback. Calling it again, or after the bus is gone, is a no-op.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(bus) = self.bus.upgrade() {
                bus.detach(&self.name, self.id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn event_name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("bus_id", &self.bus_id)
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Named publish/subscribe channel carrying payloads of type `E`.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
                registry: Mutex::new(Registry {
                    next_id: 1,
                    by_name: HashMap::new(),
                }),
            }),
        }
    }

    /// Registers `callback` for `name`. Nothing is invoked synchronously.
    pub fn on<F>(&self, name: &str, callback: F) -> SubscriptionHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(name, Arc::new(callback), false)
    }

    /// Like [`on`](Self::on), but the subscription removes itself after its first call.
    pub fn once<F>(&self, name: &str, callback: F) -> SubscriptionHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(name, Arc::new(callback), true)
    }

    pub fn off(&self, handle: &SubscriptionHandle) {
        handle.unsubscribe();
    }

    /// Delivers `event` to the subscribers of `name`, then to `"all"` subscribers.
    pub fn trigger(&self, name: &str, event: &E) {
        let targets = {
            let registry = lock(&self.inner.registry);
            let mut targets: Vec<(u64, String, Callback<E>, Arc<AtomicBool>, bool)> = Vec::new();
            let mut collect = |key: &str| {
                if let Some(subs) = registry.by_name.get(key) {
                    targets.extend(subs.iter().map(|s| {
                        (s.id, key.to_string(), s.callback.clone(), s.active.clone(), s.once)
                    }));
                }
            };
            collect(name);
            if name != ALL {
                collect(ALL);
            }
            targets
        };

        trace!(bus_id = self.inner.id, event = name, subscribers = targets.len(), "Trigger");

        for (id, key, callback, active, once) in targets {
            if once {
                if !active.swap(false, Ordering::SeqCst) {
                    continue;
                }
                self.inner.detach(&key, id);
            } else if !active.load(Ordering::SeqCst) {
                continue;
            }

            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(bus_id = self.inner.id, event = name, %reason, "Subscriber panicked");
            }
        }
    }

    /// Number of live subscriptions for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        lock(&self.inner.registry)
            .by_name
            .get(name)
            .map_or(0, Vec::len)
    }

    pub fn downgrade(&self) -> WeakEventBus<E> {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    fn subscribe(&self, name: &str, callback: Callback<E>, once: bool) -> SubscriptionHandle {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut registry = lock(&self.inner.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .by_name
                .entry(name.to_string())
                .or_default()
                .push(Subscription {
                    id,
                    callback,
                    active: active.clone(),
                    once,
                });
            id
        };
        let bus: Weak<dyn Detach> = Arc::downgrade(&self.inner) as Weak<dyn Detach>;
        SubscriptionHandle {
            id,
            bus_id: self.inner.id,
            name: name.to_string(),
            active,
            bus,
        }
    }
}

impl<E: Event> EventBus<E> {
    /// Triggers `event` under its own name.
    pub fn emit(&self, event: &E) {
        self.trigger(event.name(), event);
    }
}

/// Non-owning reference to an [`EventBus`], used by callbacks that would
/// otherwise keep their own emitter alive.
pub struct WeakEventBus<E> {
    inner: Weak<BusInner<E>>,
}

impl<E> Clone for WeakEventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E> WeakEventBus<E> {
    pub fn upgrade(&self) -> Option<EventBus<E>> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

/// A subscriber identity.
///
/// Subscriptions made through a `Listener` can be released together, which is
/// how views detach from the models they observe when they are torn down.
#[derive(Clone, Default)]
pub struct Listener {
    handles: Arc<Mutex<Vec<SubscriptionHandle>>>,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `name` on `bus` under this identity.
    pub fn listen_to<E, F>(&self, bus: &EventBus<E>, name: &str, callback: F) -> SubscriptionHandle
    where
        E: 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handle = bus.on(name, callback);
        self.remember(handle.clone());
        handle
    }

    pub fn listen_to_once<E, F>(
        &self,
        bus: &EventBus<E>,
        name: &str,
        callback: F,
    ) -> SubscriptionHandle
    where
        E: 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handle = bus.once(name, callback);
        self.remember(handle.clone());
        handle
    }

    /// Releases every subscription made under this identity.
    pub fn stop_listening(&self) {
        let handles = std::mem::take(&mut *lock(&self.handles));
        for handle in &handles {
            handle.unsubscribe();
        }
    }

    /// Releases only the subscriptions this identity holds on `bus`.
    pub fn stop_listening_to<E: 'static>(&self, bus: &EventBus<E>) {
        let released: Vec<SubscriptionHandle> = {
            let mut handles = lock(&self.handles);
            let (released, kept) = std::mem::take(&mut *handles)
                .into_iter()
                .partition(|h| h.bus_id == bus.id());
            *handles = kept;
            released
        };
        for handle in &released {
            handle.unsubscribe();
        }
    }

    /// Number of subscriptions still live under this identity.
    pub fn subscription_count(&self) -> usize {
        lock(&self.handles).iter().filter(|h| h.is_active()).count()
    }

    fn remember(&self, handle: SubscriptionHandle) {
        let mut handles = lock(&self.handles);
        handles.retain(SubscriptionHandle::is_active);
        handles.push(handle);
    }
}
