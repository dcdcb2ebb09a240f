//! Change observers and subscriptions
//!
//! Every store and repository owns its own observer list (subscription id ->
//! callback). There is no process-wide notification bus: payloads are typed
//! and delivered directly by the owner.

use crate::change::{ChangeSet, Field, StoreEvent};
use crate::lock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Callback receiving the state and the fields that changed
pub type ObserverFn<S, F> = Arc<dyn Fn(&S, &ChangeSet<F>) + Send + Sync>;

struct Entry<S, F: Field> {
    event: StoreEvent,
    filter: Option<ChangeSet<F>>,
    handler: ObserverFn<S, F>,
}

impl<S, F: Field> Entry<S, F> {
    fn accepts(&self, event: StoreEvent, changes: &ChangeSet<F>) -> bool {
        self.event == event
            && match &self.filter {
                Some(filter) => filter.intersects(changes),
                None => true,
            }
    }
}

/// Subscription id -> callback, owned by a store or repository
pub(crate) struct ObserverList<S, F: Field> {
    next_id: AtomicU64,
    entries: Mutex<BTreeMap<u64, Entry<S, F>>>,
}

impl<S: 'static, F: Field> ObserverList<S, F> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(BTreeMap::new()),
        })
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        event: StoreEvent,
        filter: Option<ChangeSet<F>>,
        handler: ObserverFn<S, F>,
    ) -> Subscription {
        // An empty filter observes everything
        let filter = filter.filter(|fields| !fields.is_empty());
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock::lock(&self.entries).insert(
            id,
            Entry {
                event,
                filter,
                handler,
            },
        );

        let source: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription { id, source }
    }

    /// Invoke every observer of `event` whose filter matches `changes`
    ///
    /// Callbacks run after the list lock is released, so a callback may drop
    /// its own subscription.
    pub(crate) fn notify(&self, event: StoreEvent, state: &S, changes: &ChangeSet<F>) {
        let handlers: Vec<ObserverFn<S, F>> = lock::lock(&self.entries)
            .values()
            .filter(|entry| entry.accepts(event, changes))
            .map(|entry| Arc::clone(&entry.handler))
            .collect();

        for handler in handlers {
            handler(state, changes);
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock::lock(&self.entries).len()
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);

    fn is_subscribed(&self, id: u64) -> bool;
}

impl<S: 'static, F: Field> Unsubscribe for ObserverList<S, F> {
    fn unsubscribe(&self, id: u64) {
        lock::lock(&self.entries).remove(&id);
    }

    fn is_subscribed(&self, id: u64) -> bool {
        lock::lock(&self.entries).contains_key(&id)
    }
}

/// Handle to a registered observer
///
/// The observer stays registered exactly as long as this handle lives;
/// dropping it unregisters the callback. The handle does not keep the
/// observed store alive.
#[must_use = "dropping a subscription unregisters the observer"]
pub struct Subscription {
    id: u64,
    source: Weak<dyn Unsubscribe>,
}

impl Subscription {
    /// Unregister the observer now
    pub fn cancel(self) {
        drop(self);
    }

    /// Keep the subscription alive in a collection owned by the caller
    pub fn store_in(self, subscriptions: &mut Vec<Subscription>) {
        subscriptions.push(self);
    }

    /// False once the observed store is gone
    pub fn is_active(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.is_subscribed(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.unsubscribe(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
