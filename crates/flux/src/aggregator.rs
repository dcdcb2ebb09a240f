//! Aggregator - read model composed from several stores
//!
//! An aggregator subscribes to the did-change notifications of the stores
//! registered with it and keeps the latest state of each, keyed by state
//! type. Consumers (typically one per screen) read those snapshots and get a
//! callback whenever one of them changes.
//!
//! Asking for a state type that was never registered is a wiring bug and
//! panics. Dropping the aggregator releases every subscription.

use crate::change::{ChangeSet, Field, StoreEvent};
use crate::lock;
use crate::observer::{ObserverFn, Subscription};
use crate::registry::Registry;
use crate::store::Store;
use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex, RwLock};

type Snapshot = Box<dyn Any + Send + Sync>;
type StateHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;
type ChangeHandler = Box<dyn Fn(&Aggregator) + Send + Sync>;

pub struct Aggregator {
    inner: Arc<Inner>,
}

struct Inner {
    snapshots: RwLock<Registry<Snapshot>>,
    handlers: RwLock<Registry<StateHandler>>,
    subscriptions: Mutex<Registry<Subscription>>,
    change_handler: Option<ChangeHandler>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::from_parts(None)
    }

    /// Aggregator calling `change_handler` after any registered store changed
    ///
    /// The handler receives the aggregator itself. It must not capture the
    /// aggregator, or the two keep each other alive.
    pub fn with_change_handler<H>(change_handler: H) -> Self
    where
        H: Fn(&Aggregator) + Send + Sync + 'static,
    {
        Self::from_parts(Some(Box::new(change_handler)))
    }

    fn from_parts(change_handler: Option<ChangeHandler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                snapshots: RwLock::new(Registry::new()),
                handlers: RwLock::new(Registry::new()),
                subscriptions: Mutex::new(Registry::new()),
                change_handler,
            }),
        }
    }

    /// Start aggregating the state of `store`
    ///
    /// With a `filter`, only changes touching one of those fields refresh the
    /// snapshot. Registering a second store with the same state type replaces
    /// the first one.
    pub fn register<S, F>(&self, store: &Store<S, F>, filter: Option<ChangeSet<F>>)
    where
        S: Clone + Send + Sync + 'static,
        F: Field,
    {
        let weak = Arc::downgrade(&self.inner);
        let observer: ObserverFn<S, F> = Arc::new(move |state: &S, _: &ChangeSet<F>| {
            if let Some(inner) = weak.upgrade() {
                Aggregator { inner }.receive(state);
            }
        });
        let subscription = store.subscribe(StoreEvent::DidChange, filter, observer);

        // Seed after subscribing: a change landing before the seed is already
        // in `store.state()`, one landing after it waits on the table lock.
        {
            let mut snapshots = lock::write(&self.inner.snapshots);
            snapshots.register::<S>(Box::new(store.state()));
        }

        lock::lock(&self.inner.subscriptions).register::<S>(subscription);
        log::debug!(
            "Aggregator: registered store {} for {}",
            store.token(),
            std::any::type_name::<S>()
        );
    }

    /// Register `store` and call `on_change` with each new state
    pub fn register_with<S, F, H>(&self, store: &Store<S, F>, filter: Option<ChangeSet<F>>, on_change: H)
    where
        S: Clone + Send + Sync + 'static,
        F: Field,
        H: Fn(&S) + Send + Sync + 'static,
    {
        self.register_handler(on_change);
        self.register(store, filter);
    }

    /// Associate a change handler with state type `S`
    pub fn register_handler<S, H>(&self, handler: H) -> bool
    where
        S: Send + Sync + 'static,
        H: Fn(&S) + Send + Sync + 'static,
    {
        let erased: StateHandler = Arc::new(move |state: &dyn Any| {
            if let Some(state) = state.downcast_ref::<S>() {
                handler(state);
            }
        });
        lock::write(&self.inner.handlers)
            .register::<S>(erased)
            .is_some()
    }

    pub fn unregister_handler<S: 'static>(&self) -> bool {
        lock::write(&self.inner.handlers).unregister::<S>().is_some()
    }

    /// Latest state of type `S`
    ///
    /// # Panics
    ///
    /// Panics if no store with state type `S` is registered.
    pub fn state<S: Clone + 'static>(&self) -> S {
        self.with_state(S::clone)
    }

    /// Read the latest state of type `S` without copying it
    ///
    /// # Panics
    ///
    /// Panics if no store with state type `S` is registered.
    pub fn with_state<S: 'static, R>(&self, read: impl FnOnce(&S) -> R) -> R {
        let snapshots = lock::read(&self.inner.snapshots);
        match snapshots
            .resolve(TypeId::of::<S>())
            .and_then(|snapshot| snapshot.downcast_ref::<S>())
        {
            Some(state) => read(state),
            None => panic!(
                "Requested unregistered state type: {}",
                std::any::type_name::<S>()
            ),
        }
    }

    pub fn contains<S: 'static>(&self) -> bool {
        lock::read(&self.inner.snapshots).contains::<S>()
    }

    /// Stop aggregating state type `S`, removing its snapshot and handler
    pub fn unregister<S: 'static>(&self) -> bool {
        let subscription = lock::lock(&self.inner.subscriptions).unregister::<S>();
        lock::write(&self.inner.handlers).unregister::<S>();
        let removed = lock::write(&self.inner.snapshots).unregister::<S>().is_some();
        drop(subscription);
        removed
    }

    /// Release every subscription, snapshot and handler
    pub fn unregister_all(&self) {
        lock::lock(&self.inner.subscriptions).unregister_all();
        lock::write(&self.inner.handlers).unregister_all();
        lock::write(&self.inner.snapshots).unregister_all();
    }

    fn receive<S: Clone + Send + Sync + 'static>(&self, state: &S) {
        // A late notification for an unregistered type must not resurrect it
        {
            let mut snapshots = lock::write(&self.inner.snapshots);
            if !snapshots.contains::<S>() {
                return;
            }
            snapshots.register::<S>(Box::new(state.clone()));
        }

        let handler = lock::read(&self.inner.handlers)
            .resolve(TypeId::of::<S>())
            .cloned();
        if let Some(handler) = handler {
            handler(state as &dyn Any);
        }

        if let Some(change_handler) = &self.inner.change_handler {
            change_handler(self);
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
