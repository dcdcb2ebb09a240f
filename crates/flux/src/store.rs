//! Store - typed state mutated only through reducers
//!
//! A reducer receives a draft copy of the state together with the action
//! and returns the set of fields it changed. An empty set means no change:
//! the draft is discarded and nobody is notified. Otherwise observers see a
//! will-change notification with the original state, the draft replaces the
//! state as a whole, and observers see a did-change notification with the
//! new state.
//!
//! State reads may happen from any thread; writes only happen inside a
//! dispatch. The state lives behind a `RwLock`, so readers never observe a
//! half-applied draft and do not block each other. Reductions are
//! serialized per store, even when the store is registered with several
//! dispatchers; a reducer or observer must not call `handle` on its own
//! store directly (dispatch instead, which defers the action).

use crate::action::{Action, AnyAction};
use crate::change::{ChangeSet, Field, StoreEvent};
use crate::executor::Executor;
use crate::lock;
use crate::observer::{ObserverFn, ObserverList, Subscription};
use crate::registry::Registry;
use crate::worker::{Passthrough, Priority, Token, Worker};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

/// Type-erased reducer; `None` means the action had an unexpected shape
type Reducer<S, F> = Arc<dyn Fn(&mut S, &AnyAction) -> Option<ChangeSet<F>> + Send + Sync>;

pub struct Store<S, F: Field = &'static str> {
    token: Token,
    priority: Priority,
    state: RwLock<S>,
    /// Held for a whole read, reduce, notify and replace cycle
    update: Mutex<()>,
    reducers: RwLock<Registry<Reducer<S, F>>>,
    observers: Arc<ObserverList<S, F>>,
    hooks: RwLock<Vec<(StoreEvent, ObserverFn<S, F>)>>,
}

impl<S, F> Store<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Field,
{
    pub fn new(initial_state: S) -> Self {
        Self::with_priority(0, initial_state)
    }

    pub fn with_priority(priority: Priority, initial_state: S) -> Self {
        Self {
            token: Token::new(),
            priority,
            state: RwLock::new(initial_state),
            update: Mutex::new(()),
            reducers: RwLock::new(Registry::new()),
            observers: ObserverList::new(),
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// A copy of the current state
    pub fn state(&self) -> S {
        lock::read(&self.state).clone()
    }

    /// Read the current state without copying it
    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&lock::read(&self.state))
    }

    /// Associate a reducer with actions of type `A`
    ///
    /// Returns true if it replaced a previously registered reducer.
    pub fn register_reducer<A, R>(&self, reducer: R) -> bool
    where
        A: Action,
        R: Fn(&mut S, &A) -> ChangeSet<F> + Send + Sync + 'static,
    {
        let erased: Reducer<S, F> = Arc::new(move |state: &mut S, action: &AnyAction| {
            action.downcast_ref::<A>().map(|action| reducer(state, action))
        });
        lock::write(&self.reducers)
            .register::<A>(erased)
            .is_some()
    }

    /// Returns false if no reducer was registered for `A`
    pub fn unregister_reducer<A: Action>(&self) -> bool {
        lock::write(&self.reducers).unregister::<A>().is_some()
    }

    pub fn unregister_all_reducers(&self) {
        lock::write(&self.reducers).unregister_all();
    }

    /// Observe every transition of `event`
    ///
    /// The handler runs on the dispatching thread and stays registered while
    /// the returned subscription is alive.
    pub fn add_observer<H>(&self, event: StoreEvent, handler: H) -> Subscription
    where
        H: Fn(&S, &ChangeSet<F>) + Send + Sync + 'static,
    {
        self.observers.subscribe(event, None, Arc::new(handler))
    }

    /// Observe transitions of `event` that touch at least one of `fields`
    pub fn add_filtered_observer<H>(
        &self,
        event: StoreEvent,
        fields: impl Into<ChangeSet<F>>,
        handler: H,
    ) -> Subscription
    where
        H: Fn(&S, &ChangeSet<F>) + Send + Sync + 'static,
    {
        self.observers
            .subscribe(event, Some(fields.into()), Arc::new(handler))
    }

    /// Observe transitions of `event`, delivered through `executor`
    ///
    /// The handler receives copies of the state and changed fields taken at
    /// notification time.
    pub fn add_observer_on<H>(
        &self,
        executor: Arc<dyn Executor>,
        event: StoreEvent,
        filter: Option<ChangeSet<F>>,
        handler: H,
    ) -> Subscription
    where
        H: Fn(&S, &ChangeSet<F>) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let deliver: ObserverFn<S, F> = Arc::new(move |state: &S, changes: &ChangeSet<F>| {
            let handler = Arc::clone(&handler);
            let state = state.clone();
            let changes = changes.clone();
            executor.execute(Box::new(move || handler(&state, &changes)));
        });
        self.observers.subscribe(event, filter, deliver)
    }

    /// Run `hook` after the observers of `event` have been notified
    ///
    /// Hooks belong to the store and live as long as it does.
    pub fn add_change_hook<H>(&self, event: StoreEvent, hook: H)
    where
        H: Fn(&S, &ChangeSet<F>) + Send + Sync + 'static,
    {
        lock::write(&self.hooks).push((event, Arc::new(hook)));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn reduce(&self, reducer: &Reducer<S, F>, action: &AnyAction) {
        let _update = lock::lock(&self.update);
        let original = self.state();
        let mut draft = original.clone();

        let changes = match reducer(&mut draft, action) {
            Some(changes) => changes,
            None => {
                log::warn!(
                    "Store {}: reducer received unexpected action {}",
                    self.token,
                    action.shape_name()
                );
                return;
            }
        };

        if changes.is_empty() {
            log::trace!("Store {}: {} changed nothing", self.token, action.shape_name());
            return;
        }

        log::debug!(
            "Store {}: {} changed {:?}",
            self.token,
            action.shape_name(),
            changes
        );

        self.notify(StoreEvent::WillChange, &original, &changes);
        *lock::write(&self.state) = draft.clone();
        self.notify(StoreEvent::DidChange, &draft, &changes);
    }

    fn notify(&self, event: StoreEvent, state: &S, changes: &ChangeSet<F>) {
        self.observers.notify(event, state, changes);

        let hooks: Vec<ObserverFn<S, F>> = lock::read(&self.hooks)
            .iter()
            .filter(|(hook_event, _)| *hook_event == event)
            .map(|(_, hook)| Arc::clone(hook))
            .collect();
        for hook in hooks {
            hook(state, changes);
        }
    }

    pub(crate) fn subscribe(
        &self,
        event: StoreEvent,
        filter: Option<ChangeSet<F>>,
        handler: ObserverFn<S, F>,
    ) -> Subscription {
        self.observers.subscribe(event, filter, handler)
    }
}

impl<S, F> Worker for Store<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Field,
{
    fn token(&self) -> Token {
        self.token
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn handle(&self, action: AnyAction) -> Passthrough {
        let reducer = lock::read(&self.reducers).resolve(action.shape()).cloned();
        if let Some(reducer) = reducer {
            self.reduce(&reducer, &action);
        }
        Passthrough::Next(action)
    }
}

impl<S: fmt::Debug, F: Field> fmt::Debug for Store<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("token", &self.token)
            .field("priority", &self.priority)
            .field("state", &*lock::read(&self.state))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::executor::SerialQueue;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    struct TestState {
        value: String,
        number: i64,
    }

    impl TestState {
        fn initial() -> Self {
            Self {
                value: "initial".to_string(),
                number: 0,
            }
        }
    }

    #[derive(Debug)]
    struct ChangeValue(String);
    impl Action for ChangeValue {}

    #[derive(Debug)]
    struct ChangeNumber(i64);
    impl Action for ChangeNumber {}

    #[derive(Debug)]
    struct Unrelated;
    impl Action for Unrelated {}

    fn test_store() -> Arc<Store<TestState>> {
        let store: Store<TestState> = Store::new(TestState::initial());
        store.register_reducer(|state: &mut TestState, action: &ChangeValue| {
            if state.value == action.0 {
                return ChangeSet::none();
            }
            state.value = action.0.clone();
            ChangeSet::from(["value"])
        });
        store.register_reducer(|state: &mut TestState, action: &ChangeNumber| {
            state.number = action.0;
            ChangeSet::from(["number"])
        });
        Arc::new(store)
    }

    type Seen = Arc<Mutex<Vec<(TestState, ChangeSet<&'static str>)>>>;

    fn recorder() -> (Seen, impl Fn(&TestState, &ChangeSet<&'static str>) + Send + Sync) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = move |state: &TestState, changes: &ChangeSet<&'static str>| {
            sink.lock().unwrap().push((state.clone(), changes.clone()));
        };
        (seen, handler)
    }

    #[test]
    fn test_reducer_changes_state_and_notifies_fields() {
        let store = test_store();
        let (seen, handler) = recorder();
        let _sub = store.add_observer(StoreEvent::DidChange, handler);

        let result = store.handle(AnyAction::new(ChangeValue("test".into())));

        assert!(result.action().is_some_and(|a| a.is::<ChangeValue>()));
        let expected = TestState {
            value: "test".to_string(),
            number: 0,
        };
        assert_eq!(store.state(), expected);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(expected, ChangeSet::from(["value"]))]
        );
    }

    #[test]
    fn test_will_change_carries_original_state() {
        let store = test_store();
        let (seen, handler) = recorder();
        let _sub = store.add_observer(StoreEvent::WillChange, handler);

        store.handle(AnyAction::new(ChangeNumber(5)));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(TestState::initial(), ChangeSet::from(["number"]))]
        );
        assert_eq!(store.state().number, 5);
    }

    #[test]
    fn test_noop_reducer_does_not_notify() {
        let store = test_store();
        let notifications = Arc::new(AtomicUsize::new(0));
        let will = Arc::clone(&notifications);
        let did = Arc::clone(&notifications);
        let _will = store.add_observer(StoreEvent::WillChange, move |_, _| {
            will.fetch_add(1, Ordering::SeqCst);
        });
        let _did = store.add_observer(StoreEvent::DidChange, move |_, _| {
            did.fetch_add(1, Ordering::SeqCst);
        });

        store.handle(AnyAction::new(ChangeValue("initial".into())));

        assert_eq!(notifications.load(Ordering::SeqCst), 0);
        assert_eq!(store.state(), TestState::initial());
    }

    #[test]
    fn test_unregistered_action_passes_through() {
        let store = test_store();
        let action = AnyAction::new(Unrelated);

        let result = store.handle(action.clone());

        assert!(result.action().is_some_and(|a| a.ptr_eq(&action)));
        assert_eq!(store.state(), TestState::initial());
    }

    #[test]
    fn test_filtered_observer_selectivity() {
        let store = test_store();
        let (seen, handler) = recorder();
        let _sub = store.add_filtered_observer(StoreEvent::DidChange, ["value"], handler);

        store.handle(AnyAction::new(ChangeNumber(1)));
        assert!(seen.lock().unwrap().is_empty());

        store.handle(AnyAction::new(ChangeValue("changed".into())));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_released_subscription_stops_delivery() {
        let store = test_store();
        let (seen, handler) = recorder();
        let sub = store.add_observer(StoreEvent::DidChange, handler);

        store.handle(AnyAction::new(ChangeNumber(1)));
        drop(sub);
        store.handle(AnyAction::new(ChangeNumber(2)));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.observer_count(), 0);
    }

    #[derive(Debug)]
    struct Bump;
    impl Action for Bump {}

    #[test]
    fn test_concurrent_reductions_do_not_lose_updates() {
        let store = test_store();
        store.register_reducer(|state: &mut TestState, _: &Bump| {
            state.number += 1;
            ChangeSet::from(["number"])
        });

        // The same store driven by two independent dispatchers
        let threads: Vec<_> = (0..2)
            .map(|_| {
                let dispatcher = Dispatcher::new();
                dispatcher.register_worker(Arc::clone(&store));
                thread::spawn(move || {
                    for _ in 0..500 {
                        dispatcher.dispatch(Bump);
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(store.state().number, 1000);
    }

    #[test]
    fn test_last_reducer_registration_wins() {
        let store = test_store();
        let replaced = store.register_reducer(|state: &mut TestState, action: &ChangeNumber| {
            state.number = action.0 * 10;
            ChangeSet::from(["number"])
        });
        assert!(replaced);

        store.handle(AnyAction::new(ChangeNumber(2)));
        assert_eq!(store.state().number, 20);
    }

    #[test]
    fn test_unregister_reducer() {
        let store = test_store();
        assert!(store.unregister_reducer::<ChangeNumber>());
        assert!(!store.unregister_reducer::<ChangeNumber>());

        store.handle(AnyAction::new(ChangeNumber(3)));
        assert_eq!(store.state().number, 0);

        store.unregister_all_reducers();
        store.handle(AnyAction::new(ChangeValue("ignored".into())));
        assert_eq!(store.state(), TestState::initial());
    }

    #[test]
    fn test_hooks_run_after_observers() {
        let store = test_store();
        let order = Arc::new(Mutex::new(Vec::new()));
        let from_observer = Arc::clone(&order);
        let from_hook = Arc::clone(&order);
        let _sub = store.add_observer(StoreEvent::DidChange, move |_, _| {
            from_observer.lock().unwrap().push("observer");
        });
        store.add_change_hook(StoreEvent::DidChange, move |state, _| {
            from_hook
                .lock()
                .unwrap()
                .push(if state.number == 4 { "hook" } else { "stale" });
        });

        store.handle(AnyAction::new(ChangeNumber(4)));

        assert_eq!(*order.lock().unwrap(), vec!["observer", "hook"]);
    }

    #[test]
    fn test_observer_may_cancel_itself() {
        let store = test_store();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let sub = store.add_observer(StoreEvent::DidChange, move |_, _| {
            inner.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        store.handle(AnyAction::new(ChangeNumber(1)));

        assert!(slot.lock().unwrap().is_none());
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn test_observer_on_executor() {
        let store = test_store();
        let queue = Arc::new(SerialQueue::new("flux-test-observer").unwrap());
        let (seen, handler) = recorder();
        let _sub = store.add_observer_on(queue.clone(), StoreEvent::DidChange, None, handler);

        store.handle(AnyAction::new(ChangeNumber(8)));
        queue.flush();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.number, 8);
    }

    #[test]
    fn test_store_in_dispatcher() {
        let store = test_store();
        let dispatcher = Dispatcher::new();
        dispatcher.register_worker(Arc::clone(&store));

        dispatcher.dispatch(ChangeValue("dispatched".into()));
        dispatcher.dispatch(ChangeNumber(12));

        assert_eq!(
            store.state(),
            TestState {
                value: "dispatched".to_string(),
                number: 12,
            }
        );
        assert_eq!(store.with_state(|s| s.value.len()), 10);
    }
}
