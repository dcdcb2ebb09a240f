//! Endware - read-only reactions tied to a store
//!
//! An endware runs handlers with the linked store's current state after the
//! store has reduced the action (register it after the store, or with a
//! larger priority). It never changes the action and never stops it.

use crate::action::{Action, AnyAction};
use crate::change::Field;
use crate::lock;
use crate::registry::Registry;
use crate::store::Store;
use crate::worker::{Passthrough, Priority, Token, Worker};
use std::sync::{Arc, RwLock};

/// Returns false when the action had an unexpected shape
type Handler<S> = Arc<dyn Fn(&AnyAction, &S) -> bool + Send + Sync>;

pub struct Endware<S, F: Field = &'static str> {
    token: Token,
    priority: Priority,
    store: Arc<Store<S, F>>,
    handlers: RwLock<Registry<Handler<S>>>,
}

impl<S, F> Endware<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Field,
{
    /// Endware sharing the store's priority
    pub fn new(store: Arc<Store<S, F>>) -> Self {
        let priority = store.priority();
        Self::with_priority(priority, store)
    }

    pub fn with_priority(priority: Priority, store: Arc<Store<S, F>>) -> Self {
        Self {
            token: Token::new(),
            priority,
            store,
            handlers: RwLock::new(Registry::new()),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn store(&self) -> &Arc<Store<S, F>> {
        &self.store
    }

    /// Run `handler` with the store state whenever an `A` passes
    pub fn register_handler<A, H>(&self, handler: H) -> bool
    where
        A: Action,
        H: Fn(&A, &S) + Send + Sync + 'static,
    {
        let erased: Handler<S> = Arc::new(move |action: &AnyAction, state: &S| {
            match action.downcast_ref::<A>() {
                Some(typed) => {
                    handler(typed, state);
                    true
                }
                None => false,
            }
        });
        lock::write(&self.handlers)
            .register::<A>(erased)
            .is_some()
    }

    pub fn unregister_handler<A: Action>(&self) -> bool {
        lock::write(&self.handlers).unregister::<A>().is_some()
    }

    pub fn unregister_all_handlers(&self) {
        lock::write(&self.handlers).unregister_all();
    }
}

impl<S, F> Worker for Endware<S, F>
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
        let handler = lock::read(&self.handlers).resolve(action.shape()).cloned();
        if let Some(handler) = handler {
            let state = self.store.state();
            if !handler(&action, &state) {
                log::warn!(
                    "Endware {}: handler received unexpected action {}",
                    self.token,
                    action.shape_name()
                );
            }
        }
        Passthrough::Next(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeSet;
    use crate::dispatcher::Dispatcher;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default)]
    struct Cart {
        items: Vec<String>,
    }

    #[derive(Debug)]
    struct AddItem(String);
    impl Action for AddItem {}

    #[derive(Debug)]
    struct Checkout;
    impl Action for Checkout {}

    #[test]
    fn test_endware_sees_reduced_state() {
        let store: Arc<Store<Cart>> = Arc::new(Store::new(Cart::default()));
        store.register_reducer(|cart: &mut Cart, action: &AddItem| {
            cart.items.push(action.0.clone());
            ChangeSet::from(["items"])
        });

        let endware = Arc::new(Endware::new(Arc::clone(&store)));
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        endware.register_handler(move |action: &AddItem, cart: &Cart| {
            sink.lock()
                .unwrap()
                .push(format!("{} -> {}", action.0, cart.items.len()));
        });

        let dispatcher = Dispatcher::new();
        dispatcher.register_worker(Arc::clone(&store));
        dispatcher.register_worker(Arc::clone(&endware));

        dispatcher.dispatch(AddItem("apple".into()));
        dispatcher.dispatch(Checkout);
        dispatcher.dispatch(AddItem("pear".into()));

        assert_eq!(*observed.lock().unwrap(), vec!["apple -> 1", "pear -> 2"]);
    }

    #[test]
    fn test_endware_never_stops() {
        let store: Arc<Store<Cart>> = Arc::new(Store::with_priority(4, Cart::default()));
        let endware = Endware::new(Arc::clone(&store));
        endware.register_handler(|_: &Checkout, _: &Cart| {});

        assert_eq!(endware.priority(), 4);
        assert!(!endware.handle(AnyAction::new(Checkout)).is_stop());
        assert!(!endware.handle(AnyAction::new(AddItem("x".into()))).is_stop());

        assert!(endware.unregister_handler::<Checkout>());
        endware.unregister_all_handlers();
        assert!(Arc::ptr_eq(endware.store(), &store));
    }
}
