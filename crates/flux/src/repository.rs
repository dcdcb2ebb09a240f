//! Repository - a worker that is its own state container
//!
//! Mutators change a draft of the repository value and report which fields
//! they touched. A non-empty report follows the store contract: will-change
//! observers see the old value, the draft replaces it, did-change observers
//! see the new value. An empty report discards the draft and notifies nobody.
//!
//! The value is held as `Arc<R>`, so snapshots and the will-change payload
//! are reference counted rather than copied.

use crate::action::{Action, AnyAction};
use crate::change::{ChangeSet, Field, StoreEvent};
use crate::lock;
use crate::observer::{ObserverList, Subscription};
use crate::registry::Registry;
use crate::worker::{Passthrough, Priority, Token, Worker};
use std::sync::{Arc, Mutex, RwLock};

type Mutator<R, F> = Arc<dyn Fn(&mut R, &AnyAction) -> Option<ChangeSet<F>> + Send + Sync>;

pub struct Repository<R, F: Field = &'static str> {
    token: Token,
    priority: Priority,
    value: RwLock<Arc<R>>,
    /// Held for a whole mutate, notify and replace cycle
    update: Mutex<()>,
    mutators: RwLock<Registry<Mutator<R, F>>>,
    observers: Arc<ObserverList<R, F>>,
}

impl<R, F> Repository<R, F>
where
    R: Clone + Send + Sync + 'static,
    F: Field,
{
    pub fn new(value: R) -> Self {
        Self::with_priority(0, value)
    }

    pub fn with_priority(priority: Priority, value: R) -> Self {
        Self {
            token: Token::new(),
            priority,
            value: RwLock::new(Arc::new(value)),
            update: Mutex::new(()),
            mutators: RwLock::new(Registry::new()),
            observers: ObserverList::new(),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// The current value
    pub fn snapshot(&self) -> Arc<R> {
        Arc::clone(&lock::read(&self.value))
    }

    /// Associate a mutator with actions of type `A`
    pub fn register_mutator<A, M>(&self, mutator: M) -> bool
    where
        A: Action,
        M: Fn(&mut R, &A) -> ChangeSet<F> + Send + Sync + 'static,
    {
        let erased: Mutator<R, F> = Arc::new(move |value: &mut R, action: &AnyAction| {
            action.downcast_ref::<A>().map(|typed| mutator(value, typed))
        });
        lock::write(&self.mutators)
            .register::<A>(erased)
            .is_some()
    }

    pub fn unregister_mutator<A: Action>(&self) -> bool {
        lock::write(&self.mutators).unregister::<A>().is_some()
    }

    pub fn unregister_all_mutators(&self) {
        lock::write(&self.mutators).unregister_all();
    }

    /// Observe every transition of `event`
    pub fn add_observer<H>(&self, event: StoreEvent, handler: H) -> Subscription
    where
        H: Fn(&R, &ChangeSet<F>) + Send + Sync + 'static,
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
        H: Fn(&R, &ChangeSet<F>) + Send + Sync + 'static,
    {
        self.observers
            .subscribe(event, Some(fields.into()), Arc::new(handler))
    }
}

impl<R, F> Worker for Repository<R, F>
where
    R: Clone + Send + Sync + 'static,
    F: Field,
{
    fn token(&self) -> Token {
        self.token
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn handle(&self, action: AnyAction) -> Passthrough {
        let mutator = lock::read(&self.mutators).resolve(action.shape()).cloned();
        let Some(mutator) = mutator else {
            return Passthrough::Next(action);
        };

        let _update = lock::lock(&self.update);
        let original = self.snapshot();
        let mut draft = R::clone(&original);

        match mutator(&mut draft, &action) {
            Some(changes) if !changes.is_empty() => {
                log::debug!(
                    "Repository {}: {} changed {:?}",
                    self.token,
                    action.shape_name(),
                    changes
                );
                self.observers
                    .notify(StoreEvent::WillChange, &original, &changes);
                let updated = Arc::new(draft);
                *lock::write(&self.value) = Arc::clone(&updated);
                self.observers
                    .notify(StoreEvent::DidChange, &updated, &changes);
            }
            Some(_) => {}
            None => log::warn!(
                "Repository {}: mutator received unexpected action {}",
                self.token,
                action.shape_name()
            ),
        }

        Passthrough::Next(action)
    }
}
