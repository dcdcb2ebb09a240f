//! Middleware - stateless workers for side effects and action filtering
//!
//! A middleware owns a table of closures keyed by action type. Depending on
//! how a closure was registered it can:
//! - decide propagation itself (`register_handler`)
//! - run a side effect and always continue (`register_observer`)
//! - run a side effect and swallow the action (`register_interceptor`)
//! - replace the action with another one (`register_composer`)
//!
//! Actions without a registered closure pass through unchanged.

use crate::action::{Action, AnyAction};
use crate::lock;
use crate::registry::Registry;
use crate::worker::{Passthrough, Priority, Token, Worker};
use std::sync::{Arc, RwLock};

pub mod logging;

pub use logging::LoggingMiddleware;

type Handler = Arc<dyn Fn(&AnyAction) -> Option<Passthrough> + Send + Sync>;

pub struct Middleware {
    token: Token,
    priority: Priority,
    handlers: RwLock<Registry<Handler>>,
}

impl Middleware {
    pub fn new() -> Self {
        Self::with_priority(0)
    }

    pub fn with_priority(priority: Priority) -> Self {
        Self {
            token: Token::new(),
            priority,
            handlers: RwLock::new(Registry::new()),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// Associate a handler with actions of type `A`
    ///
    /// The handler receives the typed action and the type-erased original
    /// (to continue with the same action, return `Passthrough::Next(original.clone())`).
    /// Returns true if it replaced a previous closure for `A`.
    pub fn register_handler<A, H>(&self, handler: H) -> bool
    where
        A: Action,
        H: Fn(&A, &AnyAction) -> Passthrough + Send + Sync + 'static,
    {
        self.insert::<A>(Arc::new(move |action: &AnyAction| {
            action
                .downcast_ref::<A>()
                .map(|typed| handler(typed, action))
        }))
    }

    /// Run `observer` for actions of type `A`, then continue unchanged
    pub fn register_observer<A, H>(&self, observer: H) -> bool
    where
        A: Action,
        H: Fn(&A) + Send + Sync + 'static,
    {
        self.register_handler::<A, _>(move |typed: &A, original: &AnyAction| {
            observer(typed);
            Passthrough::Next(original.clone())
        })
    }

    /// Run `interceptor` for actions of type `A`, then stop propagation
    pub fn register_interceptor<A, H>(&self, interceptor: H) -> bool
    where
        A: Action,
        H: Fn(&A) + Send + Sync + 'static,
    {
        self.register_handler::<A, _>(move |typed: &A, _: &AnyAction| {
            interceptor(typed);
            Passthrough::Stop
        })
    }

    /// Replace actions of type `A` by the action `composer` builds
    pub fn register_composer<A, B, H>(&self, composer: H) -> bool
    where
        A: Action,
        B: Action,
        H: Fn(&A) -> B + Send + Sync + 'static,
    {
        self.register_handler::<A, _>(move |typed: &A, _: &AnyAction| {
            Passthrough::next(composer(typed))
        })
    }

    /// Returns false if nothing was registered for `A`
    pub fn unregister_handler<A: Action>(&self) -> bool {
        lock::write(&self.handlers).unregister::<A>().is_some()
    }

    pub fn unregister_all_handlers(&self) {
        lock::write(&self.handlers).unregister_all();
    }

    pub fn handler_count(&self) -> usize {
        lock::read(&self.handlers).len()
    }

    fn insert<A: Action>(&self, handler: Handler) -> bool {
        lock::write(&self.handlers).register::<A>(handler).is_some()
    }
}

impl Default for Middleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker for Middleware {
    fn token(&self) -> Token {
        self.token
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn handle(&self, action: AnyAction) -> Passthrough {
        let handler = lock::read(&self.handlers).resolve(action.shape()).cloned();
        let Some(handler) = handler else {
            return Passthrough::Next(action);
        };

        match handler(&action) {
            Some(result) => result,
            None => {
                log::warn!(
                    "Middleware {}: handler received unexpected action {}",
                    self.token,
                    action.shape_name()
                );
                Passthrough::Next(action)
            }
        }
    }
}
