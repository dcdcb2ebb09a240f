//! # flux
//!
//! Unidirectional data flow for Rust applications: actions are dispatched
//! through an ordered chain of workers, stores reduce them into typed state,
//! and observers react to the resulting changes.
//!
//! ## Building blocks
//!
//! - [`Action`]: an immutable value describing something that happened
//! - [`Worker`]: anything registered with a dispatcher; decides per action
//!   whether to continue ([`Passthrough::Next`]) or stop
//! - [`Dispatcher`]: routes actions through the workers in priority order
//! - [`Store`]: state container whose reducers report changed fields
//! - [`Middleware`] and [`Endware`]: stateless side effects before and after
//!   the stores
//! - [`Repository`]: a value-holding worker mutated in place
//! - [`Aggregator`]: read model composed from several stores
//!
//! ## Usage
//!
//! ```rust
//! use flux::{Action, ChangeSet, Dispatcher, Store, StoreEvent};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Counter {
//!     value: i64,
//! }
//!
//! #[derive(Debug)]
//! struct Add(i64);
//! impl Action for Add {}
//!
//! let store: Arc<Store<Counter>> = Arc::new(Store::new(Counter::default()));
//! store.register_reducer(|state: &mut Counter, action: &Add| {
//!     state.value += action.0;
//!     ChangeSet::from(["value"])
//! });
//!
//! let _subscription = store.add_observer(StoreEvent::DidChange, |state, _| {
//!     println!("counter is now {}", state.value);
//! });
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.register_worker(Arc::clone(&store));
//! dispatcher.dispatch(Add(2));
//!
//! assert_eq!(store.state().value, 2);
//! ```

pub mod action;
pub mod aggregator;
pub mod change;
pub mod config;
pub mod dispatcher;
pub mod endware;
pub mod error;
pub mod executor;
mod lock;
pub mod middleware;
pub mod observer;
pub mod pipeline;
pub mod registry;
pub mod repository;
pub mod store;
pub mod worker;

pub use action::{shape_of, Action, ActionShape, AnyAction};
pub use aggregator::Aggregator;
pub use change::{ChangeSet, Field, StoreEvent};
pub use config::{DispatchMode, DispatcherConfig};
pub use dispatcher::{Dispatcher, WeakDispatcher};
pub use endware::Endware;
pub use error::{Error, Result};
pub use executor::{Executor, Immediate, Job, SerialQueue};
pub use middleware::{LoggingMiddleware, Middleware};
pub use observer::{ObserverFn, Subscription};
pub use pipeline::Pipeline;
pub use registry::Registry;
pub use repository::Repository;
pub use store::Store;
pub use worker::{Passthrough, Priority, Token, Worker};
