//! Dispatcher - routes actions through the registered workers
//!
//! Workers are kept sorted by priority (lower first); workers sharing a
//! priority keep their registration order. Every dispatch runs a fresh
//! [`Pipeline`] over a snapshot of that list, confined to the dispatcher's
//! [`Executor`].
//!
//! At most one action is in flight per dispatcher. A worker that dispatches
//! from inside its `handle` does not start a nested traversal: the action is
//! queued and dispatched after the current one completes.

use crate::action::{Action, AnyAction};
use crate::executor::{Executor, Immediate, SerialQueue};
use crate::lock;
use crate::pipeline::Pipeline;
use crate::worker::{Priority, Token, Worker};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::thread::{self, ThreadId};

/// Dispatcher for sending actions through the worker chain
///
/// Cloning is cheap; clones share workers and execution context.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    registry: RwLock<WorkerList>,
    executor: Arc<dyn Executor>,
    /// Serializes dispatches coming from different threads
    gate: Mutex<()>,
    /// Thread currently driving a pipeline
    owner: Mutex<Option<ThreadId>>,
    /// Actions dispatched re-entrantly by the owner thread
    pending: Mutex<VecDeque<AnyAction>>,
}

#[derive(Default)]
struct WorkerList {
    tokens: HashSet<Token>,
    workers: Vec<Arc<dyn Worker>>,
}

impl WorkerList {
    /// Index after every worker with priority <= `priority`
    fn insertion_index(&self, priority: Priority) -> usize {
        self.workers.partition_point(|w| w.priority() <= priority)
    }

    fn insert(&mut self, worker: Arc<dyn Worker>) -> bool {
        if !self.tokens.insert(worker.token()) {
            return false;
        }
        let index = self.insertion_index(worker.priority());
        self.workers.insert(index, worker);
        true
    }

    fn remove(&mut self, tokens: &HashSet<Token>) -> usize {
        let before = self.workers.len();
        self.workers.retain(|w| !tokens.contains(&w.token()));
        self.tokens.retain(|t| !tokens.contains(t));
        before - self.workers.len()
    }
}

impl Dispatcher {
    /// Dispatcher running every dispatch on the caller's thread
    pub fn new() -> Self {
        Self::with_executor(Arc::new(Immediate))
    }

    /// Dispatcher confined to `executor`
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(WorkerList::default()),
                executor,
                gate: Mutex::new(()),
                owner: Mutex::new(None),
                pending: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Dispatcher running every dispatch on a dedicated background thread
    pub fn serial(name: impl Into<String>) -> crate::Result<Self> {
        Ok(Self::with_executor(Arc::new(SerialQueue::new(name)?)))
    }

    /// Register workers
    ///
    /// A worker whose token is already registered is ignored. Returns the
    /// number of workers actually added.
    pub fn register<I>(&self, workers: I) -> usize
    where
        I: IntoIterator<Item = Arc<dyn Worker>>,
    {
        let mut registry = lock::write(&self.inner.registry);
        let mut added = 0;
        for worker in workers {
            let token = worker.token();
            if registry.insert(worker) {
                added += 1;
            } else {
                log::debug!("Dispatcher: worker {} already registered", token);
            }
        }
        added
    }

    /// Register a single worker
    pub fn register_worker<W: Worker + 'static>(&self, worker: Arc<W>) -> bool {
        self.register([worker as Arc<dyn Worker>]) == 1
    }

    /// Unregister the workers with the given tokens, returning how many were removed
    pub fn unregister<I>(&self, tokens: I) -> usize
    where
        I: IntoIterator<Item = Token>,
    {
        let tokens: HashSet<Token> = tokens.into_iter().collect();
        lock::write(&self.inner.registry).remove(&tokens)
    }

    /// Dispatch an action to the workers
    pub fn dispatch<A: Action>(&self, action: A) {
        self.dispatch_any(AnyAction::new(action));
    }

    /// Dispatch an already type-erased action
    pub fn dispatch_any(&self, action: AnyAction) {
        let inner = Arc::clone(&self.inner);
        self.inner
            .executor
            .execute(Box::new(move || inner.drive(action)));
    }

    /// Handle that does not keep this dispatcher alive
    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Block until every action dispatched so far has been processed
    ///
    /// Only matters for dispatchers running on a background queue.
    pub fn flush(&self) {
        self.inner.executor.flush();
    }

    /// True while an action is travelling through the workers
    pub fn is_dispatching(&self) -> bool {
        lock::lock(&self.inner.owner).is_some()
    }

    /// Snapshot of the registered workers in dispatch order
    pub fn workers(&self) -> Vec<Arc<dyn Worker>> {
        lock::read(&self.inner.registry).workers.clone()
    }

    /// Tokens of the registered workers in dispatch order
    pub fn tokens(&self) -> Vec<Token> {
        lock::read(&self.inner.registry)
            .workers
            .iter()
            .map(|w| w.token())
            .collect()
    }

    pub fn contains(&self, token: Token) -> bool {
        lock::read(&self.inner.registry).tokens.contains(&token)
    }

    pub fn len(&self) -> usize {
        lock::read(&self.inner.registry).workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning dispatcher handle for workers that dispatch follow-up actions
///
/// A worker holding a full [`Dispatcher`] keeps the dispatcher (and its
/// serial queue) alive through the worker list.
#[derive(Clone)]
pub struct WeakDispatcher {
    inner: Weak<Inner>,
}

impl WeakDispatcher {
    /// `None` once every `Dispatcher` handle is gone
    pub fn upgrade(&self) -> Option<Dispatcher> {
        self.inner.upgrade().map(|inner| Dispatcher { inner })
    }

    /// Dispatch through the dispatcher if it still exists
    pub fn dispatch<A: Action>(&self, action: A) -> bool {
        match self.upgrade() {
            Some(dispatcher) => {
                dispatcher.dispatch(action);
                true
            }
            None => {
                log::debug!(
                    "Dispatcher gone, dropping {}",
                    std::any::type_name::<A>()
                );
                false
            }
        }
    }
}

/// Clears the owner slot even if a worker panics
///
/// Actions deferred by the panicking dispatch are discarded with it.
struct OwnerGuard<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
    pending: &'a Mutex<VecDeque<AnyAction>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let discarded: Vec<AnyAction> = lock::lock(self.pending).drain(..).collect();
            for action in &discarded {
                log::warn!(
                    "Dispatcher: discarding {} deferred by a panicked dispatch",
                    action.shape_name()
                );
            }
        }
        *lock::lock(self.owner) = None;
    }
}

impl Inner {
    fn drive(&self, action: AnyAction) {
        let current = thread::current().id();
        if *lock::lock(&self.owner) == Some(current) {
            log::debug!(
                "Dispatcher: deferring {} until the current dispatch completes",
                action.shape_name()
            );
            lock::lock(&self.pending).push_back(action);
            return;
        }

        let _gate = lock::lock(&self.gate);
        *lock::lock(&self.owner) = Some(current);
        let _owner = OwnerGuard {
            owner: &self.owner,
            pending: &self.pending,
        };

        let mut next = Some(action);
        while let Some(action) = next {
            self.run(action);
            next = lock::lock(&self.pending).pop_front();
        }
    }

    fn run(&self, action: AnyAction) {
        let workers = lock::read(&self.registry).workers.clone();
        log::debug!(
            "Dispatcher: {} -> {} workers",
            action.shape_name(),
            workers.len()
        );
        Pipeline::new(workers).emit(action);
    }
}
