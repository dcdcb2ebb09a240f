//! Serial execution strategies
//!
//! An [`Executor`] accepts a job and guarantees jobs never overlap. The
//! dispatcher confines pipeline traversal to one executor; store observers can
//! ask for their callbacks to be delivered through one.
//!
//! - [`Immediate`] runs the job on the caller's thread.
//! - [`SerialQueue`] runs jobs one at a time on a dedicated background thread
//!   fed by a channel.

use crate::error::{Error, Result};
use crate::lock;
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle, ThreadId};

/// A unit of work scheduled on an executor
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs serially
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);

    /// Wait for previously submitted jobs; a no-op for inline executors
    fn flush(&self) {}
}

/// Executes jobs inline on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Executor for Immediate {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Executes jobs in submission order on a dedicated thread
///
/// Dropping the queue closes its channel; jobs already queued still run
/// before the thread exits.
pub struct SerialQueue {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl SerialQueue {
    /// Spawn the queue thread
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Job>();

        let thread_name = name.clone();
        let worker = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                log::info!("Serial queue '{}' started", thread_name);
                // Ends when every sender is gone
                for job in receiver {
                    job();
                }
                log::info!("Serial queue '{}' stopped", thread_name);
            })
            .map_err(|source| Error::Spawn {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            thread_id: worker.thread().id(),
            name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when called from the queue's own thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Block until every job submitted before this call has run
    ///
    /// Returns immediately when called from the queue thread itself.
    pub fn flush(&self) {
        if self.is_current() {
            return;
        }

        let (done_tx, done_rx) = mpsc::channel::<()>();
        self.execute(Box::new(move || {
            let _ = done_tx.send(());
        }));
        // An error means the queue is shut down and the job was dropped
        let _ = done_rx.recv();
    }

    /// Stop accepting jobs and wait for the queued ones to finish
    pub fn shutdown(&self) {
        lock::lock(&self.sender).take();

        if self.is_current() {
            return;
        }
        if let Some(worker) = lock::lock(&self.worker).take() {
            if worker.join().is_err() {
                log::error!("Serial queue '{}' panicked", self.name);
            }
        }
    }
}

impl Executor for SerialQueue {
    fn execute(&self, job: Job) {
        match lock::lock(&self.sender).as_ref() {
            Some(sender) => {
                if let Err(e) = sender.send(job) {
                    log::error!("Serial queue '{}': failed to send job: {}", self.name, e);
                }
            }
            None => log::error!("Serial queue '{}' is shut down, job dropped", self.name),
        }
    }

    fn flush(&self) {
        SerialQueue::flush(self);
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
