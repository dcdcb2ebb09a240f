//! Pipeline - drives one action through a snapshot of workers
//!
//! Each dispatch gets its own pipeline loaded with the worker list as it was
//! when the dispatch started. Registration changes made while the pipeline
//! runs do not affect it.

use crate::action::AnyAction;
use crate::worker::{Passthrough, Worker};
use std::sync::Arc;

pub struct Pipeline {
    workers: Option<std::vec::IntoIter<Arc<dyn Worker>>>,
}

impl Pipeline {
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Self {
        Self {
            workers: Some(workers.into_iter()),
        }
    }

    /// True once the pipeline is exhausted or stopped
    pub fn is_empty(&self) -> bool {
        self.workers.is_none()
    }

    /// Hand `action` to the next worker
    ///
    /// Returns what the next worker should receive, or `None` when the
    /// pipeline is exhausted or a worker stopped propagation.
    pub fn step(&mut self, action: AnyAction) -> Option<AnyAction> {
        let worker = match self.workers.as_mut().and_then(Iterator::next) {
            Some(worker) => worker,
            None => {
                self.workers = None;
                return None;
            }
        };

        log::trace!(
            "Pipeline: {} -> worker {} (priority {})",
            action.shape_name(),
            worker.token(),
            worker.priority()
        );

        match worker.handle(action) {
            Passthrough::Next(next) => Some(next),
            Passthrough::Stop => {
                log::trace!("Pipeline: stopped by worker {}", worker.token());
                self.workers = None;
                None
            }
        }
    }

    /// Drive `action` until the workers are exhausted or one stops it
    pub fn emit(&mut self, action: AnyAction) {
        let mut current = action;
        while let Some(next) = self.step(current) {
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::worker::Token;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Original;
    impl Action for Original {}

    #[derive(Debug)]
    struct Replacement;
    impl Action for Replacement {}

    enum Behavior {
        Pass,
        Stop,
        Replace,
    }

    struct Probe {
        token: Token,
        behavior: Behavior,
        seen: Mutex<Vec<&'static str>>,
    }

    impl Probe {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                token: Token::new(),
                behavior,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<&'static str> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Worker for Probe {
        fn token(&self) -> Token {
            self.token
        }

        fn handle(&self, action: AnyAction) -> Passthrough {
            let name = if action.is::<Original>() {
                "original"
            } else {
                "replacement"
            };
            self.seen.lock().unwrap().push(name);
            match self.behavior {
                Behavior::Pass => Passthrough::Next(action),
                Behavior::Stop => Passthrough::Stop,
                Behavior::Replace => Passthrough::next(Replacement),
            }
        }
    }

    #[test]
    fn test_emit_visits_every_worker() {
        let first = Probe::new(Behavior::Pass);
        let second = Probe::new(Behavior::Pass);
        let mut pipeline = Pipeline::new(vec![first.clone(), second.clone()]);

        assert!(!pipeline.is_empty());
        pipeline.emit(AnyAction::new(Original));
        assert!(pipeline.is_empty());
        assert_eq!(first.seen(), vec!["original"]);
        assert_eq!(second.seen(), vec!["original"]);
    }

    #[test]
    fn test_stop_halts_propagation() {
        let first = Probe::new(Behavior::Pass);
        let second = Probe::new(Behavior::Stop);
        let third = Probe::new(Behavior::Pass);
        let mut pipeline = Pipeline::new(vec![first.clone(), second.clone(), third.clone()]);

        pipeline.emit(AnyAction::new(Original));

        assert!(pipeline.is_empty());
        assert_eq!(second.seen(), vec!["original"]);
        assert!(third.seen().is_empty());
    }

    #[test]
    fn test_replacement_reaches_next_worker() {
        let first = Probe::new(Behavior::Replace);
        let second = Probe::new(Behavior::Pass);
        let mut pipeline = Pipeline::new(vec![first.clone(), second.clone()]);

        pipeline.emit(AnyAction::new(Original));

        assert_eq!(first.seen(), vec!["original"]);
        assert_eq!(second.seen(), vec!["replacement"]);
    }

    #[test]
    fn test_empty_pipeline() {
        let mut pipeline = Pipeline::new(Vec::new());
        assert_eq!(pipeline.step(AnyAction::new(Original)).map(|a| a.is::<Original>()), None);
        assert!(pipeline.is_empty());
    }
}
