//! Workers - the units a dispatcher schedules
//!
//! A worker receives an action and decides how the dispatch continues by
//! returning a [`Passthrough`]. Returning a value (instead of calling a
//! continuation) means a worker can never forget to resume the chain.

use crate::action::{Action, AnyAction};
use std::fmt;
use uuid::Uuid;

/// Dispatch-order weight; lower values are handled earlier
pub type Priority = u32;

/// Process-unique identity of a worker
///
/// Created once per worker instance and never reused. Used as the key for
/// registration idempotence and targeted unregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Uuid);

impl Token {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a worker ends its turn
#[derive(Debug, Clone)]
pub enum Passthrough {
    /// Continue with this action (the same one or a replacement)
    Next(AnyAction),
    /// No subsequent worker sees the action
    Stop,
}

impl Passthrough {
    /// Continue propagation with a new action value
    pub fn next<A: Action>(action: A) -> Self {
        Self::Next(AnyAction::new(action))
    }

    pub fn stop() -> Self {
        Self::Stop
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }

    /// The action handed to the next worker, if any
    pub fn action(&self) -> Option<&AnyAction> {
        match self {
            Self::Next(action) => Some(action),
            Self::Stop => None,
        }
    }
}

/// A registered participant in the dispatch chain
///
/// Workers are shared between the dispatcher and the application, so
/// `handle` takes `&self`; implementations keep their mutable parts behind
/// locks.
pub trait Worker: Send + Sync {
    /// Unique identity of this worker
    fn token(&self) -> Token;

    /// Position in the dispatch order
    fn priority(&self) -> Priority {
        0
    }

    /// Handle an action
    ///
    /// Workers without a handler for the action's shape must return
    /// `Passthrough::Next(action)` unchanged.
    fn handle(&self, action: AnyAction) -> Passthrough;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;
    impl Action for Ping {}

    #[test]
    fn test_tokens_are_unique() {
        let first = Token::new();
        let second = Token::new();
        assert_ne!(first, second);
        assert_eq!(first, first);
    }

    #[test]
    fn test_passthrough_accessors() {
        let next = Passthrough::next(Ping);
        assert!(!next.is_stop());
        assert!(next.action().is_some_and(|a| a.is::<Ping>()));

        let stop = Passthrough::stop();
        assert!(stop.is_stop());
        assert!(stop.action().is_none());
    }
}
