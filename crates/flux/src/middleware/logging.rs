use crate::action::AnyAction;
use crate::worker::{Passthrough, Priority, Token, Worker};

/// LoggingMiddleware - logs all actions passing through
pub struct LoggingMiddleware {
    token: Token,
    priority: Priority,
    level: log::Level,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::with_level(log::Level::Debug)
    }

    pub fn with_level(level: log::Level) -> Self {
        Self {
            token: Token::new(),
            priority: 0,
            level,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker for LoggingMiddleware {
    fn token(&self) -> Token {
        self.token
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn handle(&self, action: AnyAction) -> Passthrough {
        log::log!(self.level, "Action: {} {:?}", action.shape_name(), action);

        // Always pass action through
        Passthrough::Next(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[derive(Debug)]
    struct Refresh;
    impl Action for Refresh {}

    #[test]
    fn test_logging_passes_action_through() {
        let middleware = LoggingMiddleware::with_level(log::Level::Info).with_priority(3);
        let action = AnyAction::new(Refresh);

        let result = middleware.handle(action.clone());

        assert_eq!(middleware.priority(), 3);
        assert!(result.action().is_some_and(|a| a.ptr_eq(&action)));
    }
}
