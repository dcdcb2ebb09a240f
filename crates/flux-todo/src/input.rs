//! Input middleware
//!
//! Turns raw [`SubmitTitle`] input into [`AddTodo`], dropping blank titles
//! and reporting them on the status line.

use crate::actions::{AddTodo, SetStatus, SubmitTitle};
use flux::{AnyAction, Dispatcher, Middleware, Passthrough};

pub const MAX_TITLE_LEN: usize = 80;

pub fn input_middleware(dispatcher: &Dispatcher) -> Middleware {
    let middleware = Middleware::with_priority(0);
    let dispatcher = dispatcher.downgrade();

    middleware.register_handler(move |action: &SubmitTitle, _: &AnyAction| {
        let title = action.0.trim();
        if title.is_empty() {
            log::warn!("Rejected blank title");
            dispatcher.dispatch(SetStatus("Title must not be empty".into()));
            return Passthrough::Stop;
        }

        let title: String = title.chars().take(MAX_TITLE_LEN).collect();
        Passthrough::next(AddTodo {
            title,
            created: chrono::Local::now(),
        })
    });

    middleware
}
