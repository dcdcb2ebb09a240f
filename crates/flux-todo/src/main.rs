use anyhow::Result;
use flux::{Aggregator, Dispatcher, Endware, StoreEvent, Subscription};
use std::sync::Arc;

mod actions;
mod config;
mod input;
mod logger;
mod state;
mod stats;

use actions::{ClearCompleted, SetFilter, SetStatus, SubmitTitle, ToggleTodo};
use config::AppConfig;
use state::{Filter, StatusState, TodoField, TodoState};

fn main() -> Result<()> {
    let log_file = logger::init()?;
    log::info!("Starting flux-todo (logging to {})", log_file.display());

    let config = AppConfig::load();
    let dispatcher = Dispatcher::from_config(&config.dispatcher)?;

    let todos = Arc::new(state::todo_store());
    let status = Arc::new(state::status_store());
    let stats = Arc::new(stats::stats_repository());

    let announcer = Arc::new(Endware::with_priority(15, Arc::clone(&todos)));
    announcer.register_handler(|_: &ClearCompleted, state: &TodoState| {
        log::info!("Cleared completed items, {} left", state.items.len());
    });

    dispatcher.register_worker(Arc::new(input::input_middleware(&dispatcher)));
    dispatcher.register_worker(Arc::clone(&todos));
    dispatcher.register_worker(Arc::clone(&status));
    dispatcher.register_worker(announcer);
    dispatcher.register_worker(Arc::clone(&stats));

    let mut subscriptions: Vec<Subscription> = Vec::new();
    todos
        .add_filtered_observer(StoreEvent::DidChange, [TodoField::Filter], |state, _| {
            log::info!("Showing {} items", state.filter);
        })
        .store_in(&mut subscriptions);
    stats
        .add_observer(StoreEvent::DidChange, |snapshot, changes| {
            log::debug!("Stats {:?} after {:?}", snapshot, changes);
        })
        .store_in(&mut subscriptions);

    let screen = Aggregator::with_change_handler(|screen| {
        let open = screen.with_state(|todos: &TodoState| todos.open_count());
        let message = screen.with_state(|status: &StatusState| status.message.clone());
        log::info!("Screen refresh: {} open, status '{}'", open, message);
    });
    screen.register(&todos, None);
    screen.register(&status, None);

    let titles: Vec<String> = std::env::args().skip(1).collect();
    let titles = if titles.is_empty() {
        config.seed_items.clone()
    } else {
        titles
    };

    for title in titles {
        dispatcher.dispatch(SubmitTitle(title));
    }
    dispatcher.dispatch(SubmitTitle("   ".into()));
    dispatcher.dispatch(ToggleTodo { id: 1 });
    dispatcher.dispatch(SetFilter(Filter::Open));
    dispatcher.dispatch(ClearCompleted);
    dispatcher.dispatch(SetStatus("Done".into()));
    dispatcher.flush();

    print_screen(&config.title, &screen);
    log::info!("Session stats: {:?}", stats.snapshot());

    drop(subscriptions);
    log::info!("Exiting flux-todo");
    Ok(())
}

fn print_screen(title: &str, screen: &Aggregator) {
    let todos: TodoState = screen.state();
    let status: StatusState = screen.state();

    println!("{} ({})", title, todos.filter);
    for item in todos.visible() {
        println!(
            "  [{}] {:>3} {} (added {})",
            if item.done { "x" } else { " " },
            item.id,
            item.title,
            item.created.format("%H:%M:%S")
        );
    }
    println!("{} open", todos.open_count());
    if !status.message.is_empty() {
        println!("{}", status.message);
    }
}
