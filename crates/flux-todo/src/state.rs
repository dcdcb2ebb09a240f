//! To-do state and its reducers

use crate::actions::{AddTodo, ClearCompleted, RemoveTodo, SetFilter, SetStatus, ToggleTodo};
use chrono::{DateTime, Local};
use flux::{ChangeSet, Store};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Open,
    Done,
}

impl Filter {
    pub fn matches(&self, item: &TodoItem) -> bool {
        match self {
            Filter::All => true,
            Filter::Open => !item.done,
            Filter::Done => item.done,
        }
    }
}

/// Fields of [`TodoState`] reported by its reducers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TodoField {
    Items,
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoItem {
    pub id: u32,
    pub title: String,
    pub done: bool,
    pub created: DateTime<Local>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoState {
    pub items: Vec<TodoItem>,
    pub filter: Filter,
    pub next_id: u32,
}

impl TodoState {
    pub fn visible(&self) -> impl Iterator<Item = &TodoItem> {
        self.items.iter().filter(|item| self.filter.matches(item))
    }

    pub fn open_count(&self) -> usize {
        self.items.iter().filter(|item| !item.done).count()
    }
}

pub type TodoStore = Store<TodoState, TodoField>;

/// Store for the list itself
pub fn todo_store() -> TodoStore {
    let store = TodoStore::with_priority(10, TodoState::default());

    store.register_reducer(|state: &mut TodoState, action: &AddTodo| {
        state.next_id += 1;
        state.items.push(TodoItem {
            id: state.next_id,
            title: action.title.clone(),
            done: false,
            created: action.created,
        });
        ChangeSet::from([TodoField::Items])
    });

    store.register_reducer(|state: &mut TodoState, action: &ToggleTodo| {
        match state.items.iter_mut().find(|item| item.id == action.id) {
            Some(item) => {
                item.done = !item.done;
                ChangeSet::from([TodoField::Items])
            }
            None => ChangeSet::none(),
        }
    });

    store.register_reducer(|state: &mut TodoState, action: &RemoveTodo| {
        let before = state.items.len();
        state.items.retain(|item| item.id != action.id);
        if state.items.len() == before {
            return ChangeSet::none();
        }
        ChangeSet::from([TodoField::Items])
    });

    store.register_reducer(|state: &mut TodoState, _: &ClearCompleted| {
        let before = state.items.len();
        state.items.retain(|item| !item.done);
        if state.items.len() == before {
            return ChangeSet::none();
        }
        ChangeSet::from([TodoField::Items])
    });

    store.register_reducer(|state: &mut TodoState, action: &SetFilter| {
        if state.filter == action.0 {
            return ChangeSet::none();
        }
        state.filter = action.0;
        ChangeSet::from([TodoField::Filter])
    });

    store
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusState {
    pub message: String,
}

/// Store for the status line
pub fn status_store() -> Store<StatusState> {
    let store: Store<StatusState> = Store::with_priority(10, StatusState::default());
    store.register_reducer(|state: &mut StatusState, action: &SetStatus| {
        if state.message == action.0 {
            return ChangeSet::none();
        }
        state.message = action.0.clone();
        ChangeSet::from(["message"])
    });
    store
}
