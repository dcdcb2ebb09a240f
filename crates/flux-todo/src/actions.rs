//! Actions understood by the to-do model

use crate::state::Filter;
use chrono::{DateTime, Local};
use flux::Action;

/// Raw user input; validated by the input middleware before it reaches a store
#[derive(Debug, Clone)]
pub struct SubmitTitle(pub String);
impl Action for SubmitTitle {}

/// A validated new item
#[derive(Debug, Clone)]
pub struct AddTodo {
    pub title: String,
    pub created: DateTime<Local>,
}
impl Action for AddTodo {}

#[derive(Debug, Clone)]
pub struct ToggleTodo {
    pub id: u32,
}
impl Action for ToggleTodo {}

#[derive(Debug, Clone)]
pub struct RemoveTodo {
    pub id: u32,
}
impl Action for RemoveTodo {}

#[derive(Debug, Clone)]
pub struct ClearCompleted;
impl Action for ClearCompleted {}

#[derive(Debug, Clone)]
pub struct SetFilter(pub Filter);
impl Action for SetFilter {}

/// Status line text
#[derive(Debug, Clone)]
pub struct SetStatus(pub String);
impl Action for SetStatus {}
