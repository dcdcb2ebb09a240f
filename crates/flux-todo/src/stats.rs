//! Session statistics kept in a repository

use crate::actions::{AddTodo, ClearCompleted, RemoveTodo, ToggleTodo};
use flux::{ChangeSet, Repository};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub added: u32,
    pub toggled: u32,
    pub removed: u32,
    pub cleared: u32,
}

pub fn stats_repository() -> Repository<Stats> {
    // Runs after the stores
    let repository: Repository<Stats> = Repository::with_priority(20, Stats::default());

    repository.register_mutator(|stats: &mut Stats, _: &AddTodo| {
        stats.added += 1;
        ChangeSet::from(["added"])
    });
    repository.register_mutator(|stats: &mut Stats, _: &ToggleTodo| {
        stats.toggled += 1;
        ChangeSet::from(["toggled"])
    });
    repository.register_mutator(|stats: &mut Stats, _: &RemoveTodo| {
        stats.removed += 1;
        ChangeSet::from(["removed"])
    });
    repository.register_mutator(|stats: &mut Stats, _: &ClearCompleted| {
        stats.cleared += 1;
        ChangeSet::from(["cleared"])
    });

    repository
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux::Dispatcher;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_counts_actions() {
        let repository = Arc::new(stats_repository());
        let dispatcher = Dispatcher::new();
        dispatcher.register_worker(Arc::clone(&repository));

        dispatcher.dispatch(AddTodo {
            title: "x".into(),
            created: chrono::Local::now(),
        });
        dispatcher.dispatch(ToggleTodo { id: 1 });
        dispatcher.dispatch(ToggleTodo { id: 1 });
        dispatcher.dispatch(ClearCompleted);

        assert_eq!(
            *repository.snapshot(),
            Stats {
                added: 1,
                toggled: 2,
                removed: 0,
                cleared: 1,
            }
        );
    }
}
