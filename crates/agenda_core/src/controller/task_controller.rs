//! Task-only controller intents.

use super::view_state::{Mutation, ViewStateController};
use crate::db::LiveQuery;
use crate::model::task::Task;

/// Controller for tasks.
pub type TaskController = ViewStateController<Task>;

impl ViewStateController<Task> {
    /// Queues a full replacement of `task` with its completion flag set to
    /// `done`.
    pub fn set_completed(&self, task: &Task, done: bool) -> Mutation {
        let mut updated = task.clone();
        updated.is_completed = done;
        self.update(updated)
    }

    /// Live list of open tasks.
    pub fn pending(&self) -> LiveQuery<Vec<Task>> {
        self.repository().pending()
    }
}
