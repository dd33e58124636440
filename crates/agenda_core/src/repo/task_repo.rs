//! Task table mapping and task-only queries.
//!
//! # Invariants
//! - `is_completed` is stored as `0`/`1`; any non-zero value reads as done.
//! - `due_date` is always present; `reminder_date` is nullable.

use super::{attachment_values, read_attachments, RepoResult, Repository};
use crate::db::{LiveQuery, Persisted};
use crate::model::task::Task;
use rusqlite::types::Value;
use rusqlite::Row;

/// Repository for [`Task`] records.
pub type TaskRepository = Repository<Task>;

impl Persisted for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "due_date",
        "reminder_date",
        "is_completed",
        "image_refs",
        "video_refs",
        "audio_refs",
    ];

    fn column_values(&self) -> Vec<Value> {
        let mut values = vec![
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
            Value::Integer(self.due_date),
            self.reminder_date.map_or(Value::Null, Value::Integer),
            Value::Integer(i64::from(self.is_completed)),
        ];
        values.extend(attachment_values(&self.attachments));
        values
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id = row.get("id")?;
        Ok(Self {
            id,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: row.get("due_date")?,
            reminder_date: row.get("reminder_date")?,
            is_completed: row.get::<_, i64>("is_completed")? != 0,
            attachments: read_attachments(row, Self::TABLE, id)?,
        })
    }
}

impl Repository<Task> {
    /// Replaces the stored task with a copy whose completion flag is `done`.
    pub async fn set_completed(&self, task: &Task, done: bool) -> RepoResult<bool> {
        let mut updated = task.clone();
        updated.is_completed = done;
        self.update(&updated).await
    }

    /// Live list of tasks not yet completed, ordered by id.
    pub fn pending(&self) -> LiveQuery<Vec<Task>> {
        self.filtered(|task| !task.is_completed)
    }
}
