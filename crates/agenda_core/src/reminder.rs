//! Reminder hand-off to the platform notification scheduler.
//!
//! # Responsibility
//! - Derive what alert a task needs from its current field values.
//! - Keep an external [`ReminderScheduler`] in step with task mutations.
//!
//! # Invariants
//! - Completed, unsaved and past-due tasks never produce a request.
//! - Delivery itself is out of scope; schedulers are supplied by the host.

use crate::controller::{MutationHook, MutationOutcome};
use crate::model::task::Task;
use crate::model::{Entity, RecordId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Alert title used when a task has no title.
pub const DEFAULT_REMINDER_TITLE: &str = "Reminder";
/// Alert body used when a task has no description.
pub const DEFAULT_REMINDER_BODY: &str = "You have a pending task.";

/// One alert to be shown at `fire_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub task_id: RecordId,
    /// Unix epoch milliseconds.
    pub fire_at: i64,
    pub title: String,
    pub body: String,
}

impl ReminderRequest {
    /// Builds the request `task` needs at `now_ms`, if any.
    pub fn for_task(task: &Task, now_ms: i64) -> Option<Self> {
        if !task.is_persisted() || task.is_completed {
            return None;
        }
        let fire_at = task.reminder_instant();
        if fire_at <= now_ms {
            return None;
        }
        Some(Self {
            task_id: task.id,
            fire_at,
            title: non_blank_or(&task.title, DEFAULT_REMINDER_TITLE),
            body: non_blank_or(&task.description, DEFAULT_REMINDER_BODY),
        })
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Platform alert scheduler, implemented by the host application.
///
/// `schedule` replaces any alert already scheduled for the same task.
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, request: &ReminderRequest);
    fn cancel(&self, task_id: RecordId);
}

impl<S: ReminderScheduler + ?Sized> ReminderScheduler for Arc<S> {
    fn schedule(&self, request: &ReminderRequest) {
        (**self).schedule(request);
    }

    fn cancel(&self, task_id: RecordId) {
        (**self).cancel(task_id);
    }
}

/// Source of "now" in epoch milliseconds.
pub type Clock = fn() -> i64;

pub fn system_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Task mutation hook that schedules or cancels alerts.
pub struct ReminderSync<S> {
    scheduler: S,
    clock: Clock,
}

impl<S: ReminderScheduler> ReminderSync<S> {
    pub fn new(scheduler: S) -> Self {
        Self::with_clock(scheduler, system_clock_ms)
    }

    pub fn with_clock(scheduler: S, clock: Clock) -> Self {
        Self { scheduler, clock }
    }

    /// Schedules the alert `task` currently needs, or cancels a stale one.
    pub fn sync(&self, task: &Task) {
        match ReminderRequest::for_task(task, (self.clock)()) {
            Some(request) => {
                debug!(
                    "event=reminder_schedule module=reminder status=ok task_id={} fire_at={}",
                    request.task_id, request.fire_at
                );
                self.scheduler.schedule(&request);
            }
            None => self.cancel(task.id),
        }
    }

    /// Re-schedules every open task, e.g. after process start.
    pub fn sync_all<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) {
        for task in tasks {
            self.sync(task);
        }
    }

    fn cancel(&self, task_id: RecordId) {
        if task_id <= 0 {
            return;
        }
        debug!("event=reminder_cancel module=reminder status=ok task_id={task_id}");
        self.scheduler.cancel(task_id);
    }
}

impl<S: ReminderScheduler> MutationHook<Task> for ReminderSync<S> {
    fn after_apply(&self, task: &Task, outcome: MutationOutcome) {
        match outcome {
            MutationOutcome::Inserted(_) | MutationOutcome::Updated { applied: true } => {
                self.sync(task)
            }
            MutationOutcome::Deleted { applied: true } => self.cancel(task.id),
            MutationOutcome::Updated { applied: false }
            | MutationOutcome::Deleted { applied: false } => {}
        }
    }
}
