//! Composition root for hosts embedding the agenda core.
//!
//! # Responsibility
//! - Validate configuration, start logging, open storage.
//! - Build one controller per entity over a shared [`Store`].
//!
//! # Invariants
//! - Exactly one [`Store`] backs every controller of an [`Agenda`].
//! - Reminder scheduling is attached to the task controller only when the
//!   host supplies a scheduler.

use crate::config::CoreConfig;
use crate::controller::{MutationHook, NoteController, TaskController, ViewStateController};
use crate::db::{DbError, Store};
use crate::logging::init_logging;
use crate::model::task::Task;
use crate::reminder::{ReminderScheduler, ReminderSync};
use crate::repo::{NoteRepository, RepoResult, TaskRepository};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

type SharedReminderSync = ReminderSync<Arc<dyn ReminderScheduler>>;

#[derive(Debug)]
pub enum AgendaError {
    Config(String),
    Logging(String),
    Db(DbError),
}

impl Display for AgendaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "invalid configuration: {message}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AgendaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(_) | Self::Logging(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for AgendaError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Running data layer: storage plus note and task controllers.
pub struct Agenda {
    config: CoreConfig,
    store: Store,
    notes: NoteController,
    tasks: TaskController,
    reminders: Option<Arc<SharedReminderSync>>,
}

impl Agenda {
    /// Opens the data layer described by `config`.
    ///
    /// Must be called inside a Tokio runtime; controller workers are spawned
    /// on it.
    pub fn open(
        config: CoreConfig,
        scheduler: Option<Arc<dyn ReminderScheduler>>,
    ) -> Result<Self, AgendaError> {
        config.validate().map_err(AgendaError::Config)?;
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, log_dir).map_err(AgendaError::Logging)?;
        }

        let started_at = Instant::now();
        let store = match &config.db_path {
            Some(path) => Store::open(path)?,
            None => Store::open_in_memory()?,
        };

        let reminders = scheduler.map(|scheduler| Arc::new(ReminderSync::new(scheduler)));
        let task_hooks: Vec<Arc<dyn MutationHook<Task>>> = reminders
            .iter()
            .map(|sync| Arc::clone(sync) as Arc<dyn MutationHook<Task>>)
            .collect();

        let notes = ViewStateController::with_hooks(
            NoteRepository::new(store.clone()),
            Vec::new(),
            config.failure_channel_capacity,
        );
        let tasks = ViewStateController::with_hooks(
            TaskRepository::new(store.clone()),
            task_hooks,
            config.failure_channel_capacity,
        );

        info!(
            "event=agenda_open module=app status=ok storage={} reminders={} duration_ms={}",
            if config.db_path.is_some() { "file" } else { "memory" },
            reminders.is_some(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            config,
            store,
            notes,
            tasks,
            reminders,
        })
    }

    pub fn notes(&self) -> &NoteController {
        &self.notes
    }

    pub fn tasks(&self) -> &TaskController {
        &self.tasks
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Re-derives every task's alert from storage, e.g. after device reboot.
    ///
    /// Returns how many tasks were examined; `0` without a scheduler.
    pub async fn resync_reminders(&self) -> RepoResult<usize> {
        let Some(reminders) = &self.reminders else {
            return Ok(0);
        };
        let tasks = self.tasks.repository().list().await?;
        reminders.sync_all(&tasks);
        info!(
            "event=reminder_resync module=app status=ok tasks={}",
            tasks.len()
        );
        Ok(tasks.len())
    }
}
