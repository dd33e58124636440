//! Local data layer for notes and tasks.
//! Storage, live queries and view-state controllers for a personal agenda.

pub mod app;
pub mod codec;
pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod search;

pub use app::{Agenda, AgendaError};
pub use config::CoreConfig;
pub use controller::{
    ControllerError, Mutation, MutationFailure, MutationHook, MutationKind, MutationOutcome,
    NoteController, TaskController, ViewStateController,
};
pub use db::{DbError, DbResult, LiveQuery, Store, SubscriptionClosed};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attachment::{AttachmentKind, Attachments};
pub use model::note::Note;
pub use model::task::{format_due_date, parse_due_date, Task};
pub use model::{Entity, RecordId, ValidationError};
pub use reminder::{ReminderRequest, ReminderScheduler, ReminderSync};
pub use repo::{NoteRepository, RepoError, RepoResult, Repository, TaskRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
