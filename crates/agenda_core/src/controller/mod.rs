//! View-state controllers for the presentation layer.
//!
//! # Responsibility
//! - Expose live record views and fire-and-forget mutation intents.
//! - Keep the presentation layer unaware of repositories and storage.
//!
//! # Invariants
//! - Controllers cache nothing; storage is the source of truth.
//! - Mutation completion is observed through live queries or an optional
//!   [`Mutation`] handle, never through callbacks into the UI.

mod task_controller;
pub mod view_state;

use crate::model::note::Note;

pub use task_controller::TaskController;
pub use view_state::{
    ControllerError, Mutation, MutationFailure, MutationHook, MutationKind, MutationOutcome,
    ViewStateController, DEFAULT_FAILURE_CAPACITY,
};

/// Controller for notes.
pub type NoteController = ViewStateController<Note>;
