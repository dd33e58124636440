//! Domain model for notes and tasks.
//!
//! # Responsibility
//! - Define the record shapes shared by repositories and controllers.
//! - Validate attachment references before they reach storage.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; storage assigns ids on insert.
//! - Records are replaced as a whole on update, never field by field.

pub mod attachment;
pub mod note;
pub mod task;

use attachment::{AttachmentKind, Attachments};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier of a note or task row.
pub type RecordId = i64;

/// Rejection reasons for records that must not be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A reference is empty or whitespace only.
    EmptyReference { kind: AttachmentKind },
    /// A reference starts or ends with whitespace.
    UntrimmedReference { kind: AttachmentKind },
    /// A reference contains one of the wire-format separators.
    ReservedSeparator {
        kind: AttachmentKind,
        separator: char,
    },
    /// Due-date input could not be turned into a concrete instant.
    InvalidDueDate { reason: &'static str },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReference { kind } => write!(f, "empty {} reference", kind.as_str()),
            Self::UntrimmedReference { kind } => write!(
                f,
                "{} reference has leading or trailing whitespace",
                kind.as_str()
            ),
            Self::ReservedSeparator { kind, separator } => write!(
                f,
                "{} reference contains reserved separator `{separator}`",
                kind.as_str()
            ),
            Self::InvalidDueDate { reason } => write!(f, "invalid due date: {reason}"),
        }
    }
}

impl Error for ValidationError {}

/// Common view over the persisted record types.
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    /// Short lowercase name used in log events.
    const KIND: &'static str;

    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn attachments(&self) -> &Attachments;

    /// Whether storage has assigned an id to this record.
    fn is_persisted(&self) -> bool {
        self.id() > 0
    }

    /// Checks the record can be written without losing information.
    fn validate(&self) -> Result<(), ValidationError> {
        self.attachments().validate()
    }
}
