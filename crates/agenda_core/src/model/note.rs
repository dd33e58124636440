//! Note record.

use super::attachment::Attachments;
use super::{Entity, RecordId};
use serde::{Deserialize, Serialize};

/// Free-form note with optional media attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Storage-assigned id, `0` until inserted.
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub attachments: Attachments,
}

impl Note {
    /// Creates an unsaved note without attachments.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            attachments: Attachments::default(),
        }
    }

    pub fn with_attachments(mut self, attachments: Attachments) -> Self {
        self.attachments = attachments;
        self
    }
}

impl Entity for Note {
    const KIND: &'static str = "note";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn attachments(&self) -> &Attachments {
        &self.attachments
    }
}
