//! Note table mapping.
//!
//! # Invariants
//! - Rows live in `notes`; attachment categories map to JSON columns.

use super::{attachment_values, read_attachments, Repository};
use crate::db::Persisted;
use crate::model::note::Note;
use rusqlite::types::Value;
use rusqlite::Row;

/// Repository for [`Note`] records.
pub type NoteRepository = Repository<Note>;

impl Persisted for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "image_refs",
        "video_refs",
        "audio_refs",
    ];

    fn column_values(&self) -> Vec<Value> {
        let mut values = vec![
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
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
            attachments: read_attachments(row, Self::TABLE, id)?,
        })
    }
}
