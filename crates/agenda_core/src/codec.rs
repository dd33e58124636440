//! Attachment codecs.
//!
//! # Responsibility
//! - Encode/decode the `images|videos|audio` interchange string, where each
//!   category is a comma-joined reference list.
//! - Encode/decode the per-category JSON columns used by storage.
//!
//! # Invariants
//! - Encoding always emits exactly two category separators.
//! - Decoding never fails; malformed input degrades to a partial or empty
//!   list so every stored record stays readable.
//! - `decode(encode(list)?) == list` for every list that passes validation.

use crate::model::attachment::{AttachmentKind, Attachments};
use crate::model::ValidationError;
use log::warn;

/// Separates references inside one category.
pub const LIST_SEPARATOR: char = ',';
/// Separates the three categories.
pub const CATEGORY_SEPARATOR: char = '|';

/// Encodes attachments into the interchange string.
///
/// # Errors
/// Returns the first reference that would not survive a round trip
/// (blank, padded, or containing a separator).
pub fn encode(attachments: &Attachments) -> Result<String, ValidationError> {
    attachments.validate()?;

    let mut encoded = String::new();
    for (index, kind) in AttachmentKind::ALL.into_iter().enumerate() {
        if index > 0 {
            encoded.push(CATEGORY_SEPARATOR);
        }
        for (position, reference) in attachments.get(kind).iter().enumerate() {
            if position > 0 {
                encoded.push(LIST_SEPARATOR);
            }
            encoded.push_str(reference);
        }
    }
    Ok(encoded)
}

/// Decodes an interchange string.
///
/// Missing categories decode as empty; parts after the third are ignored.
pub fn decode(raw: &str) -> Attachments {
    let separators = raw.matches(CATEGORY_SEPARATOR).count();
    if separators != 2 {
        warn!(
            "event=attachments_decode module=codec status=degraded format=wire separators={}",
            separators
        );
    }

    let mut parts = raw.split(CATEGORY_SEPARATOR);
    let images = parts.next().map(decode_list).unwrap_or_default();
    let videos = parts.next().map(decode_list).unwrap_or_default();
    let audio = parts.next().map(decode_list).unwrap_or_default();
    Attachments::from_parts(images, videos, audio)
}

/// Splits one comma-joined category, trimming and dropping empty entries.
pub fn decode_list(part: &str) -> Vec<String> {
    part.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|reference| !reference.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of reading one attachment column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDecode {
    /// Stored text was a well-formed JSON string array.
    Clean(Vec<String>),
    /// Stored text needed repair; contains the best-effort references.
    Degraded(Vec<String>),
}

impl ColumnDecode {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn into_references(self) -> Vec<String> {
        match self {
            Self::Clean(references) | Self::Degraded(references) => references,
        }
    }
}

/// Encodes one category as a JSON string array.
pub fn encode_column(references: &[String]) -> String {
    serde_json::Value::from(references.to_vec()).to_string()
}

/// Decodes one category column.
///
/// Non-JSON text is read as a comma list so hand-edited or legacy values keep
/// their references; broken JSON decodes as empty.
pub fn decode_column(raw: &str) -> ColumnDecode {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ColumnDecode::Degraded(Vec::new());
    }

    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(references) => {
            let normalized: Vec<String> = references
                .iter()
                .map(|reference| reference.trim())
                .filter(|reference| !reference.is_empty())
                .map(str::to_string)
                .collect();
            if normalized == references {
                ColumnDecode::Clean(normalized)
            } else {
                ColumnDecode::Degraded(normalized)
            }
        }
        Err(_) if trimmed.starts_with('[') => ColumnDecode::Degraded(Vec::new()),
        Err(_) => ColumnDecode::Degraded(decode_list(trimmed)),
    }
}
