//! Media attachment lists carried by notes and tasks.
//!
//! # Responsibility
//! - Hold three ordered reference lists: images, videos and audio.
//! - Validate references against the wire-format separators.
//!
//! # Invariants
//! - References are opaque; nothing here dereferences or parses them.
//! - A valid list survives `from_wire(to_wire(list))` unchanged.

use super::ValidationError;
use crate::codec::{self, CATEGORY_SEPARATOR, LIST_SEPARATOR};
use serde::{Deserialize, Serialize};

/// Media category of one attachment reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
}

impl AttachmentKind {
    /// Categories in wire order.
    pub const ALL: [AttachmentKind; 3] = [Self::Image, Self::Video, Self::Audio];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// Attachment references grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachments {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub audio: Vec<String>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(images: Vec<String>, videos: Vec<String>, audio: Vec<String>) -> Self {
        Self {
            images,
            videos,
            audio,
        }
    }

    /// Returns the references stored for `kind`.
    pub fn get(&self, kind: AttachmentKind) -> &[String] {
        match kind {
            AttachmentKind::Image => &self.images,
            AttachmentKind::Video => &self.videos,
            AttachmentKind::Audio => &self.audio,
        }
    }

    fn list_mut(&mut self, kind: AttachmentKind) -> &mut Vec<String> {
        match kind {
            AttachmentKind::Image => &mut self.images,
            AttachmentKind::Video => &mut self.videos,
            AttachmentKind::Audio => &mut self.audio,
        }
    }

    /// Appends a trimmed reference to `kind`.
    ///
    /// Returns `false` when the reference is blank or already present in that
    /// category; capture flows can report the same locator twice.
    pub fn push(&mut self, kind: AttachmentKind, reference: impl AsRef<str>) -> bool {
        let reference = reference.as_ref().trim();
        if reference.is_empty() {
            return false;
        }
        let list = self.list_mut(kind);
        if list.iter().any(|existing| existing == reference) {
            return false;
        }
        list.push(reference.to_string());
        true
    }

    /// Removes `reference` from `kind`. Returns whether anything was removed.
    pub fn remove(&mut self, kind: AttachmentKind, reference: &str) -> bool {
        let list = self.list_mut(kind);
        let before = list.len();
        list.retain(|existing| existing != reference);
        list.len() != before
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.videos.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every reference in wire order together with its category.
    pub fn iter(&self) -> impl Iterator<Item = (AttachmentKind, &str)> + '_ {
        AttachmentKind::ALL.into_iter().flat_map(move |kind| {
            self.get(kind)
                .iter()
                .map(move |reference| (kind, reference.as_str()))
        })
    }

    /// Rejects references that the wire format cannot represent faithfully.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (kind, reference) in self.iter() {
            if reference.trim().is_empty() {
                return Err(ValidationError::EmptyReference { kind });
            }
            if reference.trim() != reference {
                return Err(ValidationError::UntrimmedReference { kind });
            }
            for separator in [LIST_SEPARATOR, CATEGORY_SEPARATOR] {
                if reference.contains(separator) {
                    return Err(ValidationError::ReservedSeparator { kind, separator });
                }
            }
        }
        Ok(())
    }

    /// Encodes into the `images|videos|audio` interchange string.
    pub fn to_wire(&self) -> Result<String, ValidationError> {
        codec::encode(self)
    }

    /// Decodes an interchange string; malformed input degrades, never fails.
    pub fn from_wire(raw: &str) -> Self {
        codec::decode(raw)
    }
}
