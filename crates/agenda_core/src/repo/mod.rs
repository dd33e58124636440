//! Repositories: the only callers of the persistence gateway.
//!
//! # Responsibility
//! - Validate records before writes.
//! - Encode attachment lists into columns on write and decode them on read.
//! - Re-expose gateway reads as one-shot or live queries.
//!
//! # Invariants
//! - Write paths call `Entity::validate()` before any SQL.
//! - Read paths never fail because of attachment column content.
//! - A missing id on update/delete is reported as `Ok(false)`, not an error.

pub mod note_repo;
pub mod task_repo;

use crate::codec::{self, ColumnDecode};
use crate::db::{DbError, LiveQuery, Persisted, Store, TextColumn};
use crate::model::attachment::{AttachmentKind, Attachments};
use crate::model::{RecordId, ValidationError};
use crate::search::TextQuery;
use log::warn;
use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub use note_repo::NoteRepository;
pub use task_repo::TaskRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// The record was rejected before reaching storage.
    Validation(ValidationError),
    /// The storage engine failed; the caller may retry.
    Storage(DbError),
}

impl RepoError {
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

/// Repository for one record type.
pub struct Repository<E> {
    store: Store,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Persisted> Repository<E> {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Validates and inserts `record`, returning the assigned id.
    pub async fn add(&self, record: &E) -> RepoResult<RecordId> {
        record.validate()?;
        Ok(self.store.insert(record).await?)
    }

    /// Validates and fully replaces the stored record with the same id.
    ///
    /// Returns `false` when no such record exists.
    pub async fn update(&self, record: &E) -> RepoResult<bool> {
        record.validate()?;
        Ok(self.store.update(record).await?)
    }

    /// Deletes the stored record with `record.id()`.
    ///
    /// Returns `false` when no such record exists.
    pub async fn delete(&self, record: &E) -> RepoResult<bool> {
        Ok(self.store.delete::<E>(record.id()).await?)
    }

    /// One-shot read of one record.
    pub async fn get(&self, id: RecordId) -> RepoResult<Option<E>> {
        Ok(self.store.fetch_by_id(id).await?)
    }

    /// One-shot read of every record, ordered by id.
    pub async fn list(&self) -> RepoResult<Vec<E>> {
        Ok(self.store.fetch_all().await?)
    }

    /// Live list of every record, ordered by id.
    pub fn all(&self) -> LiveQuery<Vec<E>> {
        self.store.query_all()
    }

    /// Live optional record; `None` while absent or after deletion.
    pub fn by_id(&self, id: RecordId) -> LiveQuery<Option<E>> {
        self.store.query_by_id(id)
    }

    /// Live list of records whose title or description contains `text`,
    /// ignoring case. Blank text matches everything.
    pub fn search(&self, text: impl Into<String>) -> LiveQuery<Vec<E>> {
        let query = TextQuery::new(text);
        self.filtered(move |record| query.matches(record.title(), record.description()))
    }

    /// Live list of records accepted by `predicate`, ordered by id.
    pub fn filtered<P>(&self, predicate: P) -> LiveQuery<Vec<E>>
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.store.query_with(E::TABLE, Vec::new(), move |conn| {
            let records = crate::db::store::select_all::<E>(conn)?;
            Ok(records.into_iter().filter(|record| predicate(record)).collect())
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

const ATTACHMENT_COLUMNS: [(AttachmentKind, &str); 3] = [
    (AttachmentKind::Image, "image_refs"),
    (AttachmentKind::Video, "video_refs"),
    (AttachmentKind::Audio, "audio_refs"),
];

/// Column values for the three attachment categories, in column order.
pub(crate) fn attachment_values(attachments: &Attachments) -> [Value; 3] {
    ATTACHMENT_COLUMNS.map(|(kind, _)| Value::Text(codec::encode_column(attachments.get(kind))))
}

/// Decodes the attachment columns of `row`, repairing malformed content.
///
/// Only a missing column name fails; bad content of any storage class reads
/// as a best-effort list.
pub(crate) fn read_attachments(
    row: &Row<'_>,
    table: &'static str,
    id: RecordId,
) -> rusqlite::Result<Attachments> {
    let mut lists: [Vec<String>; 3] = Default::default();
    for (slot, (kind, column)) in lists.iter_mut().zip(ATTACHMENT_COLUMNS) {
        let raw = TextColumn::from_value(row.get_ref(column)?);
        let decoded = codec::decode_column(raw.as_str());
        if decoded.is_degraded() || !raw.is_clean() {
            warn!(
                "event=attachments_decode module=repo status=degraded table={} id={} kind={}",
                table,
                id,
                kind.as_str()
            );
        }
        *slot = ColumnDecode::into_references(decoded);
    }
    let [images, videos, audio] = lists;
    Ok(Attachments::from_parts(images, videos, audio))
}
