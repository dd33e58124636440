//! SQLite storage: bootstrap, migrations and the persistence gateway.
//!
//! # Responsibility
//! - Open and configure the single SQLite connection for the process.
//! - Apply schema migrations in deterministic order.
//! - Expose typed async CRUD plus live queries through [`Store`].
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No application data is read or written before migrations succeed.
//! - [`Store`] is the only component that touches the connection.

use rusqlite::types::ValueRef;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod changes;
pub mod live;
pub mod migrations;
mod open;
pub mod store;

pub use live::{LiveQuery, SubscriptionClosed};
pub use open::{open_db, open_db_in_memory};
pub use store::{Persisted, Store};

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure. Every variant is a retryable-by-caller failure of the
/// underlying engine; none is raised for missing rows.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The connection could not be reached (poisoned lock, lost worker).
    Unavailable(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Content of a column expected to hold text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TextColumn {
    Text(String),
    /// Stored bytes were not valid UTF-8; invalid sequences were replaced.
    Repaired(String),
    /// `NULL` or a non-text storage class.
    Missing,
}

impl TextColumn {
    /// Reads `value` without ever failing on its storage class or encoding.
    pub(crate) fn from_value(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Self::Text(text.to_string()),
                Err(_) => Self::Repaired(String::from_utf8_lossy(bytes).into_owned()),
            },
            ValueRef::Null | ValueRef::Integer(_) | ValueRef::Real(_) | ValueRef::Blob(_) => {
                Self::Missing
            }
        }
    }

    pub(crate) fn is_clean(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Text to decode; empty when missing.
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Self::Text(text) | Self::Repaired(text) => text,
            Self::Missing => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextColumn;
    use rusqlite::types::ValueRef;

    #[test]
    fn text_column_never_fails_on_unexpected_storage() {
        assert_eq!(
            TextColumn::from_value(ValueRef::Text(b"[\"a\"]")),
            TextColumn::Text("[\"a\"]".to_string())
        );
        let repaired = TextColumn::from_value(ValueRef::Text(&[b'a', 0xFF]));
        assert!(!repaired.is_clean());
        assert!(repaired.as_str().starts_with('a'));
        for value in [
            ValueRef::Null,
            ValueRef::Integer(7),
            ValueRef::Real(1.5),
            ValueRef::Blob(&[0xFF, 0x00, 0xFE]),
        ] {
            let column = TextColumn::from_value(value);
            assert_eq!(column, TextColumn::Missing);
            assert_eq!(column.as_str(), "");
        }
    }
}
