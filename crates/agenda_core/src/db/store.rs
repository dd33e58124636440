//! Persistence gateway over the process-wide SQLite connection.
//!
//! # Responsibility
//! - Typed insert/update/delete/query for any [`Persisted`] record.
//! - Live queries that re-run whenever the backing table changes.
//! - Keep blocking SQLite work off async callers via `spawn_blocking`.
//!
//! # Invariants
//! - One connection behind one mutex: writes apply one at a time, in the order
//!   their calls acquire the lock.
//! - `update`/`delete` of a missing id is a no-op reported as `false`.
//! - List queries are ordered by `id` ascending.
//! - Change notification comes from SQLite itself, so writes made through
//!   [`Store::with_connection`] are observed as well.

use super::changes::ChangeFeed;
use super::live::LiveQuery;
use super::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::{Entity, RecordId};
use log::{debug, error};
use rusqlite::hooks::Action;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;

/// Table mapping for a record type.
///
/// Implementations live next to the repository that owns the record, which is
/// where attachment lists are encoded into and decoded from columns.
pub trait Persisted: Entity {
    const TABLE: &'static str;
    /// Written columns in bind order, excluding `id`.
    const COLUMNS: &'static [&'static str];

    /// Values for [`Self::COLUMNS`], same order.
    fn column_values(&self) -> Vec<Value>;

    /// Builds a record from a row selected as `id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Cloneable handle to the storage engine.
///
/// Construct once at startup and pass to each repository.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    conn: Mutex<Connection>,
    changes: ChangeFeed,
}

impl Store {
    /// Opens a database file, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection and starts change tracking.
    pub fn from_connection(conn: Connection) -> Self {
        let changes = ChangeFeed::default();
        let hook_feed = changes.clone();
        conn.update_hook(Some(
            move |_action: Action, _db: &str, table: &str, _rowid: i64| {
                hook_feed.notify(table);
            },
        ));

        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                changes,
            }),
        }
    }

    /// Runs `f` with exclusive access to the connection on the calling thread.
    ///
    /// Blocking; intended for maintenance and tests. Changes made here are
    /// still delivered to live queries.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let conn = self
            .inner
            .conn
            .lock()
            .map_err(|_| DbError::Unavailable("connection lock poisoned".to_string()))?;
        f(&conn)
    }

    /// Runs `f` on the blocking pool with exclusive access to the connection.
    pub(crate) async fn run<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DbResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_connection(f))
            .await
            .map_err(|err| DbError::Unavailable(format!("storage worker failed: {err}")))?
    }

    pub(crate) fn subscribe_changes(&self, table: &str) -> watch::Receiver<u64> {
        self.inner.changes.subscribe(table)
    }

    /// Inserts `record` and returns the id assigned by storage.
    ///
    /// Any id already set on `record` is ignored.
    pub async fn insert<E: Persisted>(&self, record: &E) -> DbResult<RecordId> {
        let values = record.column_values();
        let started_at = Instant::now();
        let result = self
            .run(move |conn| {
                conn.execute(&insert_sql::<E>(), params_from_iter(values))?;
                Ok(conn.last_insert_rowid())
            })
            .await;
        log_write::<E, _>("insert", started_at, &result, |id| format!("id={id}"));
        result
    }

    /// Replaces the stored row with `record.id()`. Returns whether a row matched.
    pub async fn update<E: Persisted>(&self, record: &E) -> DbResult<bool> {
        let id = record.id();
        if id <= 0 {
            debug!(
                "event=store_update module=db status=noop table={} reason=unsaved",
                E::TABLE
            );
            return Ok(false);
        }

        let mut values = record.column_values();
        values.push(Value::Integer(id));
        let started_at = Instant::now();
        let result = self
            .run(move |conn| Ok(conn.execute(&update_sql::<E>(), params_from_iter(values))? > 0))
            .await;
        log_write::<E, _>("update", started_at, &result, |applied| {
            format!("id={id} applied={applied}")
        });
        result
    }

    /// Removes the row with `id`. Returns whether a row matched.
    pub async fn delete<E: Persisted>(&self, id: RecordId) -> DbResult<bool> {
        if id <= 0 {
            return Ok(false);
        }

        let started_at = Instant::now();
        let result = self
            .run(move |conn| {
                let sql = format!("DELETE FROM {} WHERE id = ?1;", E::TABLE);
                Ok(conn.execute(&sql, [id])? > 0)
            })
            .await;
        log_write::<E, _>("delete", started_at, &result, |applied| {
            format!("id={id} applied={applied}")
        });
        result
    }

    /// One-shot read of every row, ordered by id.
    pub async fn fetch_all<E: Persisted>(&self) -> DbResult<Vec<E>> {
        self.run(select_all::<E>).await
    }

    /// One-shot read of one row.
    pub async fn fetch_by_id<E: Persisted>(&self, id: RecordId) -> DbResult<Option<E>> {
        self.run(move |conn| select_by_id::<E>(conn, id)).await
    }

    /// Live view of every row of `E`, starting from an empty list.
    pub fn query_all<E: Persisted>(&self) -> LiveQuery<Vec<E>> {
        self.query_with(E::TABLE, Vec::new(), select_all::<E>)
    }

    /// Live view of zero or one row; `None` while absent.
    pub fn query_by_id<E: Persisted>(&self, id: RecordId) -> LiveQuery<Option<E>> {
        self.query_with(E::TABLE, None, move |conn| select_by_id::<E>(conn, id))
    }

    /// Live view of an arbitrary read over `table`.
    ///
    /// `loader` re-runs after every change to `table`; subscribers only see a
    /// new value when the result differs from the previous one.
    pub fn query_with<T, F>(&self, table: &'static str, initial: T, loader: F) -> LiveQuery<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&Connection) -> DbResult<T> + Send + Sync + 'static,
    {
        LiveQuery::spawn(self.clone(), table, initial, loader)
    }
}

/// Reads every row of `E` ordered by id.
pub(crate) fn select_all<E: Persisted>(conn: &Connection) -> DbResult<Vec<E>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC;", select_sql::<E>()))?;
    let rows = stmt.query_map([], |row| E::from_row(row))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn select_by_id<E: Persisted>(conn: &Connection, id: RecordId) -> DbResult<Option<E>> {
    let sql = format!("{} WHERE id = ?1;", select_sql::<E>());
    Ok(conn.query_row(&sql, [id], |row| E::from_row(row)).optional()?)
}

fn select_sql<E: Persisted>() -> String {
    format!("SELECT id, {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

fn insert_sql<E: Persisted>() -> String {
    let placeholders = (1..=E::COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        E::TABLE,
        E::COLUMNS.join(", "),
        placeholders
    )
}

fn update_sql<E: Persisted>() -> String {
    let assignments = E::COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE id = ?{};",
        E::TABLE,
        assignments,
        E::COLUMNS.len() + 1
    )
}

fn log_write<E: Persisted, T>(
    op: &'static str,
    started_at: Instant,
    result: &DbResult<T>,
    describe: impl FnOnce(&T) -> String,
) {
    match result {
        Ok(value) => debug!(
            "event=store_{op} module=db status=ok table={} {} duration_ms={}",
            E::TABLE,
            describe(value),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=store_{op} module=db status=error table={} duration_ms={} error={}",
            E::TABLE,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
