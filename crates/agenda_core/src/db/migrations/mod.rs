//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically, including Rust-side back-fills.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Back-fills decode defensively and never abort on malformed rows.

use crate::codec;
use crate::db::{DbError, DbResult, TextColumn};
use log::{info, warn};
use rusqlite::{params, Connection, Transaction};

type Backfill = fn(&Transaction<'_>) -> DbResult<()>;

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
    backfill: Option<Backfill>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
        backfill: None,
    },
    Migration {
        version: 2,
        sql: include_str!("0002_attachment_columns.sql"),
        backfill: Some(split_legacy_attachments),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_drop_legacy_attachments.sql"),
        backfill: None,
    },
];

const ENTITY_TABLES: [&str; 2] = ["notes", "tasks"];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        if let Some(backfill) = migration.backfill {
            backfill(&tx)?;
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={}",
            migration.version
        );
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

// Moves the pipe-encoded `attachments` text into one JSON column per category.
fn split_legacy_attachments(tx: &Transaction<'_>) -> DbResult<()> {
    for table in ENTITY_TABLES {
        let legacy_rows = {
            let mut stmt = tx.prepare(&format!("SELECT id, attachments FROM {table};"))?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, TextColumn::from_value(row.get_ref(1)?)))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut update = tx.prepare(&format!(
            "UPDATE {table}
             SET image_refs = ?1, video_refs = ?2, audio_refs = ?3
             WHERE id = ?4;"
        ))?;
        for (id, raw) in &legacy_rows {
            if !raw.is_clean() {
                warn!(
                    "event=db_backfill module=db status=degraded table={table} id={id} reason=non_text_attachments"
                );
            }
            let attachments = codec::decode(raw.as_str());
            update.execute(params![
                codec::encode_column(&attachments.images),
                codec::encode_column(&attachments.videos),
                codec::encode_column(&attachments.audio),
                id,
            ])?;
        }

        info!(
            "event=db_backfill module=db status=ok table={table} rows={}",
            legacy_rows.len()
        );
    }
    Ok(())
}
