//! Per-table change counters fed by SQLite's update hook.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Version counter per table, bumped on every row change.
///
/// Subscribers only observe "something changed"; they re-run their query to
/// learn what.
#[derive(Clone, Default)]
pub(crate) struct ChangeFeed {
    tables: Arc<Mutex<HashMap<String, watch::Sender<u64>>>>,
}

impl ChangeFeed {
    /// Records a change to `table`. Tables nobody watches are ignored.
    pub(crate) fn notify(&self, table: &str) {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = tables.get(table) {
            sender.send_modify(|version| *version = version.wrapping_add(1));
        }
    }

    /// Returns a receiver whose current version is already marked as seen.
    pub(crate) fn subscribe(&self, table: &str) -> watch::Receiver<u64> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(table.to_string())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }
}
