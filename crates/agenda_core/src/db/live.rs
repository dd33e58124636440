//! Live (reactive) query subscriptions.
//!
//! # Invariants
//! - A subscription starts at its initial value and converges to the current
//!   query result without further action from the subscriber.
//! - Dropping a [`LiveQuery`] stops its refresher and releases the table watch.
//! - A failed refresh keeps the last delivered value.

use super::store::Store;
use super::DbResult;
use log::error;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The refresher behind a subscription has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionClosed;

impl Display for SubscriptionClosed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "live query subscription closed")
    }
}

impl Error for SubscriptionClosed {}

/// Continuously updated query result.
///
/// Must be created inside a Tokio runtime. Hold it for as long as the
/// consumer is alive and drop it on teardown.
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
    refresher: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub(crate) fn spawn<F>(store: Store, table: &'static str, initial: T, loader: F) -> Self
    where
        F: Fn(&Connection) -> DbResult<T> + Send + Sync + 'static,
    {
        let (tx, rx) = watch::channel(initial);
        // Subscribe before the first load so no change can slip in between.
        let mut changes = store.subscribe_changes(table);
        let loader = Arc::new(loader);

        let refresher = tokio::spawn(async move {
            loop {
                let load = Arc::clone(&loader);
                match store.run(move |conn| load(conn)).await {
                    Ok(value) => {
                        tx.send_if_modified(|current| {
                            if *current == value {
                                false
                            } else {
                                *current = value;
                                true
                            }
                        });
                    }
                    Err(err) => error!(
                        "event=live_query module=db status=error table={} error={}",
                        table, err
                    ),
                }

                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
        });

        Self { rx, refresher }
    }

    /// Latest delivered value.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next value different from the last one seen.
    pub async fn changed(&mut self) -> Result<T, SubscriptionClosed> {
        self.rx.changed().await.map_err(|_| SubscriptionClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Waits until the delivered value satisfies `predicate`, checking the
    /// current value first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&T) -> bool,
    ) -> Result<T, SubscriptionClosed> {
        let value = self
            .rx
            .wait_for(predicate)
            .await
            .map_err(|_| SubscriptionClosed)?;
        Ok(T::clone(&value))
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.refresher.abort();
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Store;
    use crate::model::note::Note;
    use std::time::Duration;

    #[tokio::test]
    async fn dropping_live_query_stops_its_refresher() {
        let store = Store::open_in_memory().unwrap();
        let mut notes = store.query_all::<Note>();
        store.insert(&Note::new("before", "")).await.unwrap();
        notes.wait_for(|notes| notes.len() == 1).await.unwrap();

        let refresher = notes.refresher.abort_handle();
        assert!(!refresher.is_finished());
        drop(notes);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !refresher.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("refresher should stop after the query is dropped");

        store.insert(&Note::new("after", "")).await.unwrap();
        assert_eq!(store.fetch_all::<Note>().await.unwrap().len(), 2);
    }
}
