#![allow(dead_code)]

use agenda_core::LiveQuery;
use std::time::Duration;

pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Waits until `query` publishes a value accepted by `predicate`.
pub async fn settle<T>(query: &mut LiveQuery<T>, predicate: impl FnMut(&T) -> bool) -> T
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    tokio::time::timeout(SETTLE_TIMEOUT, query.wait_for(predicate))
        .await
        .expect("live query did not settle in time")
        .expect("live query closed")
}

pub fn refs(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
