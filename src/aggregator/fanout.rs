//! Bounded fan-out
//!
//! Runs one future per item with at most `max_in_flight` running at a time,
//! and reports successes and failures separately.

use std::future::Future;

use futures::{stream, StreamExt};

/// Outcome of a fan-out, in input order.
#[derive(Debug)]
pub struct FanOutReport<K, T, E> {
    pub successes: Vec<(K, T)>,
    pub failures: Vec<(K, E)>,
}

impl<K, T, E> FanOutReport<K, T, E> {
    /// True when every item succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs `task` for each item, keeping at most `max_in_flight` in progress.
///
/// A `max_in_flight` of 0 is treated as 1. Results keep the input order.
pub async fn fan_out<I, K, T, E, F, Fut>(
    items: I,
    max_in_flight: usize,
    mut task: F,
) -> FanOutReport<K, T, E>
where
    I: IntoIterator<Item = K>,
    K: Clone,
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let results: Vec<(K, Result<T, E>)> = stream::iter(items)
        .map(|item| {
            let key = item.clone();
            let fut = task(item);
            async move { (key, fut.await) }
        })
        .buffered(max_in_flight.max(1))
        .collect()
        .await;

    let mut report = FanOutReport {
        successes: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for (key, result) in results {
        match result {
            Ok(value) => report.successes.push((key, value)),
            Err(err) => report.failures.push((key, err)),
        }
    }
    report
}
