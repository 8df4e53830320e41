//! Bounded-concurrency execution of per-item async work.
//!
//! Both modes admit at most `concurrency` items at once and dispatch every
//! item exactly once. Batch mode writes each result back into the slot of
//! its input; streaming mode hands results over in completion order.

use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use tracing::debug;

/// Outcome of one item in streaming mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R, E> {
    /// The worker produced a value
    Completed { index: usize, value: R },
    /// The worker failed; the item is skipped by `run_streaming`
    Failed { index: usize, error: E },
}

impl<R, E> Outcome<R, E> {
    /// Position of the item in the input sequence.
    pub fn index(&self) -> usize {
        match self {
            Outcome::Completed { index, .. } | Outcome::Failed { index, .. } => *index,
        }
    }

    /// The produced value, discarding failures.
    pub fn into_value(self) -> Option<R> {
        match self {
            Outcome::Completed { value, .. } => Some(value),
            Outcome::Failed { .. } => None,
        }
    }
}

/// Counts reported by `run_streaming` once every item has settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Treat any bound below one as one.
pub fn effective_concurrency(concurrency: usize) -> usize {
    concurrency.max(1)
}

/// Run `worker` over `items`, returning results in input order.
///
/// The worker is expected to encode failure in its own return value.
pub async fn run_batch<I, T, F, Fut, R>(items: I, concurrency: usize, worker: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let items: Vec<T> = items.into_iter().collect();
    if items.is_empty() {
        return Vec::new();
    }

    let total = items.len();
    let limit = effective_concurrency(concurrency);
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completed = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let pending = worker(item);
            async move { (index, pending.await) }
        })
        .buffer_unordered(limit);

    while let Some((index, value)) = completed.next().await {
        slots[index] = Some(value);
    }

    let results: Vec<R> = slots.into_iter().flatten().collect();
    debug_assert_eq!(results.len(), total);
    results
}

/// Run a fallible `worker` over `items`, yielding outcomes as they complete.
pub fn stream_outcomes<I, T, F, Fut, R, E>(
    items: I,
    concurrency: usize,
    worker: F,
) -> impl Stream<Item = Outcome<R, E>>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    stream::iter(items.into_iter().enumerate())
        .map(move |(index, item)| {
            let pending = worker(item);
            async move {
                match pending.await {
                    Ok(value) => Outcome::Completed { index, value },
                    Err(error) => Outcome::Failed { index, error },
                }
            }
        })
        .buffer_unordered(effective_concurrency(concurrency))
}

/// Run a fallible `worker` over `items`, handing each success to `on_result`.
///
/// Failed items are skipped: they are counted in the summary but never
/// reach `on_result` and never stop the remaining items.
pub async fn run_streaming<I, T, F, Fut, R, E, C>(
    items: I,
    concurrency: usize,
    worker: F,
    mut on_result: C,
) -> StreamSummary
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: std::fmt::Display,
    C: FnMut(usize, R),
{
    let mut summary = StreamSummary::default();
    let outcomes = stream_outcomes(items, concurrency, worker);
    futures::pin_mut!(outcomes);

    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Outcome::Completed { index, value } => {
                summary.delivered += 1;
                on_result(index, value);
            }
            Outcome::Failed { index, error } => {
                summary.failed += 1;
                debug!(index, error = %error, "Skipping failed item");
            }
        }
    }

    summary
}
