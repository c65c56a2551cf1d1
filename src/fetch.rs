use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;

/// Outcome of one failed item inside a bounded batch.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    /// Index of the failed item in the original input list.
    pub index: usize,
    pub reason: String,
}

/// Flattened successes plus the failures that were tolerated along the way.
/// Per-item failures never abort the batch; callers decide whether a
/// non-empty failure list matters.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub items: Vec<T>,
    pub failures: Vec<ItemFailure>,
}

impl<T> BatchOutcome<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Runs `worker` over `inputs` with at most `min(limit, len)` tasks in
/// flight. Each task claims the next unclaimed input, runs the worker and,
/// win or fail, sleeps `pace` before claiming again, bounding the sustained
/// downstream rate to roughly `limit / pace` items per second.
///
/// Output ordering across items is not guaranteed (workers race); only the
/// order within one item's output vec is preserved. Callers that need a
/// stable order must sort downstream.
pub async fn map_bounded<I, T, E, F, Fut>(
    inputs: Vec<I>,
    limit: usize,
    pace: Duration,
    worker: F,
) -> BatchOutcome<T>
where
    I: Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(I) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
{
    if inputs.is_empty() {
        return BatchOutcome::empty();
    }
    let tasks = limit.max(1).min(inputs.len());
    let queue = Arc::new(Mutex::new(inputs.into_iter().enumerate()));

    let mut handles = Vec::with_capacity(tasks);
    for _ in 0..tasks {
        let queue = Arc::clone(&queue);
        let worker = worker.clone();
        handles.push(tokio::spawn(async move {
            let mut items = Vec::new();
            let mut failures = Vec::new();
            loop {
                // Guard dropped before the await points below
                let claimed = queue.lock().expect("input queue poisoned").next();
                let Some((index, input)) = claimed else { break };
                match worker(input).await {
                    Ok(mut produced) => items.append(&mut produced),
                    Err(e) => {
                        warn!(index, error = %e, "batch item failed, continuing");
                        failures.push(ItemFailure {
                            index,
                            reason: e.to_string(),
                        });
                    }
                }
                tokio::time::sleep(pace).await;
            }
            (items, failures)
        }));
    }

    // Results are appended only after each task has finished, so the shared
    // accumulator never sees concurrent writers.
    let mut outcome = BatchOutcome::empty();
    for handle in handles {
        match handle.await {
            Ok((mut items, mut failures)) => {
                outcome.items.append(&mut items);
                outcome.failures.append(&mut failures);
            }
            Err(e) => warn!(error = %e, "batch task panicked"),
        }
    }
    outcome.failures.sort_by_key(|f| f.index);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RadarError;

    fn quick() -> Duration {
        Duration::from_millis(1)
    }

    #[tokio::test]
    async fn tolerates_per_item_failure() {
        let outcome = map_bounded(vec![1u32, 2, 3, 4, 5], 2, quick(), |n| async move {
            if n == 3 {
                Err(RadarError::Provider {
                    message: format!("item {} exploded", n),
                })
            } else {
                Ok(vec![n * 10])
            }
        })
        .await;

        let mut items = outcome.items.clone();
        items.sort();
        assert_eq!(items, vec![10, 20, 40, 50]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 2);
        assert!(outcome.failures[0].reason.contains("item 3 exploded"));
    }

    #[tokio::test]
    async fn empty_input_resolves_immediately() {
        let outcome =
            map_bounded(Vec::<u32>::new(), 4, quick(), |n| async move {
                Ok::<_, RadarError>(vec![n])
            })
            .await;
        assert!(outcome.items.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn limit_larger_than_input() {
        let outcome = map_bounded(vec![7u32, 8], 16, quick(), |n| async move {
            Ok::<_, RadarError>(vec![n])
        })
        .await;
        let mut items = outcome.items;
        items.sort();
        assert_eq!(items, vec![7, 8]);
    }

    #[tokio::test]
    async fn flattens_multi_output_items() {
        let outcome = map_bounded(vec![2u32, 3], 1, quick(), |n| async move {
            Ok::<_, RadarError>((0..n).collect())
        })
        .await;
        assert_eq!(outcome.items.len(), 5);
    }

    #[tokio::test]
    async fn zero_limit_is_clamped() {
        let outcome = map_bounded(vec![1u32], 0, quick(), |n| async move {
            Ok::<_, RadarError>(vec![n])
        })
        .await;
        assert_eq!(outcome.items, vec![1]);
    }
}
