//! Item-parallel execution of per-structure work on the blocking thread pool.

use crate::error::Result;
use futures_util::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// What became of one item.
#[derive(Debug)]
pub enum ItemResult<T> {
    Finished(T),
    /// The item did not finish within its budget. Its task is detached and its result
    /// discarded.
    TimedOut,
    /// The work function panicked.
    Panicked(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub completed: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub failed: usize,
    /// Timed-out tasks still occupying a blocking thread when the batch ended.
    /// Already counted in `timed_out`.
    pub abandoned: usize,
}

impl BatchTally {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.timed_out + self.failed
    }
}

impl fmt::Display for BatchTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} skipped, {} timed out, {} failed",
            self.completed, self.skipped, self.timed_out, self.failed
        )?;
        if self.abandoned > 0 {
            write!(f, " ({} abandoned tasks still running)", self.abandoned)?;
        }
        Ok(())
    }
}

/// Runs `work` on every item with at most `jobs` items in flight, and hands the
/// results to `consume` in input order.
///
/// `consume` runs on the calling task, so it is the only writer of whatever state it
/// captures. An error from `consume` stops the batch.
///
/// Timed-out tasks cannot be cancelled once they hold a blocking thread. Returns how
/// many of them are still running when the last result has been consumed.
pub async fn run_items<I, T, W, C>(
    items: Vec<I>,
    jobs: usize,
    timeout: Duration,
    work: W,
    mut consume: C,
) -> Result<usize>
where
    I: Clone + Send + 'static,
    T: Send + 'static,
    W: Fn(I) -> T + Send + Sync + 'static,
    C: FnMut(I, ItemResult<T>) -> Result<()>,
{
    let work = Arc::new(work);
    let mut results = stream::iter(items.into_iter().map(|item| {
        let work = Arc::clone(&work);
        async move {
            let input = item.clone();
            let mut handle = tokio::task::spawn_blocking(move || (*work)(input));
            let (result, detached) = match tokio::time::timeout(timeout, &mut handle).await {
                Ok(Ok(value)) => (ItemResult::Finished(value), None),
                Ok(Err(join_error)) => {
                    error!("Worker task failed: {}", join_error);
                    (ItemResult::Panicked(join_error.to_string()), None)
                }
                Err(_) => {
                    warn!("Item exceeded its {:?} budget and was abandoned.", timeout);
                    (ItemResult::TimedOut, Some(handle))
                }
            };
            (item, result, detached)
        }
    }))
    .buffered(jobs.max(1));

    let mut detached: Vec<JoinHandle<T>> = Vec::new();
    while let Some((item, result, handle)) = results.next().await {
        detached.extend(handle);
        consume(item, result)?;
    }

    let still_running = detached.iter().filter(|h| !h.is_finished()).count();
    if still_running > 0 {
        warn!(
            abandoned = detached.len(),
            still_running, "Timed-out tasks are still holding blocking threads."
        );
    }
    Ok(still_running)
}
