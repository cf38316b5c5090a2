use futures::{stream, StreamExt};
use std::{future::Future, num::NonZeroUsize};

/// Runs one operation per item and collects every result, in input order. Items are always
/// all attempted; failures are values in the output, never an early exit.
#[derive(Clone, Copy, Debug)]
pub struct BatchStage {
    concurrency: NonZeroUsize,
}

impl Default for BatchStage {
    /// One operation in flight at a time.
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
        }
    }
}

impl BatchStage {
    /// A stage which keeps at most `concurrency` operations in flight.
    #[must_use]
    pub fn with_concurrency(concurrency: NonZeroUsize) -> Self {
        Self { concurrency }
    }

    /// Applies `op` to every item.
    pub async fn run<'a, T, R, F, Fut>(&self, items: &'a [T], op: F) -> Vec<R>
    where
        F: FnMut(&'a T) -> Fut,
        Fut: Future<Output = R>,
    {
        stream::iter(items)
            .map(op)
            .buffered(self.concurrency.get())
            .collect()
            .await
    }
}
