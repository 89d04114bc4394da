use std::future::Future;

use futures::TryFutureExt;
use futures::stream::{self, StreamExt, TryStreamExt};

/// Bounded fan-out over a list of items.
///
/// At most `pool_size` invocations are in flight. Results come back in input order
/// whatever order the invocations complete in. The first error aborts the whole call:
/// invocations still in flight are dropped and no partial result is returned.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrentMapper {
    pool_size: usize,
}

impl ConcurrentMapper {
    pub fn new(pool_size: usize) -> Self {
        ConcurrentMapper { pool_size: pool_size.max(1) }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub async fn map<I, T, R, E, F, Fut>(&self, items: I, mut f: F) -> Result<Vec<R>, E>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let mut completed: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| f(item).map_ok(move |result| (index, result)))
            .buffer_unordered(self.pool_size)
            .try_collect()
            .await?;

        completed.sort_unstable_by_key(|(index, _)| *index);
        Ok(completed.into_iter().map(|(_, result)| result).collect())
    }

    /// Keeps the items for which `predicate` holds, in input order.
    pub async fn filter_by_predicate<T, E, F, Fut>(&self, items: &[T], predicate: F) -> Result<Vec<T>, E>
    where
        T: Clone,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        let keep = self.map(items.iter().cloned(), predicate).await?;

        Ok(items.iter().zip(keep).filter(|(_, keep)| *keep).map(|(item, _)| item.clone()).collect())
    }
}
