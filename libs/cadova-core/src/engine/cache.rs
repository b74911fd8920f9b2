//! Promise map with an at-most-one computation guarantee.

use crate::error::EvaluationError;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// A keyed map of shared computations.
///
/// For a given key, the first caller starts the computation; concurrent
/// callers await the same cell and observe the identical result. Failures
/// are stored like successes, so identical requests replay the identical
/// error and nothing is retried.
///
/// Inserting the promise and starting the work are atomic with respect to
/// the map lock; fulfilment itself happens outside the lock.
pub struct PromiseCache<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<Result<V, EvaluationError>>>>>,
}

impl<K, V> PromiseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached result for `key`, computing it at most once.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V, EvaluationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, EvaluationError>>,
    {
        let cell = {
            let mut cells = match self.cells.lock() {
                Ok(cells) => cells,
                Err(poisoned) => poisoned.into_inner(),
            };
            cells
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(compute).await.clone()
    }

    /// Number of keys ever requested.
    pub fn len(&self) -> usize {
        match self.cells.lock() {
            Ok(cells) => cells.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True when nothing was ever requested.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for PromiseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_computes_once_per_key() {
        let cache: PromiseCache<u32, u32> = PromiseCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..5 {
            let value = cache
                .get_or_compute(7, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_computation() {
        let cache: Arc<PromiseCache<u32, u32>> = Arc::new(PromiseCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(1, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(9)
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 9);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let cache: PromiseCache<u32, u32> = PromiseCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let result = cache
                .get_or_compute(3, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(EvaluationError::Cancelled)
                })
                .await;
            assert_eq!(result, Err(EvaluationError::Cancelled));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
