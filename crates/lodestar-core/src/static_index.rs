//! One-time loading of a bounded index.
//!
//! Some providers fetch a complete list once (every image name, every
//! species) and pick from it locally afterwards. [`StaticIndex`] loads on
//! first use and keeps the result for the life of the process. Concurrent
//! loads are not queued: while one is in flight, other callers get
//! [`ProviderError::Busy`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tokio::sync::RwLock;

use crate::error::{ProviderError, ProviderResult};

/// Something that can fetch a complete index in one call.
#[async_trait]
pub trait IndexSource: Send + Sync + 'static {
    /// Entry type of the index.
    type Item: Send + Sync + 'static;

    /// Name used in errors and log lines.
    fn name(&self) -> &str;

    /// Fetch the whole index.
    async fn fetch_index(&self) -> ProviderResult<Vec<Self::Item>>;
}

struct LoadGuard<'a>(&'a AtomicBool);

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// An index fetched once and cached in memory.
pub struct StaticIndex<S: IndexSource> {
    source: S,
    items: RwLock<Option<Arc<Vec<S::Item>>>>,
    loading: AtomicBool,
}

impl<S: IndexSource> fmt::Debug for StaticIndex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticIndex")
            .field("source", &self.source.name())
            .field("loading", &self.loading.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<S: IndexSource> StaticIndex<S> {
    /// Create an uninitialised index over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            items: RwLock::new(None),
            loading: AtomicBool::new(false),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether the index has been loaded.
    pub async fn is_initialized(&self) -> bool {
        self.items.read().await.is_some()
    }

    /// The loaded index, fetching it first if needed.
    ///
    /// # Errors
    /// [`ProviderError::Busy`] while another load is in flight, or the
    /// source's error if the load fails. A failed load leaves the index
    /// uninitialised so the next call tries again.
    pub async fn get(&self) -> ProviderResult<Arc<Vec<S::Item>>> {
        if let Some(items) = self.items.read().await.as_ref() {
            return Ok(Arc::clone(items));
        }

        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProviderError::Busy {
                source_name: self.source.name().to_string(),
            });
        }
        let _guard = LoadGuard(&self.loading);

        // Another caller may have finished loading between the read above
        // and taking the flag.
        if let Some(items) = self.items.read().await.as_ref() {
            return Ok(Arc::clone(items));
        }

        let fetched = Arc::new(self.source.fetch_index().await?);
        log::info!(
            "{}: loaded index of {} entries",
            self.source.name(),
            fetched.len()
        );
        *self.items.write().await = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Pick a random entry from the index, loading it first if needed.
    ///
    /// # Errors
    /// As [`get`](Self::get), plus [`ProviderError::Unavailable`] if the
    /// loaded index is empty.
    pub async fn pick_random(&self) -> ProviderResult<S::Item>
    where
        S::Item: Clone,
    {
        let items = self.get().await?;
        items
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable {
                source_name: self.source.name().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Letters {
        calls: Arc<AtomicUsize>,
        fail_first: bool,
    }

    #[async_trait]
    impl IndexSource for Letters {
        type Item = char;

        fn name(&self) -> &str {
            "letters"
        }

        async fn fetch_index(&self) -> ProviderResult<Vec<char>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(ProviderError::Timeout {
                    url: "http://letters".to_string(),
                });
            }
            Ok(vec!['a', 'b', 'c'])
        }
    }

    fn letters(fail_first: bool) -> (StaticIndex<Letters>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let index = StaticIndex::new(Letters {
            calls: Arc::clone(&calls),
            fail_first,
        });
        (index, calls)
    }

    #[tokio::test]
    async fn test_loads_once() {
        let (index, calls) = letters(false);
        assert!(!index.is_initialized().await);
        assert_eq!(index.get().await.unwrap().len(), 3);
        assert_eq!(index.get().await.unwrap().len(), 3);
        assert!(index.is_initialized().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_retries_next_time() {
        let (index, calls) = letters(true);
        assert!(matches!(
            index.get().await,
            Err(ProviderError::Timeout { .. })
        ));
        assert!(!index.is_initialized().await);
        assert!(index.get().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pick_random_from_index() {
        let (index, _) = letters(false);
        let picked = index.pick_random().await.unwrap();
        assert!(['a', 'b', 'c'].contains(&picked));
    }
}
