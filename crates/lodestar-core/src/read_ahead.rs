//! Read-ahead buffering for "one random item" endpoints.
//!
//! A [`ReadAheadBuffer`] fetches items in batches from a [`BatchSource`]
//! and hands them out one at a time in FIFO order. When the buffer drains
//! to its low-water mark a background refill is spawned, so consumers
//! rarely wait on the network. Only one refill runs at a time; a second
//! attempt fails fast with [`ProviderError::Busy`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{log_failure, ProviderError, ProviderResult};

/// Low-water mark used when a provider does not pick its own.
pub const DEFAULT_LOW_WATER: usize = 10;

/// Something that can fetch a batch of items in one call.
#[async_trait]
pub trait BatchSource: Send + Sync + 'static {
    /// The buffered item type.
    type Item: Send + 'static;

    /// Name used in errors and log lines.
    fn name(&self) -> &str;

    /// Fetch the next batch. Items are buffered in the order returned.
    async fn fetch_batch(&self) -> ProviderResult<Vec<Self::Item>>;
}

struct Shared<S: BatchSource> {
    source: S,
    queue: Mutex<VecDeque<S::Item>>,
    refilling: AtomicBool,
    low_water: usize,
}

/// Clears the `refilling` flag however the refill ends, including when the
/// refill future is dropped mid-flight.
struct RefillGuard<'a>(&'a AtomicBool);

impl Drop for RefillGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: BatchSource> Shared<S> {
    async fn refill(&self) -> ProviderResult<usize> {
        if self
            .refilling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProviderError::Busy {
                source_name: self.source.name().to_string(),
            });
        }
        let _guard = RefillGuard(&self.refilling);

        let items = self.source.fetch_batch().await?;
        let added = items.len();
        let mut queue = self.queue.lock().await;
        queue.extend(items);
        log::debug!(
            "{}: refilled {} items, {} buffered",
            self.source.name(),
            added,
            queue.len()
        );
        Ok(added)
    }
}

/// FIFO buffer of prefetched items with self-refill.
pub struct ReadAheadBuffer<S: BatchSource> {
    shared: Arc<Shared<S>>,
}

impl<S: BatchSource> fmt::Debug for ReadAheadBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadAheadBuffer")
            .field("source", &self.shared.source.name())
            .field("low_water", &self.shared.low_water)
            .field("refilling", &self.shared.refilling.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<S: BatchSource> ReadAheadBuffer<S> {
    /// Create an empty buffer over `source`. The first [`take_one`]
    /// performs the initial fetch.
    ///
    /// [`take_one`]: Self::take_one
    pub fn new(source: S, low_water: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                queue: Mutex::new(VecDeque::new()),
                refilling: AtomicBool::new(false),
                low_water,
            }),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.shared.source
    }

    /// Buffer size at or below which a background refill is triggered.
    pub fn low_water(&self) -> usize {
        self.shared.low_water
    }

    /// Number of buffered items.
    pub async fn len(&self) -> usize {
        self.shared.queue.lock().await.len()
    }

    /// Whether the buffer holds no items.
    pub async fn is_empty(&self) -> bool {
        self.shared.queue.lock().await.is_empty()
    }

    /// Whether a refill is in flight.
    pub fn is_refilling(&self) -> bool {
        self.shared.refilling.load(Ordering::Acquire)
    }

    /// Fetch one batch and append it to the back of the buffer.
    ///
    /// Returns the number of items added.
    ///
    /// # Errors
    /// [`ProviderError::Busy`] if a refill is already running; otherwise
    /// whatever the source returned. A failed refill leaves the buffer
    /// untouched.
    pub async fn refill(&self) -> ProviderResult<usize> {
        self.shared.refill().await
    }

    /// Take the item at the front of the buffer.
    ///
    /// An empty buffer is refilled synchronously first. If the buffer drops
    /// to the low-water mark afterwards, a refill is spawned in the
    /// background and its outcome is only logged.
    ///
    /// # Errors
    /// [`ProviderError::Busy`] if the buffer was empty while another refill
    /// was running, [`ProviderError::Unavailable`] if it is still empty
    /// after refilling. Returned errors are not logged here; callers log
    /// them once, usually through [`RecoverExt::recover`].
    ///
    /// [`RecoverExt::recover`]: crate::error::RecoverExt::recover
    pub async fn take_one(&self) -> ProviderResult<S::Item> {
        if self.is_empty().await {
            match self.shared.refill().await {
                Ok(_) => {}
                Err(e) if e.is_busy() => return Err(e),
                Err(e) => log_failure(&format!("{}: refill", self.shared.source.name()), &e),
            }
        }

        let (item, remaining) = {
            let mut queue = self.shared.queue.lock().await;
            let item = queue.pop_front();
            (item, queue.len())
        };

        let Some(item) = item else {
            return Err(ProviderError::Unavailable {
                source_name: self.shared.source.name().to_string(),
            });
        };

        if remaining <= self.shared.low_water {
            self.spawn_refill();
        }

        Ok(item)
    }

    fn spawn_refill(&self) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let context = format!("{}: background refill", shared.source.name());
            if let Err(e) = shared.refill().await {
                log_failure(&context, &e);
            }
        });
    }
}
