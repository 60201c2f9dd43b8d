//! NASA Astronomy Picture of the Day.
//!
//! Random entries are served from a read-ahead buffer filled with the
//! `count=N` form of the APOD endpoint, which returns N random entries in
//! one call. Today's entry is fetched directly. Each operation has its own
//! hourly budget.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use lodestar_core::resilience::RateLimit;
use lodestar_core::{
    BatchSource, ConfigError, ProviderResult, RateLimiter, ReadAheadBuffer, RequestExecutor,
};

use crate::settings::ProviderSettings;

const APOD_API_BASE: &str = "https://api.nasa.gov/planetary/apod";

/// The APOD endpoint rejects `count` above 100.
const MAX_COUNT: usize = 100;

const OP_RANDOM_BATCH: &str = "random_batch";
const OP_TODAY: &str = "today";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One Astronomy Picture of the Day entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApodEntry {
    /// Publication date.
    pub date: NaiveDate,
    /// Entry title.
    pub title: String,
    /// Curator's explanation.
    #[serde(default)]
    pub explanation: String,
    /// Image or video URL.
    #[serde(default)]
    pub url: Option<String>,
    /// High-resolution image URL, for images only.
    #[serde(default)]
    pub hdurl: Option<String>,
    /// `image` or `video`.
    #[serde(default = "default_media_type")]
    pub media_type: String,
    /// Credit line, absent for public-domain entries.
    #[serde(default)]
    pub copyright: Option<String>,
}

fn default_media_type() -> String {
    "image".to_string()
}

impl ApodEntry {
    /// Whether the entry is a still image.
    pub fn is_image(&self) -> bool {
        self.media_type == "image"
    }

    /// Best available link: the HD image if there is one.
    pub fn best_url(&self) -> Option<&str> {
        self.hdurl.as_deref().or(self.url.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Batch source backing the random-entry buffer.
#[derive(Debug)]
pub struct ApodFeed {
    executor: RequestExecutor,
    limiter: RateLimiter,
    api_key: String,
    count: String,
}

#[async_trait]
impl BatchSource for ApodFeed {
    type Item = ApodEntry;

    fn name(&self) -> &str {
        ApodProvider::NAME
    }

    async fn fetch_batch(&self) -> ProviderResult<Vec<ApodEntry>> {
        self.limiter.acquire(OP_RANDOM_BATCH).await;
        self.executor
            .request_json(
                "",
                &[200],
                &[
                    ("api_key", self.api_key.as_str()),
                    ("count", self.count.as_str()),
                ],
            )
            .await
    }
}

/// Astronomy Picture of the Day provider.
#[derive(Debug)]
pub struct ApodProvider {
    buffer: ReadAheadBuffer<ApodFeed>,
}

impl ApodProvider {
    /// Registry name.
    pub const NAME: &'static str = "apod";

    /// Create a provider against the public NASA endpoint.
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(APOD_API_BASE, api_key, settings)
    }

    /// Create a provider against another base URL.
    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        settings: &ProviderSettings,
    ) -> Result<Self, ConfigError> {
        let executor = RequestExecutor::builder(Self::NAME, base_url)
            .timeout(settings.timeout)
            .build()?;
        // The demo key allows about 30 requests an hour; most go to batches.
        let limiter = RateLimiter::per_operation(20, 3600)?
            .with_operation_limit(OP_TODAY, RateLimit::new(10, 3600)?)?;
        let batch = settings.batch_size.min(MAX_COUNT);
        let feed = ApodFeed {
            executor,
            limiter,
            api_key,
            count: batch.to_string(),
        };
        Ok(Self {
            buffer: ReadAheadBuffer::new(feed, settings.low_water_for(batch)),
        })
    }

    /// A random entry from the read-ahead buffer.
    pub async fn random(&self) -> ProviderResult<ApodEntry> {
        self.buffer.take_one().await
    }

    /// Today's entry.
    pub async fn today(&self) -> ProviderResult<ApodEntry> {
        let feed = self.buffer.source();
        feed.limiter.acquire(OP_TODAY).await;
        feed.executor
            .request_json("", &[200], &[("api_key", feed.api_key.as_str())])
            .await
    }

    /// Entries waiting in the buffer.
    pub async fn buffered(&self) -> usize {
        self.buffer.len().await
    }
}
