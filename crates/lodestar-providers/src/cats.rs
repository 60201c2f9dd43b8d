//! Random cat images from TheCatAPI.
//!
//! Without an API key TheCatAPI caps `limit` at 10, so keyless batches are
//! smaller and the buffer refills more often.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lodestar_core::{
    BatchSource, ConfigError, ProviderResult, RateLimiter, ReadAheadBuffer, RequestExecutor,
};

use crate::settings::ProviderSettings;

const CAT_API_BASE: &str = "https://api.thecatapi.com/v1";

const KEYLESS_LIMIT: usize = 10;
const KEYED_LIMIT: usize = 100;

/// An image returned by `images/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatImage {
    /// TheCatAPI image ID.
    pub id: String,
    /// Direct image URL.
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug)]
pub struct CatFeed {
    executor: RequestExecutor,
    limiter: RateLimiter,
    limit: String,
}

#[async_trait]
impl BatchSource for CatFeed {
    type Item = CatImage;

    fn name(&self) -> &str {
        CatProvider::NAME
    }

    async fn fetch_batch(&self) -> ProviderResult<Vec<CatImage>> {
        self.limiter.acquire("images_search").await;
        self.executor
            .request_json("images/search", &[200], &[("limit", self.limit.as_str())])
            .await
    }
}

/// Cat image provider.
#[derive(Debug)]
pub struct CatProvider {
    buffer: ReadAheadBuffer<CatFeed>,
}

impl CatProvider {
    /// Registry name.
    pub const NAME: &'static str = "cats";

    pub fn new(api_key: Option<String>, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(CAT_API_BASE, api_key, settings)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: Option<String>,
        settings: &ProviderSettings,
    ) -> Result<Self, ConfigError> {
        let mut builder = RequestExecutor::builder(Self::NAME, base_url).timeout(settings.timeout);
        let cap = match api_key {
            Some(key) => {
                builder = builder.header("x-api-key", key);
                KEYED_LIMIT
            }
            None => KEYLESS_LIMIT,
        };
        let batch = settings.batch_size.min(cap);
        let feed = CatFeed {
            executor: builder.build()?,
            limiter: RateLimiter::shared(10, 60)?,
            limit: batch.to_string(),
        };
        Ok(Self {
            buffer: ReadAheadBuffer::new(feed, settings.low_water_for(batch)),
        })
    }

    /// A random cat image.
    pub async fn random(&self) -> ProviderResult<CatImage> {
        self.buffer.take_one().await
    }

    /// Images waiting in the buffer.
    pub async fn buffered(&self) -> usize {
        self.buffer.len().await
    }
}
