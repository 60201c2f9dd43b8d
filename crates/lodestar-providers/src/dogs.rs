//! Random dog images from dog.ceo.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lodestar_core::{
    BatchSource, ConfigError, ProviderResult, RateLimiter, ReadAheadBuffer, RequestExecutor,
};

use crate::settings::ProviderSettings;

const DOG_API_BASE: &str = "https://dog.ceo/api";

/// dog.ceo serves at most 50 random images per call.
const MAX_BATCH: usize = 50;

#[derive(Debug, Deserialize)]
struct RandomImagesResponse {
    message: Vec<String>,
}

/// A dog image and the breed encoded in its URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogImage {
    pub url: String,
    pub breed: Option<String>,
}

impl DogImage {
    /// Build from an image URL of the form `.../breeds/<breed>/<file>`.
    /// Sub-breeds (`hound-afghan`) are rendered as `afghan hound`.
    pub fn from_url(url: String) -> Self {
        let breed = url
            .split("/breeds/")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.split('-').rev().collect::<Vec<_>>().join(" "));
        Self { url, breed }
    }
}

#[derive(Debug)]
pub struct DogFeed {
    executor: RequestExecutor,
    limiter: RateLimiter,
    endpoint: String,
}

#[async_trait]
impl BatchSource for DogFeed {
    type Item = DogImage;

    fn name(&self) -> &str {
        DogProvider::NAME
    }

    async fn fetch_batch(&self) -> ProviderResult<Vec<DogImage>> {
        self.limiter.acquire("random_images").await;
        let response: RandomImagesResponse = self
            .executor
            .request_json(&self.endpoint, &[200], &[])
            .await?;
        Ok(response
            .message
            .into_iter()
            .map(DogImage::from_url)
            .collect())
    }
}

/// Dog image provider.
#[derive(Debug)]
pub struct DogProvider {
    buffer: ReadAheadBuffer<DogFeed>,
}

impl DogProvider {
    /// Registry name.
    pub const NAME: &'static str = "dogs";

    pub fn new(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(DOG_API_BASE, settings)
    }

    pub fn with_base_url(base_url: &str, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let batch = settings.batch_size.min(MAX_BATCH);
        let feed = DogFeed {
            executor: RequestExecutor::builder(Self::NAME, base_url)
                .timeout(settings.timeout)
                .build()?,
            limiter: RateLimiter::shared(10, 60)?,
            endpoint: format!("breeds/image/random/{batch}"),
        };
        Ok(Self {
            buffer: ReadAheadBuffer::new(feed, settings.low_water_for(batch)),
        })
    }

    /// A random dog image.
    pub async fn random(&self) -> ProviderResult<DogImage> {
        self.buffer.take_one().await
    }

    /// Images waiting in the buffer.
    pub async fn buffered(&self) -> usize {
        self.buffer.len().await
    }
}
