//! Random duck pictures from random-d.uk.
//!
//! The `list` endpoint returns every file name the service hosts, so the
//! provider loads it once and picks locally from then on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lodestar_core::{
    ConfigError, IndexSource, ProviderResult, RateLimiter, RequestExecutor, StaticIndex,
};

use crate::settings::ProviderSettings;

const DUCK_API_BASE: &str = "https://random-d.uk/api/v2";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    gifs: Vec<String>,
}

/// A duck picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckImage {
    pub url: String,
    pub animated: bool,
}

#[derive(Debug)]
pub struct DuckList {
    executor: RequestExecutor,
    limiter: RateLimiter,
}

impl DuckList {
    fn image(&self, file: String, animated: bool) -> DuckImage {
        DuckImage {
            url: format!("{}/{}", self.executor.base_url(), file),
            animated,
        }
    }
}

#[async_trait]
impl IndexSource for DuckList {
    type Item = DuckImage;

    fn name(&self) -> &str {
        DuckProvider::NAME
    }

    async fn fetch_index(&self) -> ProviderResult<Vec<DuckImage>> {
        self.limiter.acquire("list").await;
        let list: ListResponse = self.executor.request_json("list", &[200], &[]).await?;
        let mut images: Vec<DuckImage> = list
            .images
            .into_iter()
            .map(|file| self.image(file, false))
            .collect();
        images.extend(list.gifs.into_iter().map(|file| self.image(file, true)));
        Ok(images)
    }
}

/// Duck picture provider.
#[derive(Debug)]
pub struct DuckProvider {
    index: StaticIndex<DuckList>,
}

impl DuckProvider {
    /// Registry name.
    pub const NAME: &'static str = "ducks";

    pub fn new(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(DUCK_API_BASE, settings)
    }

    pub fn with_base_url(base_url: &str, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let list = DuckList {
            executor: RequestExecutor::builder(Self::NAME, base_url)
                .timeout(settings.timeout)
                .build()?,
            limiter: RateLimiter::shared(10, 60)?,
        };
        Ok(Self {
            index: StaticIndex::new(list),
        })
    }

    /// A random duck picture.
    pub async fn random(&self) -> ProviderResult<DuckImage> {
        self.index.pick_random().await
    }

    /// Whether the file list has been loaded.
    pub async fn is_loaded(&self) -> bool {
        self.index.is_initialized().await
    }
}
