//! Video search through the YouTube Data API v3.
//!
//! A search costs 100 of the default 10,000 daily quota units, which caps
//! the provider at 100 searches a day.

use serde::{Deserialize, Serialize};

use lodestar_core::{ConfigError, ProviderResult, RateLimiter, RequestExecutor};

use crate::settings::ProviderSettings;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

const MAX_RESULTS: &str = "5";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
}

/// A video search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel: String,
}

impl Video {
    /// Watch page link.
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// YouTube search provider.
#[derive(Debug)]
pub struct YouTubeProvider {
    executor: RequestExecutor,
    limiter: RateLimiter,
    api_key: String,
}

impl YouTubeProvider {
    /// Registry name.
    pub const NAME: &'static str = "youtube";

    /// # Errors
    /// Returns [`ConfigError::MissingApiKey`] for an empty key.
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(YOUTUBE_API_BASE, api_key, settings)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        settings: &ProviderSettings,
    ) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                source_name: Self::NAME.to_string(),
            });
        }
        Ok(Self {
            executor: RequestExecutor::builder(Self::NAME, base_url)
                .timeout(settings.timeout)
                .build()?,
            limiter: RateLimiter::per_operation(100, 86_400)?,
            api_key,
        })
    }

    /// Search for videos matching `query`, best match first.
    pub async fn search(&self, query: &str) -> ProviderResult<Vec<Video>> {
        self.limiter.acquire("search").await;
        let response: SearchResponse = self
            .executor
            .request_json(
                "search",
                &[200],
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("maxResults", MAX_RESULTS),
                    ("q", query),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| {
                Some(Video {
                    id: item.id.video_id?,
                    title: item.snippet.title,
                    channel: item.snippet.channel_title,
                })
            })
            .collect())
    }
}
