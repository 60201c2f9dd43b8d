//! Upcoming rocket launches from Launch Library 2.
//!
//! The free tier allows 15 requests per hour across all endpoints, so every
//! operation draws from one shared budget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lodestar_core::{ConfigError, ProviderResult, RateLimiter, RequestExecutor};

use crate::settings::ProviderSettings;

const LAUNCH_API_BASE: &str = "https://ll.thespacedevs.com/2.2.0";

/// Largest page Launch Library serves.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct LaunchPage {
    #[serde(default)]
    results: Vec<Launch>,
}

/// Launch status as reported by Launch Library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchStatus {
    pub name: String,
    #[serde(default)]
    pub abbrev: Option<String>,
}

/// One scheduled launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launch {
    pub id: String,
    pub name: String,
    /// "No earlier than" time.
    pub net: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<LaunchStatus>,
    #[serde(default)]
    pub pad: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Launch {
    /// Time until the launch, or `None` if it is in the past.
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let remaining = self.net - now;
        (remaining >= chrono::Duration::zero()).then_some(remaining)
    }
}

/// Launch schedule provider.
#[derive(Debug)]
pub struct LaunchProvider {
    executor: RequestExecutor,
    limiter: RateLimiter,
}

impl LaunchProvider {
    /// Registry name.
    pub const NAME: &'static str = "launches";

    pub fn new(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(LAUNCH_API_BASE, settings)
    }

    pub fn with_base_url(base_url: &str, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            executor: RequestExecutor::builder(Self::NAME, base_url)
                .timeout(settings.timeout)
                .build()?,
            limiter: RateLimiter::shared(15, 3600)?,
        })
    }

    /// The next `limit` launches, soonest first, at most [`MAX_LIMIT`].
    ///
    /// A limit of zero returns nothing without spending budget.
    pub async fn upcoming(&self, limit: usize) -> ProviderResult<Vec<Launch>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.limiter.acquire("upcoming").await;
        let limit = limit.min(MAX_LIMIT).to_string();
        let page: LaunchPage = self
            .executor
            .request_json(
                "launch/upcoming/",
                &[200],
                &[("limit", limit.as_str()), ("mode", "list")],
            )
            .await?;
        Ok(page.results)
    }

    /// The next launch, if any is scheduled.
    pub async fn next(&self) -> ProviderResult<Option<Launch>> {
        Ok(self.upcoming(1).await?.into_iter().next())
    }
}
