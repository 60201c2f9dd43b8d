//! Single-shot HTTP GET executor shared by every provider.
//!
//! The executor builds a URL from its base, an endpoint path and query
//! pairs, issues exactly one GET, and checks the status against the set
//! the caller expects. It never retries and never caches; throttling is the
//! job of [`RateLimiter`](crate::resilience::RateLimiter).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, ProviderError, ProviderResult};

/// Default request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("lodestar/", env!("CARGO_PKG_VERSION"));

/// Builder for [`RequestExecutor`].
#[derive(Debug)]
pub struct RequestExecutorBuilder {
    source_name: String,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl RequestExecutorBuilder {
    /// Override the request deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Send an extra header with every request (e.g. an API key header).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Build the executor.
    ///
    /// # Errors
    /// Returns an error if the timeout is zero, a header is malformed, or
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<RequestExecutor, ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidValue {
                    key: name.clone(),
                    message: e.to_string(),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
                    key: name.clone(),
                    message: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(RequestExecutor {
            http,
            source_name: self.source_name,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Issues GET requests against one provider's base URL.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http: Client,
    source_name: String,
    base_url: String,
}

impl RequestExecutor {
    /// Start building an executor for `source_name` rooted at `base_url`.
    pub fn builder(
        source_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> RequestExecutorBuilder {
        RequestExecutorBuilder {
            source_name: source_name.into(),
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
        }
    }

    /// Name used in errors and log lines.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL, `endpoint` and URL-encoded `query` pairs.
    pub fn build_url(&self, endpoint: &str, query: &[(&str, &str)]) -> ProviderResult<Url> {
        let raw = if endpoint.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        };
        let url = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, query)
        };
        url.map_err(|e| self.invalid_url(format!("{raw}: {e}")))
    }

    /// Like [`build_url`](Self::build_url), but appends each of `segments`
    /// as a single escaped path segment. Use this for user-supplied path
    /// parts: `/`, `?` and `#` inside a segment are percent-encoded and
    /// cannot reach another endpoint.
    pub fn build_url_with_segments(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> ProviderResult<Url> {
        let mut url = self.build_url("", query)?;
        url.path_segments_mut()
            .map_err(|()| self.invalid_url(format!("{}: cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn invalid_url(&self, message: String) -> ProviderError {
        ProviderError::InvalidUrl {
            source_name: self.source_name.clone(),
            message,
        }
    }

    /// Issue one GET and decode the body as JSON.
    ///
    /// # Errors
    /// [`ProviderError::UnexpectedResponseCode`] when the status is not in
    /// `expected_status`, [`ProviderError::Timeout`] or
    /// [`ProviderError::Connection`] on transport failure, and
    /// [`ProviderError::Decode`] when a success body is not JSON.
    pub async fn request(
        &self,
        endpoint: &str,
        expected_status: &[u16],
        query: &[(&str, &str)],
    ) -> ProviderResult<serde_json::Value> {
        self.request_json(endpoint, expected_status, query).await
    }

    /// Like [`request`](Self::request) but decodes into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        expected_status: &[u16],
        query: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let url = self.build_url(endpoint, query)?;
        self.get_json(url, expected_status).await
    }

    /// Like [`request_json`](Self::request_json) for a path built from
    /// escaped `segments`.
    pub async fn request_json_at<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        expected_status: &[u16],
        query: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let url = self.build_url_with_segments(segments, query)?;
        self.get_json(url, expected_status).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        expected_status: &[u16],
    ) -> ProviderResult<T> {
        let url_text = url.to_string();
        log::debug!("{}: GET {}", self.source_name, url_text);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&url_text, e))?;

        let status = response.status().as_u16();
        if !expected_status.contains(&status) {
            // The status is the error; a body that fails to arrive only
            // costs the diagnostic text.
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UnexpectedResponseCode {
                url: url_text,
                status,
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(&url_text, e))?;

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            url: url_text,
            message: e.to_string(),
        })
    }
}
