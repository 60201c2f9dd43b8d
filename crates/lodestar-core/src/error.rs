//! Error types for provider calls and provider setup.

use thiserror::Error;

/// Errors that a provider operation can surface at runtime.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote API answered with a status outside the expected set.
    #[error("unexpected response code {status} from {url}")]
    UnexpectedResponseCode {
        url: String,
        status: u16,
        body: String,
    },

    /// The request exceeded its deadline.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Transport-level failure (DNS, refused connection, reset).
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// A success-status body could not be decoded.
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The endpoint and query could not be turned into a URL.
    #[error("invalid URL for {source_name}: {message}")]
    InvalidUrl {
        source_name: String,
        message: String,
    },

    /// A refill or one-time load was already in flight.
    #[error("{source_name} is busy, try again shortly")]
    Busy { source_name: String },

    /// The buffer stayed empty even after a refill attempt.
    #[error("{source_name} is unavailable")]
    Unavailable { source_name: String },

    /// Any other error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl ProviderError {
    /// Classify a transport error from `reqwest` against the URL it was
    /// issued for.
    pub fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            Self::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Request(err)
        }
    }

    /// Returns `true` when the error is transient and the same call may
    /// succeed if issued again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::Busy { .. }
        )
    }

    /// Returns `true` for the "try again shortly" case.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// Returns `true` when the provider could not produce anything even
    /// after refilling.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// The HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedResponseCode { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors raised while constructing providers. These are fatal at setup
/// time and are never clamped into a working configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A rate limit with a zero budget or a zero-length window.
    #[error("invalid rate limit: {calls} calls per {seconds}s (both must be at least 1)")]
    InvalidRateLimit { calls: u32, seconds: u64 },

    /// A provider requires an API key that was not configured.
    #[error("missing API key for {source_name}")]
    MissingApiKey { source_name: String },

    /// A provider with this name was already registered.
    #[error("provider {name} is already registered")]
    DuplicateProvider { name: String },

    /// A configured value is out of range.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Convenience alias for provider call results.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Log-and-recover for callers that treat a failed provider call as
/// "no result".
pub trait RecoverExt<T> {
    /// Converts the result into an `Option`, logging the failure with a
    /// severity that matches the error kind.
    fn recover(self, context: &str) -> Option<T>;
}

impl<T> RecoverExt<T> for ProviderResult<T> {
    fn recover(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                log_failure(context, &e);
                None
            }
        }
    }
}

/// Log a provider failure at the severity its kind deserves.
pub fn log_failure(context: &str, err: &ProviderError) {
    match err {
        ProviderError::Busy { .. } => log::debug!("{}: {}", context, err),
        ProviderError::Unavailable { .. } => log::error!("{}: {}", context, err),
        ProviderError::UnexpectedResponseCode { url, status, body } => {
            log::warn!(
                "{}: unexpected status {} from {} (body: {})",
                context,
                status,
                url,
                body
            );
        }
        _ => log::warn!("{}: {}", context, err),
    }
}
