//! Rate-limited access to third-party content APIs.
//!
//! Every integration goes through the same three pieces: a
//! [`RequestExecutor`] that issues one GET and classifies the response, a
//! [`RateLimiter`] that gates calls with a fixed-window budget, and either a
//! [`ReadAheadBuffer`] or a [`StaticIndex`] for endpoints that serve random
//! items.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod http;
pub mod read_ahead;
pub mod resilience;
pub mod static_index;

pub use error::{ConfigError, ProviderError, ProviderResult, RecoverExt};
pub use http::RequestExecutor;
pub use read_ahead::{BatchSource, ReadAheadBuffer};
pub use resilience::{RateLimit, RateLimiter, Scope};
pub use static_index::{IndexSource, StaticIndex};
