//! Settings shared by every provider constructor.

use std::time::Duration;

use lodestar_core::read_ahead::DEFAULT_LOW_WATER;
use lodestar_core::ConfigError;

use crate::config::Config;

/// Validated knobs that every provider is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Request deadline.
    pub timeout: Duration,
    /// Read-ahead low-water mark.
    pub low_water: usize,
    /// Items requested per refill.
    pub batch_size: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: lodestar_core::http::DEFAULT_TIMEOUT,
            low_water: DEFAULT_LOW_WATER,
            batch_size: 25,
        }
    }
}

impl ProviderSettings {
    /// Validate the relevant parts of `config`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a zero timeout, a zero
    /// batch size, or a low-water mark that is not below the batch size.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        if config.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "http_timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if config.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if config.low_water_mark >= config.batch_size {
            return Err(ConfigError::InvalidValue {
                key: "low_water_mark".to_string(),
                message: format!("must be below batch_size ({})", config.batch_size),
            });
        }
        Ok(Self {
            timeout: config.http_timeout(),
            low_water: config.low_water_mark,
            batch_size: config.batch_size,
        })
    }

    /// Low-water mark for a provider whose upstream serves at most `batch`
    /// items per call.
    ///
    /// A mark at or above the batch would start a background refill right
    /// after every synchronous one, so such providers use half the batch.
    pub fn low_water_for(&self, batch: usize) -> usize {
        if self.low_water < batch {
            self.low_water
        } else {
            batch / 2
        }
    }
}
