//! Logger setup.

use anyhow::Result;
use lodestar_providers::config::LoggingConfig;
use twyg::{LogLevel, OptsBuilder};

fn twyg_level(level: log::LevelFilter) -> LogLevel {
    match level {
        log::LevelFilter::Trace => LogLevel::Trace,
        log::LevelFilter::Debug => LogLevel::Debug,
        log::LevelFilter::Info => LogLevel::Info,
        log::LevelFilter::Warn => LogLevel::Warn,
        log::LevelFilter::Off | log::LevelFilter::Error => LogLevel::Error,
    }
}

/// Install the global logger.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        LogLevel::Debug
    } else {
        twyg_level(config.level())
    };

    let opts = OptsBuilder::new()
        .coloured(config.coloured())
        .level(level)
        .report_caller(verbose)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid logger options: {e:?}"))?;

    match twyg::setup(opts) {
        Ok(_) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Could not set up logger: {e:?}")),
    }
}
