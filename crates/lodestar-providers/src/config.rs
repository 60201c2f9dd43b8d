use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// NASA's shared demo key; heavily rate limited but works without signup.
pub const NASA_DEMO_KEY: &str = "DEMO_KEY";

/// Configuration for lodestar.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (LODESTAR_* prefix)
/// 3. Config file (~/.config/lodestar/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// NASA Open APIs key used for the Astronomy Picture of the Day.
    ///
    /// Can be set via:
    /// - ENV: LODESTAR_NASA_API_KEY
    /// - Config: nasa_api_key = "..."
    /// - Default: DEMO_KEY
    #[serde(default = "default_nasa_api_key")]
    pub nasa_api_key: String,

    /// TheCatAPI key. Optional; without it smaller batches are served.
    ///
    /// Can be set via:
    /// - ENV: LODESTAR_CAT_API_KEY
    /// - Config: cat_api_key = "..."
    #[serde(default)]
    pub cat_api_key: Option<String>,

    /// YouTube Data API v3 key. Video search is disabled without it.
    ///
    /// Can be set via:
    /// - ENV: LODESTAR_YOUTUBE_API_KEY
    /// - Config: youtube_api_key = "..."
    #[serde(default)]
    pub youtube_api_key: Option<String>,

    /// Deadline for every outbound request, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Buffer size at or below which read-ahead providers refill in the
    /// background.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Items requested per refill by read-ahead providers.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Logger settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colour the log output.
    #[serde(default = "default_true")]
    pub coloured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            coloured: true,
        }
    }
}

impl LoggingConfig {
    /// The configured level, or `info` if the value is not recognised.
    pub fn level(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Whether output should be coloured.
    pub fn coloured(&self) -> bool {
        self.coloured
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nasa_api_key: default_nasa_api_key(),
            cat_api_key: None,
            youtube_api_key: None,
            http_timeout_secs: default_http_timeout_secs(),
            low_water_mark: default_low_water_mark(),
            batch_size: default_batch_size(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/lodestar/config.toml
    /// Reads environment variables with LODESTAR_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file plus the environment.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("lodestar");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Request deadline as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn default_nasa_api_key() -> String {
    NASA_DEMO_KEY.to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_low_water_mark() -> usize {
    lodestar_core::read_ahead::DEFAULT_LOW_WATER
}

fn default_batch_size() -> usize {
    25
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/lodestar/config.toml
/// - macOS: ~/Library/Application Support/lodestar/config.toml
/// - Windows: %APPDATA%\lodestar\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lodestar")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Lodestar Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (LODESTAR_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# NASA Open APIs key (Astronomy Picture of the Day)
# Get one at: https://api.nasa.gov/
# Environment: LODESTAR_NASA_API_KEY
nasa_api_key = "DEMO_KEY"

# TheCatAPI key (optional)
# Environment: LODESTAR_CAT_API_KEY
#cat_api_key = "your-cat-api-key"

# YouTube Data API v3 key (video search is disabled without it)
# Environment: LODESTAR_YOUTUBE_API_KEY
#youtube_api_key = "your-youtube-api-key"

# Deadline for outbound requests, in seconds
http_timeout_secs = 30

# Read-ahead providers refill in the background once their buffer
# holds this many items or fewer
low_water_mark = 10

# Items fetched per refill
batch_size = 25

[logging]
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    ensure_config_file_at(&config_file_path())
}

/// Create the example config at `config_path` if nothing is there yet.
pub fn ensure_config_file_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.nasa_api_key, NASA_DEMO_KEY);
        assert!(config.youtube_api_key.is_none());
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.low_water_mark, 10);
        assert_eq!(config.logging.level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "loud".to_string(),
            coloured: false,
        };
        assert_eq!(logging.level(), log::LevelFilter::Info);
        assert!(!logging.coloured());
    }

    #[test]
    fn test_config_load_without_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "youtube_api_key = \"yt-key\"\nbatch_size = 5\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.youtube_api_key.as_deref(), Some("yt-key"));
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.logging.level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_example_config_parses() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert!(ensure_config_file_at(&path).unwrap());
        assert!(!ensure_config_file_at(&path).unwrap());

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.low_water_mark, 10);
        assert_eq!(config.batch_size, 25);
    }
}
