//! Composition root for every provider.
//!
//! Providers hold rate-limit counters and buffers that must exist once per
//! process. The binary calls [`Providers::from_config`] once at startup and
//! consumers borrow from the result instead of reaching for globals. There
//! is no process-wide guard: every call builds an independent set with its
//! own counters.

use std::collections::BTreeSet;

use lodestar_core::ConfigError;

use crate::apod::ApodProvider;
use crate::cats::CatProvider;
use crate::config::Config;
use crate::dogs::DogProvider;
use crate::ducks::DuckProvider;
use crate::launches::LaunchProvider;
use crate::pokemon::PokemonProvider;
use crate::settings::ProviderSettings;
use crate::youtube::YouTubeProvider;

/// Names of the providers built into one [`Providers`]. Registering a name
/// twice within the same composition is an error.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    names: BTreeSet<&'static str>,
}

impl ProviderRegistry {
    /// Record that the provider `name` has been built.
    ///
    /// # Errors
    /// Returns [`ConfigError::DuplicateProvider`] if `name` is already
    /// registered.
    pub fn register(&mut self, name: &'static str) -> Result<(), ConfigError> {
        if !self.names.insert(name) {
            return Err(ConfigError::DuplicateProvider {
                name: name.to_string(),
            });
        }
        log::debug!("registered provider {}", name);
        Ok(())
    }

    /// Whether `name` has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        self.names.iter().copied().collect()
    }
}

/// Every provider the application uses, built once.
#[derive(Debug)]
pub struct Providers {
    pub apod: ApodProvider,
    pub cats: CatProvider,
    pub dogs: DogProvider,
    pub ducks: DuckProvider,
    pub pokemon: PokemonProvider,
    pub launches: LaunchProvider,
    /// Absent when no YouTube API key is configured.
    pub youtube: Option<YouTubeProvider>,
    registry: ProviderRegistry,
}

impl Providers {
    /// Build every provider from `config`.
    ///
    /// Providers that need a missing optional key are left disabled.
    ///
    /// # Errors
    /// Returns an error for invalid settings or if an HTTP client cannot be
    /// built.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let settings = ProviderSettings::from_config(config)?;
        let mut registry = ProviderRegistry::default();

        registry.register(ApodProvider::NAME)?;
        let apod = ApodProvider::new(config.nasa_api_key.clone(), &settings)?;

        registry.register(CatProvider::NAME)?;
        let cats = CatProvider::new(config.cat_api_key.clone(), &settings)?;

        registry.register(DogProvider::NAME)?;
        let dogs = DogProvider::new(&settings)?;

        registry.register(DuckProvider::NAME)?;
        let ducks = DuckProvider::new(&settings)?;

        registry.register(PokemonProvider::NAME)?;
        let pokemon = PokemonProvider::new(&settings)?;

        registry.register(LaunchProvider::NAME)?;
        let launches = LaunchProvider::new(&settings)?;

        let youtube = match config.youtube_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                registry.register(YouTubeProvider::NAME)?;
                Some(YouTubeProvider::new(key.to_string(), &settings)?)
            }
            _ => {
                log::info!("YouTube search disabled: no API key configured");
                None
            }
        };

        Ok(Self {
            apod,
            cats,
            dogs,
            ducks,
            pokemon,
            launches,
            youtube,
            registry,
        })
    }

    /// Names of the providers that were built.
    pub fn enabled_sources(&self) -> Vec<&'static str> {
        self.registry.names()
    }
}
