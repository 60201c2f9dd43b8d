//! Third-party content providers for lodestar.
//!
//! Each provider wraps one external API with the engine from
//! `lodestar-core`: a request executor, a rate limiter, and a read-ahead
//! buffer or static index where the endpoint serves random items.
//! [`Providers`] builds all of them once from [`Config`].

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod apod;
pub mod cats;
pub mod config;
pub mod dogs;
pub mod ducks;
pub mod launches;
pub mod pokemon;
pub mod registry;
pub mod settings;
pub mod youtube;

pub use apod::{ApodEntry, ApodProvider};
pub use cats::{CatImage, CatProvider};
pub use config::Config;
pub use dogs::{DogImage, DogProvider};
pub use ducks::{DuckImage, DuckProvider};
pub use launches::{Launch, LaunchProvider};
pub use pokemon::{Pokemon, PokemonProvider};
pub use registry::{ProviderRegistry, Providers};
pub use settings::ProviderSettings;
pub use youtube::{Video, YouTubeProvider};
