//! Pokémon lookups from PokéAPI.
//!
//! The species list is loaded once into a static index so `random` can pick
//! a name locally; details are always fetched per call. Every call shares
//! one budget.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lodestar_core::{
    ConfigError, IndexSource, ProviderError, ProviderResult, RateLimiter, RequestExecutor,
    StaticIndex,
};

use crate::settings::ProviderSettings;

const POKE_API_BASE: &str = "https://pokeapi.co/api/v2";

/// Large enough to list every species in one page.
const INDEX_PAGE_SIZE: &str = "100000";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpeciesPage {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    slot: u8,
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Default, Deserialize)]
struct Sprites {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    height: u32,
    weight: u32,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    sprites: Sprites,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Summary of one Pokémon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Height in decimetres.
    pub height: u32,
    /// Weight in hectograms.
    pub weight: u32,
    /// Type names in slot order.
    pub types: Vec<String>,
    pub sprite: Option<String>,
}

impl From<PokemonResponse> for Pokemon {
    fn from(mut response: PokemonResponse) -> Self {
        response.types.sort_by_key(|t| t.slot);
        Self {
            id: response.id,
            name: response.name,
            height: response.height,
            weight: response.weight,
            types: response.types.into_iter().map(|t| t.kind.name).collect(),
            sprite: response.sprites.front_default,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SpeciesIndex {
    executor: RequestExecutor,
    limiter: RateLimiter,
}

#[async_trait]
impl IndexSource for SpeciesIndex {
    type Item = String;

    fn name(&self) -> &str {
        PokemonProvider::NAME
    }

    async fn fetch_index(&self) -> ProviderResult<Vec<String>> {
        self.limiter.acquire("species").await;
        let page: SpeciesPage = self
            .executor
            .request_json(
                "pokemon",
                &[200],
                &[("limit", INDEX_PAGE_SIZE), ("offset", "0")],
            )
            .await?;
        Ok(page.results.into_iter().map(|r| r.name).collect())
    }
}

/// Pokémon provider.
#[derive(Debug)]
pub struct PokemonProvider {
    index: StaticIndex<SpeciesIndex>,
}

impl PokemonProvider {
    /// Registry name.
    pub const NAME: &'static str = "pokemon";

    pub fn new(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        Self::with_base_url(POKE_API_BASE, settings)
    }

    pub fn with_base_url(base_url: &str, settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let source = SpeciesIndex {
            executor: RequestExecutor::builder(Self::NAME, base_url)
                .timeout(settings.timeout)
                .build()?,
            limiter: RateLimiter::shared(100, 60)?,
        };
        Ok(Self {
            index: StaticIndex::new(source),
        })
    }

    /// Look up a Pokémon by name or national dex number.
    ///
    /// Returns `Ok(None)` when PokéAPI does not know the name, so callers
    /// can tell "no such Pokémon" apart from "PokéAPI is unavailable". The
    /// name is sent as one escaped path segment, so `/` or `?` in it never
    /// reach another endpoint.
    pub async fn lookup(&self, name: &str) -> ProviderResult<Option<Pokemon>> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Ok(None);
        }

        let source = self.index.source();
        source.limiter.acquire("lookup").await;
        match source
            .executor
            .request_json_at::<PokemonResponse>(&["pokemon", &name], &[200], &[])
            .await
        {
            Ok(response) => Ok(Some(response.into())),
            Err(ProviderError::UnexpectedResponseCode { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A random Pokémon.
    ///
    /// # Errors
    /// Besides request errors, returns [`ProviderError::Unavailable`] if the
    /// picked name no longer resolves.
    pub async fn random(&self) -> ProviderResult<Pokemon> {
        let name = self.index.pick_random().await?;
        self.lookup(&name)
            .await?
            .ok_or_else(|| ProviderError::Unavailable {
                source_name: Self::NAME.to_string(),
            })
    }

    /// Number of known species, loading the list if needed.
    pub async fn species_count(&self) -> ProviderResult<usize> {
        Ok(self.index.get().await?.len())
    }
}
