use lodestar_providers::{Config, Providers};

pub fn show_sources(providers: &Providers, config: &Config) {
    let sources = providers.enabled_sources();

    println!("\n📡 Lodestar Sources\n");
    println!("  Enabled: {}", sources.join(", "));

    if providers.youtube.is_none() {
        println!("\n  youtube is disabled: set LODESTAR_YOUTUBE_API_KEY to enable it");
    }
    if config.nasa_api_key == lodestar_providers::config::NASA_DEMO_KEY {
        println!("  apod is using NASA's DEMO_KEY; set LODESTAR_NASA_API_KEY for higher limits");
    }
}
