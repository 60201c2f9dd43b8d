use anyhow::Result;
use std::path::Path;

use lodestar_providers::{config, Config};

fn show_secret(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "<set>",
        _ => "<not set>",
    }
}

/// Show the current effective configuration.
pub fn show_config(config: &Config, config_path: &Path) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!(
        "File exists: {}\n",
        if exists { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!(
        "  nasa_api_key: {}",
        if config.nasa_api_key == config::NASA_DEMO_KEY {
            config::NASA_DEMO_KEY
        } else {
            "<set>"
        }
    );
    println!(
        "  cat_api_key: {}",
        show_secret(config.cat_api_key.as_deref())
    );
    println!(
        "  youtube_api_key: {}",
        show_secret(config.youtube_api_key.as_deref())
    );
    println!("  http_timeout_secs: {}", config.http_timeout_secs);
    println!("  low_water_mark: {}", config.low_water_mark);
    println!("  batch_size: {}", config.batch_size);
    println!("  logging.level: {:?}", config.logging.level());
    println!("  logging.coloured: {}", config.logging.coloured());

    println!("\nPriority: CLI args > ENV vars (LODESTAR_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path(config_path: &Path) -> Result<()> {
    println!("{}", config_path.display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config(config_path: &Path) -> Result<()> {
    let created = config::ensure_config_file_at(config_path)?;

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure lodestar.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
