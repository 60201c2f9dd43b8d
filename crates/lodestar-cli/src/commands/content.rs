use lodestar_providers::{ApodEntry, Launch, Pokemon, Providers};

use super::call;

fn print_apod(entry: &ApodEntry) {
    println!("🔭 {} ({})", entry.title, entry.date);
    if let Some(url) = entry.best_url() {
        println!("   {}", url);
    }
    if let Some(credit) = &entry.copyright {
        println!("   © {}", credit.trim());
    }
    if !entry.explanation.is_empty() {
        println!("\n{}", entry.explanation);
    }
}

pub async fn run_apod(providers: &Providers, today: bool) {
    let entry = if today {
        call("apod today", || providers.apod.today()).await
    } else {
        call("apod random", || providers.apod.random()).await
    };
    if let Some(entry) = entry {
        print_apod(&entry);
    }
}

pub async fn run_cat(providers: &Providers) {
    if let Some(image) = call("cat", || providers.cats.random()).await {
        println!("🐱 {}", image.url);
    }
}

pub async fn run_dog(providers: &Providers) {
    if let Some(image) = call("dog", || providers.dogs.random()).await {
        match image.breed {
            Some(breed) => println!("🐶 {} ({})", image.url, breed),
            None => println!("🐶 {}", image.url),
        }
    }
}

pub async fn run_duck(providers: &Providers) {
    if let Some(image) = call("duck", || providers.ducks.random()).await {
        println!("🦆 {}", image.url);
    }
}

fn print_pokemon(pokemon: &Pokemon) {
    println!("#{:03} {}", pokemon.id, pokemon.name);
    println!("   Type: {}", pokemon.types.join(" / "));
    println!(
        "   Height: {:.1} m  Weight: {:.1} kg",
        f64::from(pokemon.height) / 10.0,
        f64::from(pokemon.weight) / 10.0
    );
    if let Some(sprite) = &pokemon.sprite {
        println!("   {}", sprite);
    }
}

pub async fn run_pokemon(providers: &Providers, name: Option<&str>) {
    match name {
        Some(name) => match call("pokemon lookup", || providers.pokemon.lookup(name)).await {
            Some(Some(pokemon)) => print_pokemon(&pokemon),
            Some(None) => println!("No Pokémon called \"{}\".", name),
            None => {}
        },
        None => {
            if let Some(pokemon) = call("pokemon random", || providers.pokemon.random()).await {
                print_pokemon(&pokemon);
            }
        }
    }
}

fn print_launch(launch: &Launch, now: chrono::DateTime<chrono::Utc>) {
    let status = launch
        .status
        .as_ref()
        .map(|s| s.abbrev.clone().unwrap_or_else(|| s.name.clone()))
        .unwrap_or_else(|| String::from("?"));
    let when = match launch.countdown(now) {
        Some(remaining) if remaining.num_hours() < 48 => {
            format!(
                "in {}h {:02}m",
                remaining.num_hours(),
                remaining.num_minutes() % 60
            )
        }
        Some(remaining) => format!("in {} days", remaining.num_days()),
        None => String::from("launched"),
    };
    println!(
        "🚀 [{}] {} ({}, {})",
        status,
        launch.name,
        launch.net.format("%Y-%m-%d %H:%M UTC"),
        when
    );
    if let Some(location) = &launch.location {
        println!("   {}", location);
    }
}

pub async fn run_launches(providers: &Providers, limit: usize) {
    let Some(launches) = call("launches", || providers.launches.upcoming(limit)).await else {
        return;
    };
    if launches.is_empty() {
        println!("No upcoming launches are scheduled.");
        return;
    }
    let now = chrono::Utc::now();
    for launch in &launches {
        print_launch(launch, now);
    }
}

pub async fn run_youtube(providers: &Providers, query: &str) {
    let Some(youtube) = &providers.youtube else {
        println!("YouTube search is not configured.");
        println!("Set youtube_api_key in the config file or LODESTAR_YOUTUBE_API_KEY.");
        return;
    };
    if let Some(videos) = call("youtube search", || youtube.search(query)).await {
        match videos.first() {
            Some(video) => println!("▶ {} ({})\n   {}", video.title, video.channel, video.url()),
            None => println!("No videos found for \"{}\".", query),
        }
    }
}
