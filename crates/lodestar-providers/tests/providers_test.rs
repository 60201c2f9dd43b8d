//! Provider behaviour against mocked upstream APIs.

use std::time::Duration;

use lodestar_core::{ProviderError, RecoverExt};
use lodestar_providers::{
    ApodProvider, CatProvider, DogProvider, DuckProvider, LaunchProvider, PokemonProvider,
    ProviderSettings, YouTubeProvider,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(batch_size: usize, low_water: usize) -> ProviderSettings {
    ProviderSettings {
        timeout: Duration::from_secs(5),
        low_water,
        batch_size,
    }
}

fn apod_entry(date: &str, title: &str) -> serde_json::Value {
    json!({
        "date": date,
        "title": title,
        "explanation": "",
        "url": format!("https://apod.nasa.gov/{title}.jpg"),
        "media_type": "image"
    })
}

#[tokio::test]
async fn test_apod_random_serves_batch_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/planetary/apod"))
        .and(query_param("api_key", "k"))
        .and(query_param("count", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            apod_entry("2020-01-01", "one"),
            apod_entry("2021-02-02", "two"),
            apod_entry("2022-03-03", "three"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/planetary/apod", server.uri());
    let provider = ApodProvider::with_base_url(&base, "k".to_string(), &settings(3, 0)).unwrap();

    assert_eq!(provider.random().await.unwrap().title, "one");
    assert_eq!(provider.random().await.unwrap().title, "two");
    assert_eq!(provider.buffered().await, 1);
}

#[tokio::test]
async fn test_apod_today() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/planetary/apod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(apod_entry("2024-04-08", "eclipse")))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/planetary/apod", server.uri());
    let provider = ApodProvider::with_base_url(&base, "k".to_string(), &settings(3, 0)).unwrap();

    let entry = provider.today().await.unwrap();
    assert_eq!(entry.title, "eclipse");
    assert_eq!(provider.buffered().await, 0);
}

#[tokio::test]
async fn test_apod_upstream_error_recovers_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API_KEY_INVALID"))
        .mount(&server)
        .await;

    let provider =
        ApodProvider::with_base_url(&server.uri(), "bad".to_string(), &settings(3, 0)).unwrap();

    let err = provider.today().await.unwrap_err();
    match &err {
        ProviderError::UnexpectedResponseCode { status, body, .. } => {
            assert_eq!(*status, 403);
            assert_eq!(body, "API_KEY_INVALID");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(Err::<(), _>(err).recover("apod today").is_none());

    // The buffer cannot fill either, so random items are unavailable.
    assert!(provider.random().await.unwrap_err().is_unavailable());
}

#[tokio::test]
async fn test_cats_send_key_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(query_param("limit", "4"))
        .and(header("x-api-key", "meow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "url": "https://cats/c1.jpg"},
            {"id": "c2", "url": "https://cats/c2.jpg"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        CatProvider::with_base_url(&server.uri(), Some("meow".to_string()), &settings(4, 0))
            .unwrap();
    assert_eq!(provider.random().await.unwrap().id, "c1");
    assert_eq!(provider.buffered().await, 1);
}

#[tokio::test]
async fn test_keyless_cats_fetch_once_per_batch() {
    let server = MockServer::start().await;
    let images: Vec<_> = (0..10)
        .map(|i| json!({"id": format!("c{i}"), "url": format!("https://cats/c{i}.jpg")}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/images/search"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(images))
        .expect(1)
        .mount(&server)
        .await;

    let provider = CatProvider::with_base_url(&server.uri(), None, &ProviderSettings::default())
        .unwrap();
    assert_eq!(provider.random().await.unwrap().id, "c0");

    // Nine left is above the derived low-water mark, so nothing is spawned.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(provider.buffered().await, 9);
}

#[tokio::test]
async fn test_dogs_refill_in_background_at_low_water() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/breeds/image/random/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": [
                "https://images.dog.ceo/breeds/pug/1.jpg",
                "https://images.dog.ceo/breeds/hound-afghan/2.jpg",
                "https://images.dog.ceo/breeds/collie-border/3.jpg"
            ],
            "status": "success"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let provider = DogProvider::with_base_url(&server.uri(), &settings(3, 2)).unwrap();

    let first = provider.random().await.unwrap();
    assert_eq!(first.breed.as_deref(), Some("pug"));

    // Two left, at the low-water mark: a background refill tops up.
    for _ in 0..50 {
        if provider.buffered().await == 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(provider.buffered().await, 5);
    assert_eq!(
        provider.random().await.unwrap().breed.as_deref(),
        Some("afghan hound")
    );
}

#[tokio::test]
async fn test_ducks_load_list_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file_count": 2,
            "images": ["1.jpg"],
            "gifs": ["2.gif"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = DuckProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();
    assert!(!provider.is_loaded().await);

    for _ in 0..5 {
        let duck = provider.random().await.unwrap();
        assert!(duck.url.starts_with(&server.uri()));
        assert_eq!(duck.animated, duck.url.ends_with(".gif"));
    }
    assert!(provider.is_loaded().await);
}

#[tokio::test]
async fn test_pokemon_lookup_found_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 25,
            "name": "pikachu",
            "height": 4,
            "weight": 60,
            "types": [{"slot": 1, "type": {"name": "electric", "url": ""}}],
            "sprites": {"front_default": null}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon/missingno"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let provider = PokemonProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();

    let pikachu = provider.lookup("Pikachu").await.unwrap().unwrap();
    assert_eq!(pikachu.id, 25);
    assert_eq!(pikachu.types, vec!["electric"]);

    assert_eq!(provider.lookup("missingno").await.unwrap(), None);
}

#[tokio::test]
async fn test_pokemon_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let provider = PokemonProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();
    let err = provider.lookup("eevee").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_pokemon_name_stays_in_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/berry/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "cheri", "height": 0, "weight": 0
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(0)
        .mount(&server)
        .await;

    // Unmatched requests get a 404 from the mock server.
    let provider = PokemonProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();
    assert_eq!(provider.lookup("../berry/1").await.unwrap(), None);
    assert_eq!(provider.lookup("?").await.unwrap(), None);
}

#[tokio::test]
async fn test_pokemon_random_uses_species_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon"))
        .and(query_param("limit", "100000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{"name": "ditto", "url": ""}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pokemon/ditto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 132, "name": "ditto", "height": 3, "weight": 40,
            "types": [{"slot": 1, "type": {"name": "normal", "url": ""}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let provider = PokemonProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();
    assert_eq!(provider.random().await.unwrap().name, "ditto");
    assert_eq!(provider.random().await.unwrap().name, "ditto");
    assert_eq!(provider.species_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_launches_upcoming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/launch/upcoming/"))
        .and(query_param("limit", "1"))
        .and(query_param("mode", "list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 120,
            "results": [{
                "id": "abc",
                "name": "Electron | Mission",
                "net": "2031-01-01T00:00:00Z",
                "status": {"name": "To Be Confirmed", "abbrev": "TBC"}
            }]
        })))
        .mount(&server)
        .await;

    let provider = LaunchProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();
    let next = provider.next().await.unwrap().unwrap();
    assert_eq!(next.name, "Electron | Mission");
}

#[tokio::test]
async fn test_launches_limit_is_capped_and_zero_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/launch/upcoming/"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = LaunchProvider::with_base_url(&server.uri(), &settings(3, 0)).unwrap();
    assert!(provider.upcoming(0).await.unwrap().is_empty());
    assert!(provider.upcoming(500).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_youtube_search_skips_non_videos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "lofi beats"))
        .and(query_param("key", "yt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": {"channelId": "UC1"}, "snippet": {"title": "Channel", "channelTitle": "C"}},
                {"id": {"videoId": "v1"}, "snippet": {"title": "Beats", "channelTitle": "Lofi"}}
            ]
        })))
        .mount(&server)
        .await;

    let provider =
        YouTubeProvider::with_base_url(&server.uri(), "yt".to_string(), &settings(3, 0)).unwrap();
    let videos = provider.search("lofi beats").await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].url(), "https://www.youtube.com/watch?v=v1");
}
