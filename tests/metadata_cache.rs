//! Metadata cache integration tests
//!
//! Runs the cache against a real HTTP provider pointed at a mock server,
//! so "zero provider calls" is checked at the network boundary.

use std::sync::Arc;
use std::time::Duration;

use dex::adapters::{FallbackProvider, GoogleBooksProvider, OpenLibraryProvider};
use dex::{BookIdentifier, CacheMode, DexError, MetadataCache};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pride() -> BookIdentifier {
    BookIdentifier::parse("9780141439518").unwrap()
}

fn volume() -> serde_json::Value {
    serde_json::json!({
        "items": [{
            "volumeInfo": {
                "title": "Pride and Prejudice",
                "authors": ["Jane Austen"],
                "publisher": "Penguin Classics",
                "publishedDate": "2003-01-30",
                "industryIdentifiers": [{"type": "ISBN_13", "identifier": "9780141439518"}]
            }
        }]
    })
}

#[tokio::test]
async fn test_second_lookup_is_served_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let provider = Arc::new(GoogleBooksProvider::with_base_url(
        server.uri(),
        Duration::from_secs(5),
    ));
    let cache = MetadataCache::new(temp.path().join("isbn"), provider);

    let fetched = cache.get(&pride()).await.unwrap();
    let cached = cache.get(&pride()).await.unwrap();

    assert_eq!(fetched, cached);
    assert_eq!(cached.year(), 2003);
    assert_eq!(cached.first_author_surname(), "Austen");

    // The on-disk entry uses the title-cased keys
    let raw = std::fs::read_to_string(cache.entry_path(&pride())).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["Title"], "Pride and Prejudice");
    assert_eq!(json["Authors"][0], "Jane Austen");
    assert_eq!(json["Year"], 2003);
    assert_eq!(json["Publisher"], "Penguin Classics");
    assert_eq!(json["ISBN-13"], "9780141439518");
}

#[tokio::test]
async fn test_entry_survives_a_new_cache_instance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let provider = Arc::new(GoogleBooksProvider::with_base_url(
        server.uri(),
        Duration::from_secs(5),
    ));

    MetadataCache::new(temp.path(), provider.clone())
        .get(&pride())
        .await
        .unwrap();
    let reopened = MetadataCache::new(temp.path(), provider);
    assert!(reopened.lookup_cached(&pride()).await.is_some());
    reopened.get(&pride()).await.unwrap();
}

#[tokio::test]
async fn test_bypass_always_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume()))
        .expect(2)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("isbn");
    let provider = Arc::new(GoogleBooksProvider::with_base_url(
        server.uri(),
        Duration::from_secs(5),
    ));
    let cache = MetadataCache::new(&dir, provider).with_mode(CacheMode::Bypass);

    cache.get(&pride()).await.unwrap();
    cache.get(&pride()).await.unwrap();
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_fallback_chain_reaches_open_library() {
    let google = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"totalItems": 0})))
        .mount(&google)
        .await;

    let open_library = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ISBN:9780141439518": {
                "title": "Pride and Prejudice",
                "authors": [{"name": "Jane Austen"}],
                "publishers": [{"name": "Penguin Books"}],
                "publish_date": "2003"
            }
        })))
        .expect(1)
        .mount(&open_library)
        .await;

    let temp = TempDir::new().unwrap();
    let timeout = Duration::from_secs(5);
    let chain = FallbackProvider::new(vec![
        Arc::new(GoogleBooksProvider::with_base_url(google.uri(), timeout)),
        Arc::new(OpenLibraryProvider::with_base_url(open_library.uri(), timeout)),
    ]);
    let cache = MetadataCache::new(temp.path(), Arc::new(chain));

    let metadata = cache.get(&pride()).await.unwrap();
    assert_eq!(metadata.publisher(), "Penguin Books");
    assert_eq!(metadata.isbn_13(), &pride());
}

#[tokio::test]
async fn test_provider_outage_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let provider = Arc::new(GoogleBooksProvider::with_base_url(
        server.uri(),
        Duration::from_secs(5),
    ));
    let cache = MetadataCache::new(temp.path(), provider);

    for _ in 0..2 {
        let err = cache.get(&pride()).await.unwrap_err();
        assert!(matches!(err, DexError::MetadataUnavailable { .. }));
        assert!(!err.is_fatal());
    }
    assert!(!cache.entry_path(&pride()).exists());
}
