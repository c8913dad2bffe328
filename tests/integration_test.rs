use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use whatyouseek::{
    config::AppConfig,
    favorites::{FavoritesStore, FileStorage, MemoryStorage, Storage},
    llm::CompletionClient,
    ui::{self, Session},
    SearchResult, SeekError, FAVORITES_KEY,
};

const API_KEY: &str = "sk-or-test-0123456789";
const PATH: &str = "/api/v1/chat/completions";

fn config_for(server: &ServerGuard) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.endpoint = format!("{}{}", server.url(), PATH);
    config.api.api_key = API_KEY.to_string();
    config
}

fn completion(content: &str) -> String {
    json!({
        "id": "gen-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_search_sends_prompt_and_parses_results() {
    let mut server = Server::new_async().await;
    let content = "Here are some sites:\n```json\n[{\"title\":\"A\",\"url\":\"https://a.com\",\"description\":\"d\",\"category\":\"c\"}]\n```";

    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
        .match_header("content-type", "application/json")
        .match_header("http-referer", "https://whatyouseek.co")
        .match_header("x-title", "WhatYouSeek")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "model": "mistralai/mistral-7b-instruct",
                "max_tokens": 300
            })),
            Matcher::Regex("Find 5 websites related to: rust web frameworks".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(content))
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    let results = client.search_websites("rust web frameworks").await;

    mock.assert_async().await;
    assert_eq!(
        results,
        vec![SearchResult::new("A", "https://a.com", "d", "c")]
    );
}

#[tokio::test]
async fn test_recommendations_use_titles_without_attribution_headers() {
    let mut server = Server::new_async().await;
    let content = r#"[{"title":"B","url":"https://b.com","description":"d","category":"c"}]"#;

    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
        .match_header("http-referer", Matcher::Missing)
        .match_header("x-title", Matcher::Missing)
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "llama-4-maverick-free" })),
            Matcher::Regex("Based on these favorite websites: Docs.rs, crates.io".to_string()),
        ]))
        .with_status(200)
        .with_body(completion(content))
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    let titles = vec!["Docs.rs".to_string(), "crates.io".to_string()];
    let results = client.recommendations(&titles).await;

    mock.assert_async().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, "https://b.com");
}

#[tokio::test]
async fn test_http_error_is_reported_and_absorbed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(500)
        .with_body("boom")
        .expect(2)
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();

    let err = client.try_search("anything").await.unwrap_err();
    assert!(matches!(err, SeekError::Http { status: 500, ref body } if body == "boom"));
    assert!(client.search_websites("anything").await.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_choices_or_content_yield_empty() {
    let mut server = Server::new_async().await;
    let no_choices = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    assert!(client.try_search("anything").await.unwrap().is_empty());
    no_choices.assert_async().await;

    let mut server = Server::new_async().await;
    let no_content = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":""}}]}"#)
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    assert!(client.try_search("anything").await.unwrap().is_empty());
    no_content.assert_async().await;
}

#[tokio::test]
async fn test_null_choices_or_non_string_content_yield_empty() {
    for body in [
        r#"{"choices":null}"#,
        r#"{"choices":[{"message":{"role":"assistant","content":42}}]}"#,
        r#"{"choices":[{"message":null}]}"#,
    ] {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = CompletionClient::new(&config_for(&server)).unwrap();
        let results = client.try_search("anything").await;
        assert!(
            matches!(results, Ok(ref r) if r.is_empty()),
            "{} gave {:?}",
            body,
            results
        );
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();

    let err = client.try_search("anything").await.unwrap_err();
    assert!(matches!(err, SeekError::MalformedResponse(_)));
    assert!(client.search_websites("anything").await.is_empty());
}

#[tokio::test]
async fn test_unparseable_content_yields_empty() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(completion("Sorry, I cannot browse the web."))
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    assert!(client.try_search("anything").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_api_key_blocks_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .expect(0)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.api.api_key = "short".to_string();
    let client = CompletionClient::new(&config).unwrap();

    let err = client.try_search("anything").await.unwrap_err();
    assert!(matches!(err, SeekError::Config(_)));
    assert!(client.search_websites("anything").await.is_empty());

    config.api.api_key = String::new();
    let client = CompletionClient::new(&config).unwrap();
    assert!(client.search_websites("anything").await.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_recommendations_without_favorites_skip_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .expect(0)
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    assert!(client.recommendations(&[]).await.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_yields_empty() {
    let mut config = AppConfig::default();
    config.api.endpoint = format!("http://127.0.0.1:1{}", PATH);
    config.api.api_key = API_KEY.to_string();

    let client = CompletionClient::new(&config).unwrap();

    let err = client.try_search("anything").await.unwrap_err();
    assert!(matches!(err, SeekError::Request(_)));
    assert!(client.search_websites("anything").await.is_empty());
}

#[tokio::test]
async fn test_interactive_searches_last_to_finish_wins() {
    let mut server = Server::new_async().await;
    let slow = SearchResult::new("Slow", "https://slow.com", "d", "c");
    let fast = SearchResult::new("Fast", "https://fast.com", "d", "c");

    let slow_body = completion(&serde_json::to_string(&[&slow]).unwrap());
    let slow_mock = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex("related to: slow".to_string()))
        .with_status(200)
        .with_chunked_body(move |w| {
            std::thread::sleep(Duration::from_millis(500));
            w.write_all(slow_body.as_bytes())
        })
        .create_async()
        .await;
    let fast_mock = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex("related to: fast".to_string()))
        .with_status(200)
        .with_body(completion(&serde_json::to_string(&[&fast]).unwrap()))
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    let mut session = Session::new(FavoritesStore::load(MemoryStorage::new()));

    // Both searches are queued before either answers; input ends right after.
    let input = tokio::io::BufReader::new(&b"slow\nfast\n"[..]);
    ui::run_with(input, &client, &mut session).await.unwrap();

    slow_mock.assert_async().await;
    fast_mock.assert_async().await;
    assert_eq!(session.results(), &[slow][..]);
}

#[tokio::test]
async fn test_interactive_quit_stops_reading() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .expect(0)
        .create_async()
        .await;

    let client = CompletionClient::new(&config_for(&server)).unwrap();
    let mut session = Session::new(FavoritesStore::load(MemoryStorage::new()));

    let input = tokio::io::BufReader::new(&b":quit\nnever sent\n"[..]);
    ui::run_with(input, &client, &mut session).await.unwrap();

    mock.assert_async().await;
    assert!(session.results().is_empty());
}

#[test]
fn test_favorites_survive_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let favorites_dir = dir.path().join("nested").join("favorites");

    let mut store = FavoritesStore::load(FileStorage::new(&favorites_dir));
    assert!(store.is_empty());

    store.add(SearchResult::new("A", "https://a.com", "d", "c"));
    store.add(SearchResult::new("B", "https://b.com", "d", "c"));
    store.add(SearchResult::new("C", "https://c.com", "d", "c"));
    store.remove("https://b.com");

    let reloaded = FavoritesStore::load(FileStorage::new(&favorites_dir));
    assert_eq!(reloaded.favorites(), store.favorites());
    assert!(reloaded.is_favorite("https://a.com"));
    assert!(!reloaded.is_favorite("https://b.com"));

    let saved = std::fs::read_to_string(favorites_dir.join("favorites.json")).unwrap();
    let saved: Vec<SearchResult> = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved.len(), 2);
}

#[test]
fn test_corrupt_favorites_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.save(FAVORITES_KEY, "[{\"title\": ").unwrap();

    let store = FavoritesStore::load(storage);
    assert!(store.is_empty());
}

#[test]
fn test_file_storage_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("does-not-exist"));

    assert_eq!(storage.load(FAVORITES_KEY).unwrap(), None);
}
