//! End-to-end pipeline tests over a real HTTP round trip
//!
//! Drives the debounced query pipeline against the production client and a
//! local mock server. Debounce windows are shortened so the tests run on
//! the real clock; the fine-grained state-machine cases live next to the
//! pipeline module with mocked collaborators and paused time.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tokio_stream::StreamExt;

use gif_catalog::client::GiphyApiClient;
use gif_catalog::config::{ApiConfig, Config};
use gif_catalog::pipeline::{PageEvents, PipelineHandle, PipelineOptions, QueryPipeline};
use gif_catalog::repository::CatalogRepository;

const DEBOUNCE: Duration = Duration::from_millis(50);

fn launch_against(server: &ServerGuard) -> (PipelineHandle, PageEvents) {
    let config = Config {
        api: ApiConfig {
            api_key: "test-key".to_string(),
            base_url: server.url(),
            ..Default::default()
        },
        ..Default::default()
    };
    let api = Arc::new(GiphyApiClient::new(&config.api).unwrap());
    let repository = Arc::new(CatalogRepository::new(api, &config).unwrap());
    QueryPipeline::launch(
        repository,
        PipelineOptions {
            debounce: DEBOUNCE,
            event_buffer: 2,
        },
    )
}

fn one_item_page(id: &str) -> String {
    json!({
        "data": [{
            "id": id,
            "title": format!("item {id}"),
            "images": { "original": { "url": format!("https://media.test/{id}.gif") } }
        }],
        "pagination": { "total_count": 1, "count": 1, "offset": 0 }
    })
    .to_string()
}

fn empty_page() -> String {
    json!({ "data": [], "pagination": { "total_count": 1, "count": 0, "offset": 20 } }).to_string()
}

#[tokio::test]
async fn only_the_final_keystroke_reaches_the_remote() {
    let mut server = Server::new_async().await;
    // Intermediate keystrokes must produce no fetch activity at all
    let partial = server
        .mock("GET", "/v1/gifs/search")
        .match_query(Matcher::UrlEncoded("q".into(), "c".into()))
        .expect(0)
        .create_async()
        .await;
    let trending = server
        .mock("GET", "/v1/gifs/trending")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    server
        .mock("GET", "/v1/gifs/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "cat".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .with_status(200)
        .with_body(one_item_page("settled"))
        .create_async()
        .await;
    server
        .mock("GET", "/v1/gifs/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "cat".into()),
            Matcher::UrlEncoded("offset".into(), "20".into()),
        ]))
        .with_status(200)
        .with_body(empty_page())
        .create_async()
        .await;

    let (handle, events) = launch_against(&server);
    handle.update_query("c");
    handle.update_query("ca");
    handle.update_query("cat");

    let events = events.timeout(Duration::from_secs(5));
    tokio::pin!(events);
    let event = events.next().await.unwrap().expect("settled page in time");
    assert_eq!(event.query, "cat");
    let page = event.page.unwrap();
    assert_eq!(page.items[0].id, "settled");

    // The stream runs to its empty-page terminator
    let event = events.next().await.unwrap().expect("terminator in time");
    assert!(event.page.unwrap().items.is_empty());

    partial.assert_async().await;
    trending.assert_async().await;
}

#[tokio::test]
async fn remote_failure_reaches_the_consumer_as_an_error_event() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/gifs/trending")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    // No updates: the default empty query settles into trending on its own
    let (_handle, events) = launch_against(&server);
    let events = events.timeout(Duration::from_secs(5));
    tokio::pin!(events);

    let event = events.next().await.unwrap().expect("error event in time");
    assert_eq!(event.query, "");
    let err = event.page.unwrap_err();
    assert!(err.is_protocol());
}
