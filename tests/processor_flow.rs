//! End-to-end coordinator tests against a mock inference service.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use lenscache::{Error, FetchError, ImageProcessor, InMemoryEventSink, MemoryStore, ResultStore};
use mockito::{Mock, ServerGuard};
use serde_json::json;
use std::sync::Arc;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn png_base64() -> String {
    BASE64.encode(PNG_SIGNATURE)
}

fn completion_body(content: &str) -> String {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

async fn mock_completion(server: &mut ServerGuard, content: &str, hits: usize) -> Mock {
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body(content))
        .expect(hits)
        .create_async()
        .await
}

fn processor_for(
    server: &ServerGuard,
    sink: Arc<InMemoryEventSink>,
    store: Arc<MemoryStore>,
) -> ImageProcessor {
    ImageProcessor::builder()
        .api_key("test-key")
        .base_url_override(server.url())
        .event_sink(sink)
        .store(store)
        .build()
        .expect("processor should build")
}

#[tokio::test]
async fn first_call_misses_second_call_hits_without_remote_traffic() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = mock_completion(&mut server, r#"{"label":"cat"}"#, 1).await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let image = png_base64();
    processor.process(&image, "Describe this").await.unwrap();
    processor.process(&image, "Describe this").await.unwrap();

    // Exactly one remote call despite two process invocations.
    mock.assert_async().await;

    let events = sink.events();
    let names: Vec<_> = events.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["receipt", "cacheMiss", "receipt", "cacheHit"]);

    // All four events share the fingerprint of the (image, prompt) pair.
    let fp = events[0].fingerprint().clone();
    assert!(events.iter().all(|e| e.fingerprint() == &fp));

    match &events[1] {
        lenscache::ProcessingEvent::CacheMiss { result, .. } => {
            assert_eq!(result.result, json!({"label": "cat"}));
            assert!(result.elapsed_seconds >= 0.0);
            assert_eq!(result.fingerprint, fp);
        }
        other => panic!("expected cacheMiss, got {other:?}"),
    }
    match &events[3] {
        lenscache::ProcessingEvent::CacheHit { result, .. } => {
            assert_eq!(result.result, json!({"label": "cat"}));
        }
        other => panic!("expected cacheHit, got {other:?}"),
    }

    assert_eq!(store.len().await, 1);
    let stats = store.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn url_reference_is_fetched_before_inference() {
    let mut server = mockito::Server::new_async().await;
    let image_mock = server
        .mock("GET", "/x.png")
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(PNG_SIGNATURE.to_vec())
        .create_async()
        .await;
    let completion = mock_completion(&mut server, "{}", 1).await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let url = format!("{}/x.png", server.url());
    processor.process(&url, "Describe this").await.unwrap();

    image_mock.assert_async().await;
    completion.assert_async().await;
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn non_json_content_propagates_parse_error_without_caching() {
    let mut server = mockito::Server::new_async().await;
    mock_completion(&mut server, "plain prose, not json", 1).await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let err = processor
        .process(&png_base64(), "Describe this")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Parse(_)));

    // Receipt was already emitted; nothing else follows a failure.
    let names: Vec<_> = sink.events().iter().map(|e| e.name()).collect();
    assert_eq!(names, ["receipt"]);
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn failed_remote_retrieval_propagates_fetch_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/gone.png")
        .with_status(502)
        .create_async()
        .await;
    let completion = mock_completion(&mut server, "{}", 0).await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let url = format!("{}/gone.png", server.url());
    let err = processor.process(&url, "Describe this").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Fetch(FetchError::Status { status: 502, .. })
    ));

    completion.assert_async().await;
    let names: Vec<_> = sink.events().iter().map(|e| e.name()).collect();
    assert_eq!(names, ["receipt"]);
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn inference_failure_leaves_cache_untouched_and_later_call_retries() {
    let mut server = mockito::Server::new_async().await;
    let failure = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body(r#"{"error":{"message":"upstream exploded"}}"#)
        .expect(1)
        .create_async()
        .await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let err = processor
        .process(&png_base64(), "Describe this")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Gateway(_)));
    assert_eq!(store.len().await, 0);
    failure.assert_async().await;

    // A failed fingerprint is not poisoned: the next call misses again and
    // succeeds once the service recovers.
    failure.remove_async().await;
    mock_completion(&mut server, r#"{"ok":true}"#, 1).await;

    processor
        .process(&png_base64(), "Describe this")
        .await
        .unwrap();
    assert_eq!(store.len().await, 1);

    let names: Vec<_> = sink.events().iter().map(|e| e.name()).collect();
    assert_eq!(names, ["receipt", "receipt", "cacheMiss"]);
}

#[tokio::test]
async fn distinct_prompts_occupy_distinct_cache_slots() {
    let mut server = mockito::Server::new_async().await;
    mock_completion(&mut server, "{}", 2).await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let image = png_base64();
    processor.process(&image, "Describe this").await.unwrap();
    processor.process(&image, "Count the cats").await.unwrap();

    assert_eq!(store.len().await, 2);
    let events = sink.events();
    assert_ne!(events[0].fingerprint(), events[2].fingerprint());
}

#[tokio::test]
async fn concurrent_identical_calls_both_miss_and_last_writer_wins() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    // Both calls are expected to reach the service: there is no single-flight
    // deduplication of in-flight fingerprints.
    let mock = mock_completion(&mut server, r#"{"label":"cat"}"#, 2).await;

    let sink = Arc::new(InMemoryEventSink::new());
    let store = Arc::new(MemoryStore::new());
    let processor = processor_for(&server, sink.clone(), store.clone());

    let image = png_base64();
    let (a, b) = tokio::join!(
        processor.process(&image, "Describe this"),
        processor.process(&image, "Describe this"),
    );
    a.unwrap();
    b.unwrap();

    mock.assert_async().await;

    // One slot, holding one complete result (whichever finished last).
    assert_eq!(store.len().await, 1);
    let fp = lenscache::Fingerprint::derive(&image, "Describe this");
    let entry = store.get(&fp).await.expect("entry must exist");
    assert_eq!(entry.result, json!({"label": "cat"}));

    let names: Vec<_> = sink.events().iter().map(|e| e.name()).collect();
    assert_eq!(names.iter().filter(|n| **n == "receipt").count(), 2);
    assert_eq!(names.iter().filter(|n| **n == "cacheMiss").count(), 2);
}
