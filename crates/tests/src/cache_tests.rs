//! Response memoization integration tests.
//!
//! The engine is built around an injected cache handle so tests can check
//! hit counters and stored entries while mockito verifies how many calls
//! actually reached the worker.

use std::sync::Arc;

use bytes::Bytes;
use chorus_core::cache::ResponseCache;
use chorus_core::config::AppConfig;
use chorus_core::proxy::ProxyEngine;
use chorus_core::upstream::SelectionMode;
use serde_json::{json, Value};

use crate::mock_infrastructure::{request_bytes, MockWorker};

fn base_config(workers: Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();
    config.workers = workers;
    config.select_worker_mode = SelectionMode::SequentialFallback;
    config.request_timeout_seconds = 5;
    config
}

fn engine_with_cache(config: &AppConfig) -> (ProxyEngine, Arc<ResponseCache>) {
    let cache = Arc::new(ResponseCache::new());
    let engine = ProxyEngine::from_config(config, Arc::clone(&cache)).expect("engine builds");
    (engine, cache)
}

fn parse(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("proxy response is JSON")
}

#[tokio::test]
async fn test_cache_all_short_circuits_repeat_requests() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("cached"), 1);

    let mut config = base_config(vec![worker.uri()]);
    config.cache_all_jsonrpc_methods = true;
    let (engine, cache) = engine_with_cache(&config);

    let first = engine.handle_request(request_bytes("hello", 1)).await;
    let second = engine.handle_request(request_bytes("hello", 1)).await;

    assert_eq!(first, second);
    assert_eq!(parse(&second)["result"], "cached");
    worker.assert_all();
    assert_eq!(cache.hit_count(), 1);
    assert_eq!(cache.miss_count(), 1);
}

#[tokio::test]
async fn test_distinct_bodies_do_not_share_entries() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("fresh"), 2);

    let mut config = base_config(vec![worker.uri()]);
    config.cache_all_jsonrpc_methods = true;
    let (engine, cache) = engine_with_cache(&config);

    // identical method, different id, so the raw bodies differ
    engine.handle_request(request_bytes("hello", 1)).await;
    engine.handle_request(request_bytes("hello", 2)).await;

    worker.assert_all();
    assert_eq!(cache.hit_count(), 0);
    assert_eq!(cache.miss_count(), 2);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_blacklisted_method_always_reaches_network() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("memoized"), 1);
    worker.stub_result("random", &json!(4), 2);

    let mut config = base_config(vec![worker.uri()]);
    config.cache_jsonrpc_methods_with_blacklist = true;
    config.cache_jsonrpc_methods_blacklist = vec!["random".to_string()];
    let (engine, cache) = engine_with_cache(&config);

    engine.handle_request(request_bytes("hello", 1)).await;
    engine.handle_request(request_bytes("hello", 1)).await;
    engine.handle_request(request_bytes("random", 1)).await;
    engine.handle_request(request_bytes("random", 1)).await;

    worker.assert_all();
    assert_eq!(cache.hit_count(), 1, "only the memoized method should hit");
}

#[tokio::test]
async fn test_whitelist_alone_enables_no_memoization() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("direct"), 2);

    let mut config = base_config(vec![worker.uri()]);
    config.cache_jsonrpc_methods_whitelist = vec!["hello".to_string()];
    let (engine, cache) = engine_with_cache(&config);

    engine.handle_request(request_bytes("hello", 1)).await;
    engine.handle_request(request_bytes("hello", 1)).await;

    worker.assert_all();
    assert_eq!(cache.hit_count(), 0);
}

#[tokio::test]
async fn test_success_stored_even_when_method_not_cacheable() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("kept"), 1);

    let config = base_config(vec![worker.uri()]);
    let (engine, cache) = engine_with_cache(&config);

    engine.handle_request(request_bytes("hello", 1)).await;

    // stored for later, but never read back while the policy is off
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.hit_count(), 0);
    assert_eq!(cache.miss_count(), 0);
}

#[tokio::test]
async fn test_error_envelope_not_stored_when_method_not_cacheable() {
    let mut worker = MockWorker::start().await;
    worker.stub_error("hello", -32001, "no luck", 1);

    let config = base_config(vec![worker.uri()]);
    let (engine, cache) = engine_with_cache(&config);

    let response = engine.handle_request(request_bytes("hello", 1)).await;

    assert_eq!(parse(&response)["error"]["code"], -32001);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_error_envelope_cached_under_cache_all() {
    let mut worker = MockWorker::start().await;
    worker.stub_error("hello", -32001, "no luck", 1);

    let mut config = base_config(vec![worker.uri()]);
    config.cache_all_jsonrpc_methods = true;
    let (engine, cache) = engine_with_cache(&config);

    let first = engine.handle_request(request_bytes("hello", 1)).await;
    let second = engine.handle_request(request_bytes("hello", 1)).await;

    assert_eq!(first, second);
    assert_eq!(parse(&second)["error"]["code"], -32001);
    worker.assert_all();
    assert_eq!(cache.hit_count(), 1);
}

#[tokio::test]
async fn test_cached_reply_survives_worker_outage() {
    let mut worker = MockWorker::start().await;
    worker.stub_result("hello", &json!("warm"), 1);

    let mut config = base_config(vec![worker.uri()]);
    config.cache_all_jsonrpc_methods = true;
    let (engine, _cache) = engine_with_cache(&config);

    let first = engine.handle_request(request_bytes("hello", 1)).await;
    worker.assert_all();
    drop(worker);

    let second = engine.handle_request(request_bytes("hello", 1)).await;

    assert_eq!(first, second);
    assert_eq!(parse(&second)["result"], "warm");
}
