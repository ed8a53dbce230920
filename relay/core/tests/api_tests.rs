// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::{envelope, input_key, notification, ARCHIVE, STAGE};
use inference_relay_core::application::archiver::NotificationArchiver;
use inference_relay_core::application::output_router::OutputRouter;
use inference_relay_core::infrastructure::clock::LoadClock;
use inference_relay_core::infrastructure::scratch::ScratchSpace;
use inference_relay_core::infrastructure::storage::InMemoryObjectStore;
use inference_relay_core::presentation::api::{app, AppState};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn state(store: Arc<InMemoryObjectStore>, scratch: &TempDir) -> Arc<AppState> {
    Arc::new(AppState {
        router: OutputRouter::new(store.clone()),
        archiver: NotificationArchiver::new(
            store.clone(),
            ARCHIVE,
            ScratchSpace::new(scratch.path()),
            Arc::new(LoadClock::system()),
        ),
        store,
    })
}

async fn post(state: Arc<AppState>, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_route_endpoint_reports_outcomes() {
    let scratch = TempDir::new().unwrap();
    let store = Arc::new(InMemoryObjectStore::new().with_object("results.example", "out/h1.out", "ok"));

    let (status, body) = post(
        state(store.clone(), &scratch),
        "/invocations/route",
        envelope(&[notification("h1", "Completed", "u9")]).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["outcomes"][0]["outcome"], "copied");
    assert_eq!(
        body["outcomes"][0]["destination"],
        "s3://stage/user/federated/u9/sagemaker/outputs/h1.out"
    );
    assert!(store.object(STAGE, "user/federated/u9/sagemaker/outputs/h1.out").is_some());
}

#[tokio::test]
async fn test_route_failure_returns_500_with_failures() {
    let scratch = TempDir::new().unwrap();
    let store = Arc::new(InMemoryObjectStore::new());

    let (status, body) = post(
        state(store, &scratch),
        "/invocations/route",
        envelope(&[notification("lost", "Completed", "u9")]).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["failures"][0]["inference_id"], "lost");
    assert!(body["error"].as_str().unwrap().contains("1 of 1"));
}

#[tokio::test]
async fn test_archive_endpoint_writes_both_tiers() {
    let scratch = TempDir::new().unwrap();
    let store = Arc::new(InMemoryObjectStore::new());
    store.insert(STAGE, &input_key("u9", "h2"), "payload");

    let (status, body) = post(
        state(store.clone(), &scratch),
        "/invocations/archive",
        envelope(&[notification("h2", "Failed", "u9")]).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 1);
    assert_eq!(body["load_timestamp"].as_str().unwrap().len(), 20);
    let bronze = body["bronze_key"].as_str().unwrap();
    let silver = body["silver_key"].as_str().unwrap();
    assert!(store.object(ARCHIVE, bronze).is_some());
    assert!(store.object(ARCHIVE, silver).is_some());
}

#[tokio::test]
async fn test_undecodable_batch_is_422() {
    let scratch = TempDir::new().unwrap();
    let store = Arc::new(InMemoryObjectStore::new());

    let (status, body) = post(
        state(store.clone(), &scratch),
        "/invocations/archive",
        r#"{"records": []}"#.to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Records"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_health() {
    let scratch = TempDir::new().unwrap();
    let response = app(state(Arc::new(InMemoryObjectStore::new()), &scratch))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_archive_with_malformed_record_keeps_bronze() {
    let scratch = TempDir::new().unwrap();
    let store = Arc::new(InMemoryObjectStore::new());
    store.insert(STAGE, &input_key("u9", "h3"), "payload");
    let good = envelope(&[notification("h3", "Completed", "u9")])["Records"][0].clone();
    let body = serde_json::json!({
        "Records": [good, {"Sns": {"Subject": "no message field"}}]
    });

    let (status, response) = post(state(store.clone(), &scratch), "/invocations/archive", body.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response["error"].as_str().unwrap().contains("Sns.Message"));
    let keys = store.keys(ARCHIVE);
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("bronze/"));
}
