//! Router-level tests for the conversion API.
//!
//! These run fully in-process against mock providers and an in-memory store.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{test_png_base64, test_png_data_url, TestApp};
use pixelify_service::config::Variant;
use pixelify_service::services::providers::mock::{MockDescriptionProvider, MockImageProvider};
use pixelify_service::services::InMemoryStore;
use pixelify_service::startup::MAX_BODY_BYTES;
use serde_json::json;

#[tokio::test]
async fn root_reports_service_name_per_variant() {
    let (status, body) = TestApp::new(Variant::Santa).get("/api/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Santa Transformer API" }));

    let (status, body) = TestApp::new(Variant::Pokemon).get("/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pokemon Pixelizer API");
}

#[tokio::test]
async fn pixelify_rejects_empty_image() {
    let app = TestApp::new(Variant::Santa);

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": "" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No image provided"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn pixelify_rejects_invalid_base64() {
    let app = TestApp::new(Variant::Santa);

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": "invalid_base64_data" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid image format"));
    assert!(app.description.calls().is_empty());
}

#[tokio::test]
async fn malformed_json_gets_json_error_body() {
    let app = TestApp::new(Variant::Santa);

    let (status, body) = app
        .post_raw("/api/pixelify", Some("application/json"), "{not json")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.description.calls().is_empty());
}

#[tokio::test]
async fn missing_content_type_gets_json_error_body() {
    let app = TestApp::new(Variant::Santa);
    let payload = json!({ "image_base64": test_png_data_url() }).to_string();

    let (status, body) = app.post_raw("/api/pixelify", None, payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Content-Type"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn oversized_body_gets_json_error_body() {
    let app = TestApp::new(Variant::Santa);
    let payload = format!(
        r#"{{"image_base64":"{}"}}"#,
        "A".repeat(MAX_BODY_BYTES + 1024)
    );

    let (status, body) = app
        .post_raw("/api/pixelify", Some("application/json"), payload)
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "Request body too large");
}

#[tokio::test]
async fn line_wrapped_base64_is_accepted() {
    let app = TestApp::new(Variant::Pokemon);
    let encoded = test_png_base64();
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| std::str::from_utf8(line).unwrap())
        .collect::<Vec<_>>()
        .join("\n");

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": wrapped }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_image"], wrapped);
}

#[tokio::test]
async fn pixelify_converts_valid_png() {
    let app = TestApp::new(Variant::Santa);
    let input = test_png_data_url();

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": input }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["original_image"], input);
    assert!(body["result_text"].as_str().unwrap().len() > 50);
    assert!(body["generated_image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());

    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn pixelify_accepts_raw_base64() {
    let app = TestApp::new(Variant::Pokemon);
    let input = test_png_base64();

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": input }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["original_image"], input);
    assert!(body.get("generated_image").is_none());
}

#[tokio::test]
async fn pixelify_without_credential_is_server_error() {
    let app = TestApp::with_parts(
        Variant::Santa,
        MockDescriptionProvider::new(false),
        MockImageProvider::new(false),
        InMemoryStore::new(),
    );

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": test_png_data_url() }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "API key not configured");
}

#[tokio::test]
async fn failed_generation_persists_nothing() {
    let app = TestApp::with_parts(
        Variant::Santa,
        MockDescriptionProvider::new(true),
        MockImageProvider::new(true).with_images(Vec::new()),
        InMemoryStore::new(),
    );

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": test_png_data_url() }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate image");
    assert_eq!(app.description.calls().len(), 1);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn upstream_failure_is_reported() {
    let app = TestApp::with_parts(
        Variant::Santa,
        MockDescriptionProvider::new(true),
        MockImageProvider::new(true).failing("quota exceeded"),
        InMemoryStore::new(),
    );

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": test_png_data_url() }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to process image"));
    assert!(message.contains("quota exceeded"));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn storage_failure_is_server_error() {
    let app = TestApp::with_parts(
        Variant::Pokemon,
        MockDescriptionProvider::new(true),
        MockImageProvider::new(true),
        InMemoryStore::failing_writes(),
    );

    let (status, body) = app
        .post_json("/api/pixelify", json!({ "image_base64": test_png_data_url() }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn history_starts_empty() {
    let (status, body) = TestApp::new(Variant::Santa).get("/api/history").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn history_returns_latest_conversion_first() {
    let app = TestApp::with_parts(
        Variant::Pokemon,
        MockDescriptionProvider::new(true)
            .with_response("A round electric mouse sprite with a limited yellow palette and red cheeks."),
        MockImageProvider::new(true),
        InMemoryStore::new(),
    );

    let (status, created) = app
        .post_json("/api/pixelify", json!({ "image_base64": test_png_data_url() }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, history) = app.get("/api/history").await;
    assert_eq!(status, StatusCode::OK);

    let entries = history.as_array().unwrap();
    assert!(!entries.is_empty());
    assert_eq!(entries[0]["result_text"], created["result_text"]);
    assert_eq!(entries[0]["id"], created["id"]);
    assert!(entries[0].get("_id").is_none());
}

#[tokio::test]
async fn history_is_capped_and_ordered() {
    let app = TestApp::new(Variant::Pokemon);

    for _ in 0..12 {
        let (status, _) = app
            .post_json("/api/pixelify", json!({ "image_base64": test_png_data_url() }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = app.get("/api/history").await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 10);

    let timestamps: Vec<DateTime<Utc>> = entries
        .iter()
        .map(|e| e["timestamp"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn health_and_readiness_report_ok() {
    let app = TestApp::new(Variant::Santa);

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pixelify-service");

    let (status, _) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body) = TestApp::new(Variant::Santa).get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}
