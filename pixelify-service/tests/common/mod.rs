#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::Engine as _;
use http_body_util::BodyExt;
use pixelify_service::config::{CorsConfig, Variant};
use pixelify_service::services::providers::mock::{MockDescriptionProvider, MockImageProvider};
use pixelify_service::services::{Converter, InMemoryStore};
use pixelify_service::startup::{build_router, AppState};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

/// In-process app wired to mock providers and an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub description: Arc<MockDescriptionProvider>,
    pub images: Arc<MockImageProvider>,
}

impl TestApp {
    pub fn new(variant: Variant) -> Self {
        Self::with_parts(
            variant,
            MockDescriptionProvider::new(true),
            MockImageProvider::new(true),
            InMemoryStore::new(),
        )
    }

    pub fn with_parts(
        variant: Variant,
        description: MockDescriptionProvider,
        images: MockImageProvider,
        store: InMemoryStore,
    ) -> Self {
        let description = Arc::new(description);
        let images = Arc::new(images);

        let state = AppState {
            store: Arc::new(store.clone()),
            converter: Converter::new(
                variant,
                variant.generates_images(),
                description.clone(),
                images.clone(),
            ),
        };

        let cors = CorsConfig {
            allowed_origins: Vec::new(),
        };

        Self {
            router: build_router(state, &cors),
            store,
            description,
            images,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST an arbitrary body, optionally with a content type.
    pub async fn post_raw(
        &self,
        uri: &str,
        content_type: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        self.send(builder.body(body.into()).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

/// A 100x100 striped PNG, base64 encoded without a data-URL prefix.
pub fn test_png_base64() -> String {
    let img = image::RgbImage::from_fn(100, 100, |i, j| {
        if (i + j) % 20 < 10 {
            image::Rgb([255, 0, 0])
        } else if i % 30 < 15 {
            image::Rgb([0, 255, 0])
        } else {
            image::Rgb([0, 0, 255])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
}

pub fn test_png_data_url() -> String {
    format!("data:image/png;base64,{}", test_png_base64())
}
