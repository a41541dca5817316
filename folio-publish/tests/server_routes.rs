use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use folio_publish::load_config::ServerSettings;
use folio_publish::server::create_router;
use folio_publish_core::codec::WebpEncoder;
use folio_publish_core::config::PublishConfig;
use folio_publish_core::contract::{MockContentStore, PutFile, RemoteEntry};
use folio_publish_core::publish::Publisher;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;

fn settings() -> ServerSettings {
    ServerSettings {
        bind: "127.0.0.1:0".parse().unwrap(),
        max_body_bytes: 5 * 1024 * 1024,
    }
}

fn png_data_uri() -> String {
    let img = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
}

/// Router over a mock repository that already has the assets root.
fn app(puts: Arc<Mutex<Vec<PutFile>>>) -> Router {
    let entries: HashMap<String, RemoteEntry> =
        HashMap::from([("public/assets".to_string(), RemoteEntry::Directory)]);

    let mut store = MockContentStore::new();
    store
        .expect_exists()
        .returning(move |path| Ok(entries.get(&path.to_string()).cloned()));
    store.expect_put_file().returning(move |request| {
        puts.lock().unwrap().push(request);
        Ok(())
    });

    let publisher = Publisher::new(store, WebpEncoder::new(), PublishConfig::default());
    create_router(Arc::new(publisher), &settings())
}

async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/create-md")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn valid_body() -> Value {
    json!({
        "title": "Harbour Site",
        "subtitle": "",
        "category": "Web Design",
        "description": "Responsive site.",
        "tags": ["web", "astro"],
        "imageNames": ["a.png", "b.png"],
        "imgAlts": ["First", "Second"],
        "publishDate": "2024-06-01 00:00:00",
        "images": [png_data_uri(), png_data_uri()],
    })
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = app(Arc::new(Mutex::new(Vec::new())));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn successful_submission_lists_created_files() {
    let puts = Arc::new(Mutex::new(Vec::new()));
    let (status, body) = post_json(app(puts.clone()), valid_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "files": ["PGWE1.md", "PGWE2.md"],
            "assetsPath": "/assets/web-design",
        })
    );

    let puts = puts.lock().unwrap();
    assert_eq!(puts.len(), 4);
    let doc = String::from_utf8(puts[3].content.clone()).unwrap();
    assert!(doc.contains("img_alt: \"Second\""));
    assert!(!doc.contains("subtitle"));
}

#[tokio::test]
async fn missing_description_is_a_bad_request() {
    let puts = Arc::new(Mutex::new(Vec::new()));
    let mut request = valid_body();
    request["description"] = json!("");

    let (status, body) = post_json(app(puts.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "description is required");
    assert_eq!(body["stage"], "validating");
    assert!(puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_base64_is_a_bad_request_with_index() {
    let mut request = valid_body();
    request["images"][1] = json!("data:image/png;base64,@@@");

    let (status, body) = post_json(app(Arc::new(Mutex::new(Vec::new()))), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["index"], 2);
}

#[tokio::test]
async fn undecodable_image_is_unprocessable() {
    let puts = Arc::new(Mutex::new(Vec::new()));
    let mut request = valid_body();
    request["images"][1] = json!(STANDARD.encode(b"plain text, not pixels"));

    let (status, body) = post_json(app(puts.clone()), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Failed to process image 2");
    assert_eq!(body["stage"], "uploading_assets");
    assert_eq!(body["index"], 2);
    assert!(body["details"].as_str().unwrap().contains("unrecognised image format"));
    assert_eq!(puts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app(Arc::new(Mutex::new(Vec::new())));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/create-md")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid request body");
}
