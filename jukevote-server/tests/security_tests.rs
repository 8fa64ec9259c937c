//! Security tests for jukevote-server
//!
//! - Request bodies are capped at 10MB
//! - Submitted text is stored and returned verbatim, never interpreted

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use jukevote_common::SqliteStore;
use jukevote_server::{build_router, AppState, MAX_BODY_BYTES};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_app(dir: &TempDir) -> axum::Router {
    let store = SqliteStore::open(&dir.path().join("songs.db")).await.unwrap();
    build_router(AppState::new(Arc::new(store)))
}

fn add_song_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/add_song")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

// =============================================================================
// Body Size Limit Tests
// =============================================================================

#[tokio::test]
async fn test_body_size_limit_10mb() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir).await;

    let large_body = vec![b'x'; MAX_BODY_BYTES + 1024];
    let response = app.clone().oneshot(add_song_request(large_body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let response = app
        .oneshot(Request::builder().uri("/get_songs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["songs"], json!([]));
}

/// A picture well under the limit is accepted
#[tokio::test]
async fn test_large_picture_under_limit_accepted() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir).await;

    let picture = vec![0xabu8; 2 * 1024 * 1024];
    let body = json!({
        "title": "Big Cover",
        "added_by": "Alice",
        "picture": STANDARD.encode(&picture),
    });

    let response = app
        .clone()
        .oneshot(add_song_request(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/song_picture/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.len(), picture.len());
}

// =============================================================================
// Injection Tests
// =============================================================================

#[tokio::test]
async fn test_sql_in_fields_stored_verbatim() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir).await;

    let title = "Robert'); DROP TABLE songs;--";
    let added_by = "<script>alert(1)</script>";
    let body = json!({ "title": title, "added_by": added_by });

    let response = app
        .clone()
        .oneshot(add_song_request(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::builder().uri("/get_songs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["songs"][0]["title"], title);
    assert_eq!(body["songs"][0]["added_by"], added_by);
}
