//! jukevote-server library - HTTP surface for the song voting store

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use jukevote_common::SongStore;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

/// Largest accepted request body; pictures arrive base64-encoded inline
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SongStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn SongStore>) -> Self {
        Self { store }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post, put};

    let songs = Router::new()
        .route("/add_song", post(api::add_song))
        .route("/get_songs", get(api::get_songs))
        .route("/vote_song/:id", post(api::vote_song))
        .route("/edit_song/:id", put(api::edit_song))
        .route("/delete_song/:id", delete(api::delete_song))
        .route("/song_picture/:id", get(api::get_song_picture));

    let page = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info));

    Router::new()
        .merge(songs)
        .merge(page)
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
