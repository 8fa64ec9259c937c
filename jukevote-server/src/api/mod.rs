//! HTTP API handlers for jukevote-server

pub mod buildinfo;
pub mod health;
pub mod songs;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use songs::{add_song, delete_song, edit_song, get_song_picture, get_songs, vote_song};
pub use ui::{serve_app_js, serve_index};
