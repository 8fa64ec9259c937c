//! # Jukevote Common Library
//!
//! Shared code for the Jukevote service:
//! - Song model and input validation
//! - The `SongStore` contract with in-memory and SQLite implementations
//! - Database initialization, schema sync and migrations
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use error::{Error, Result};
pub use models::{NewSong, Song, SongUpdate};
pub use store::{MemoryStore, SongStore, SqliteStore};
