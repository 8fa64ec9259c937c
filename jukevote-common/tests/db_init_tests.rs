//! Integration tests for database initialization
//!
//! Covers first-run creation, reopening an existing file, and upgrading a
//! songs table written by an older version.

use jukevote_common::db::{init_database, CURRENT_SCHEMA_VERSION};
use jukevote_common::{NewSong, SongStore, SqliteStore};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use tempfile::TempDir;

/// Write a songs table the way an older release or a hand-made file would
async fn create_legacy_table(db_path: &Path, ddl: &str, seed: &str) {
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .unwrap();
    sqlx::query(ddl).execute(&pool).await.unwrap();
    sqlx::query(seed).execute(&pool).await.unwrap();
    pool.close().await;
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("songs.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");

    let pool = result.unwrap();
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('songs', 'schema_version') ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(tables, vec!["schema_version", "songs"]);
}

#[tokio::test]
async fn test_idempotent_initialization() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("songs.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO songs (title, added_by) VALUES ('Song A', 'Alice')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive re-initialization");

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(versions, CURRENT_SCHEMA_VERSION as i64);
}

#[tokio::test]
async fn test_upgrade_table_without_url_column() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("songs.db");

    // Table as written by a version that predates links
    create_legacy_table(
        &db_path,
        r#"
        CREATE TABLE songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            picture BLOB,
            added_by TEXT NOT NULL,
            votes INTEGER DEFAULT 0
        )
        "#,
        "INSERT INTO songs (title, picture, added_by, votes) VALUES ('Old Song', x'00ff', 'Alice', 7), ('Unvoted', NULL, 'Bob', NULL)",
    )
    .await;

    let pool = init_database(&db_path).await.unwrap();

    let has_url: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('songs') WHERE name = 'url'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(has_url, 1);

    let rows: Vec<(String, Option<Vec<u8>>, i64, Option<String>)> =
        sqlx::query_as("SELECT title, picture, votes, url FROM songs ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], ("Old Song".to_string(), Some(vec![0x00, 0xff]), 7, None));
    // NULL vote counts are normalized by migration v1
    assert_eq!(rows[1].2, 0);
}

#[tokio::test]
async fn test_plain_integer_key_table_stops_reusing_ids() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("songs.db");

    create_legacy_table(
        &db_path,
        "CREATE TABLE songs (id INTEGER PRIMARY KEY, title TEXT NOT NULL, picture BLOB, added_by TEXT NOT NULL, votes INTEGER DEFAULT 0)",
        "INSERT INTO songs (title, added_by, votes) VALUES ('Old Song', 'Alice', 3)",
    )
    .await;

    let store = SqliteStore::open(&db_path).await.unwrap();

    let table_sql: String =
        sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'songs'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert!(table_sql.contains("AUTOINCREMENT"), "songs table not rebuilt: {}", table_sql);

    let a = store.add(NewSong::new("Song A", "Alice")).await.unwrap();
    let b = store.add(NewSong::new("Song B", "Bob")).await.unwrap();
    store.delete(b.id).await.unwrap();
    let c = store.add(NewSong::new("Song C", "Carol")).await.unwrap();

    assert_eq!(a.id, 2);
    assert!(c.id > b.id, "deleted id {} was reused", b.id);

    // Rows from before the rebuild keep their ids and votes
    let old = store.get(1).await.unwrap();
    assert_eq!((old.title.as_str(), old.votes), ("Old Song", 3));

    let index_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_songs_votes'",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(index_count, 1);
}
