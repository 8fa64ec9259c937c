//! SQLite-backed song store
//!
//! Each operation is a single statement on a pooled connection, so a vote
//! is atomic without an explicit transaction. Connections return to the
//! pool when the query future completes or is dropped.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

use super::SongStore;
use crate::db::init_database;
use crate::models::{NewSong, Song, SongUpdate};
use crate::{Error, Result};

const SONG_COLUMNS: &str = "id, title, picture, added_by, votes, url";

/// Song store persisted in the `songs` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an already initialized pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file and bring its schema up to date
    ///
    /// Any failure here is reported as `StorageUnavailable`.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init_database(db_path).await.map_err(|e| match e {
            Error::StorageUnavailable(_) => e,
            other => Error::StorageUnavailable(format!("{}: {}", db_path.display(), other)),
        })?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Lost connections and a closed or exhausted pool mean the database is
/// unreachable, not that the statement was wrong.
fn storage_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            Error::StorageUnavailable(err.to_string())
        }
        other => Error::Database(other),
    }
}

fn song_from_row(row: &SqliteRow) -> Result<Song> {
    Ok(Song {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        picture: row.try_get("picture")?,
        added_by: row.try_get("added_by")?,
        votes: row.try_get::<Option<i64>, _>("votes")?.unwrap_or(0),
        url: row.try_get("url")?,
    })
}

#[async_trait]
impl SongStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self, song), fields(title = %song.title), level = "debug")]
    async fn add(&self, song: NewSong) -> Result<Song> {
        song.validate()?;

        let row = sqlx::query(&format!(
            "INSERT INTO songs (title, picture, added_by, votes, url) \
             VALUES (?, ?, ?, 0, ?) RETURNING {SONG_COLUMNS}"
        ))
        .bind(&song.title)
        .bind(song.picture.as_deref())
        .bind(&song.added_by)
        .bind(song.url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        let song = song_from_row(&row)?;
        debug!(id = song.id, "song added");
        Ok(song)
    }

    async fn list(&self) -> Result<Vec<Song>> {
        let rows = sqlx::query(&format!(
            "SELECT {SONG_COLUMNS} FROM songs ORDER BY votes DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(song_from_row).collect()
    }

    async fn get(&self, id: i64) -> Result<Song> {
        let row = sqlx::query(&format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(Error::NotFound(id))?;

        song_from_row(&row)
    }

    async fn vote(&self, id: i64) -> Result<Song> {
        let row = sqlx::query(&format!(
            "UPDATE songs SET votes = COALESCE(votes, 0) + 1 WHERE id = ? RETURNING {SONG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(Error::NotFound(id))?;

        let song = song_from_row(&row)?;
        debug!(id, votes = song.votes, "vote recorded");
        Ok(song)
    }

    async fn edit(&self, id: i64, update: SongUpdate) -> Result<Song> {
        update.validate()?;

        let row = sqlx::query(&format!(
            "UPDATE songs SET \
                 title = COALESCE(?, title), \
                 picture = COALESCE(?, picture), \
                 url = COALESCE(?, url) \
             WHERE id = ? RETURNING {SONG_COLUMNS}"
        ))
        .bind(update.title.as_deref())
        .bind(update.picture.as_deref())
        .bind(update.url.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(Error::NotFound(id))?;

        debug!(id, "song edited");
        song_from_row(&row)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        debug!(id, "song deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("songs.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_closed_pool_reports_storage_unavailable() {
        let (_dir, store) = setup_store().await;
        store.add(NewSong::new("Song A", "Alice")).await.unwrap();
        store.close().await;

        assert!(matches!(store.list().await, Err(Error::StorageUnavailable(_))));
        assert!(matches!(store.vote(1).await, Err(Error::StorageUnavailable(_))));
        assert!(matches!(
            store.add(NewSong::new("Song B", "Bob")).await,
            Err(Error::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let (_dir, store) = setup_store().await;

        let added = store
            .add(NewSong::new("Song A", "Alice").with_url("https://example.com/a"))
            .await
            .unwrap();
        assert_eq!(added.votes, 0);

        let loaded = store.get(added.id).await.unwrap();
        assert_eq!(loaded, added);
        assert_eq!(loaded.url.as_deref(), Some("https://example.com/a"));
    }

    #[tokio::test]
    async fn test_picture_bytes_stored_verbatim() {
        let (_dir, store) = setup_store().await;

        let bytes: Vec<u8> = (0..=255).collect();
        let added = store
            .add(NewSong::new("Song A", "Alice").with_picture(bytes.clone()))
            .await
            .unwrap();

        assert_eq!(store.get(added.id).await.unwrap().picture, Some(bytes));
    }

    #[tokio::test]
    async fn test_edit_keeps_votes_and_unspecified_fields() {
        let (_dir, store) = setup_store().await;

        let song = store
            .add(NewSong::new("Old", "Alice").with_picture(vec![1, 2, 3]))
            .await
            .unwrap();
        store.vote(song.id).await.unwrap();

        let edited = store
            .edit(
                song.id,
                SongUpdate {
                    title: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.title, "New");
        assert_eq!(edited.picture, Some(vec![1, 2, 3]));
        assert_eq!(edited.added_by, "Alice");
        assert_eq!(edited.votes, 1);
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let (_dir, store) = setup_store().await;

        assert!(matches!(store.get(5).await, Err(Error::NotFound(5))));
        assert!(matches!(store.vote(5).await, Err(Error::NotFound(5))));
        assert!(matches!(store.delete(5).await, Err(Error::NotFound(5))));
        assert!(matches!(
            store
                .edit(
                    5,
                    SongUpdate {
                        url: Some("https://example.com".to_string()),
                        ..Default::default()
                    }
                )
                .await,
            Err(Error::NotFound(5))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_unwritable_location_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        // A regular file cannot act as the parent directory
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = SqliteStore::open(&blocker.join("songs.db")).await;
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    }
}
