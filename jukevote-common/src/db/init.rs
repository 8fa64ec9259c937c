//! Database initialization
//!
//! Opening the database runs the full startup sequence, and every step is
//! idempotent so it is safe on every launch:
//! 1. CREATE TABLE IF NOT EXISTS for all tables
//! 2. Declarative schema sync (adds missing columns)
//! 3. Versioned migrations (data fixes)

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Maximum time a statement waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go through connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    // Phase 2: add columns missing from tables created by older versions
    crate::db::table_schemas::sync_all_table_schemas(&pool).await?;

    // Phase 3: data migrations
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Phase 1: create every table that does not exist yet
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_songs_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Index backing the listing order
pub(crate) const SONGS_VOTES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_songs_votes ON songs(votes)";

/// Declared songs table under the given name
///
/// AUTOINCREMENT keeps SQLite from handing out the id of a deleted row.
pub(crate) fn songs_table_ddl(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            picture BLOB,
            added_by TEXT NOT NULL,
            votes INTEGER NOT NULL DEFAULT 0,
            url TEXT,
            CHECK (votes >= 0)
        )
        "#
    )
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&songs_table_ddl("songs")).execute(pool).await?;
    sqlx::query(SONGS_VOTES_INDEX).execute(pool).await?;

    Ok(())
}
