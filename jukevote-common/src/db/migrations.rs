//! Versioned data migrations
//!
//! Column additions are handled by schema sync; this module is for changes
//! to existing data and table rebuilds. Applied versions are recorded in `schema_version`.
//!
//! Never edit a released migration. Add a new `migrate_vN`, bump
//! [`CURRENT_SCHEMA_VERSION`], and keep every migration safe to re-run.

use crate::db::init::{songs_table_ddl, SONGS_VOTES_INDEX};
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Latest applied version, 0 when nothing was recorded
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than this build ({}); leaving it as is",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: zero out NULL vote counts
///
/// Early tables declared `votes INTEGER DEFAULT 0` without NOT NULL, so rows
/// inserted with an explicit NULL could carry no count at all.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    if songs_table_sql(pool).await?.is_none() {
        info!("  songs table doesn't exist yet - skipping migration");
        return Ok(());
    }

    let result = sqlx::query("UPDATE songs SET votes = 0 WHERE votes IS NULL")
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        info!("  Reset {} NULL vote counts to 0", result.rows_affected());
    }
    Ok(())
}

/// Migration v2: rebuild a songs table declared without AUTOINCREMENT
///
/// A plain `INTEGER PRIMARY KEY` lets SQLite reuse the largest deleted id.
/// Runs after schema sync, so every declared column already exists.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let Some(sql) = songs_table_sql(pool).await? else {
        info!("  songs table doesn't exist yet - skipping migration");
        return Ok(());
    };

    if sql.to_ascii_uppercase().contains("AUTOINCREMENT") {
        return Ok(());
    }

    info!("  Rebuilding songs table with AUTOINCREMENT ids");

    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS songs_new")
        .execute(&mut *tx)
        .await?;
    sqlx::query(&songs_table_ddl("songs_new"))
        .execute(&mut *tx)
        .await?;
    let copied = sqlx::query(
        "INSERT INTO songs_new (id, title, picture, added_by, votes, url) \
         SELECT id, title, picture, added_by, MAX(COALESCE(votes, 0), 0), url FROM songs",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("DROP TABLE songs").execute(&mut *tx).await?;
    sqlx::query("ALTER TABLE songs_new RENAME TO songs")
        .execute(&mut *tx)
        .await?;
    sqlx::query(SONGS_VOTES_INDEX).execute(&mut *tx).await?;

    tx.commit().await?;

    info!("  Copied {} songs into the rebuilt table", copied.rows_affected());
    Ok(())
}

/// CREATE statement of the songs table, `None` when it doesn't exist
async fn songs_table_sql(pool: &SqlitePool) -> Result<Option<String>> {
    let sql: Option<String> =
        sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'songs'")
            .fetch_optional(pool)
            .await?;
    Ok(sql)
}
