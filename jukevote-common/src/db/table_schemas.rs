//! Declared table schemas
//!
//! Adding an optional column here is enough for existing databases to pick
//! it up on the next start.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// `songs` table
pub struct SongsTableSchema;

impl TableSchema for SongsTableSchema {
    fn table_name() -> &'static str {
        "songs"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("title", "TEXT").not_null(),
            ColumnDefinition::new("picture", "BLOB"),
            ColumnDefinition::new("added_by", "TEXT").not_null(),
            ColumnDefinition::new("votes", "INTEGER").not_null().default("0"),
            // Absent from tables created before links were supported
            ColumnDefinition::new("url", "TEXT"),
        ]
    }
}

/// Phase 2 of initialization: add missing columns to every table
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    info!("Synchronizing table schemas");
    SchemaSync::sync_table::<SongsTableSchema>(pool).await?;
    Ok(())
}
