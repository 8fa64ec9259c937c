//! Declarative schema synchronization
//!
//! Each table declares the columns it should have. On startup the actual
//! table is read back with `PRAGMA table_info` and any declared column that
//! is missing is added with `ALTER TABLE ADD COLUMN`, leaving existing rows
//! in place. Type and constraint drift cannot be fixed that way in SQLite,
//! so it is only reported.
//!
//! ```rust,ignore
//! pub struct SongsTableSchema;
//!
//! impl TableSchema for SongsTableSchema {
//!     fn table_name() -> &'static str { "songs" }
//!
//!     fn expected_columns() -> Vec<ColumnDefinition> {
//!         vec![
//!             ColumnDefinition::new("id", "INTEGER").primary_key(),
//!             ColumnDefinition::new("url", "TEXT"),
//!         ]
//!     }
//! }
//!
//! SchemaSync::sync_table::<SongsTableSchema>(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Expected column with the constraints ALTER TABLE can (partly) express
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type, e.g. "TEXT", "INTEGER", "BLOB"
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// Literal SQL default, quoted if textual
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column clause for `ALTER TABLE ... ADD COLUMN`
    ///
    /// SQLite refuses PRIMARY KEY on added columns and only accepts
    /// NOT NULL when a default is present, so those are dropped here.
    fn add_column_clause(&self) -> String {
        let mut clause = format!("{} {}", self.name, self.sql_type);
        match (&self.default_value, self.not_null) {
            (Some(default), true) => clause.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => clause.push_str(&format!(" DEFAULT {}", default)),
            (None, _) => {}
        }
        clause
    }
}

/// One row of `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between declared and actual schema
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    /// Fixable: column can be added in place
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    /// Needs a manual migration
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// Needs a manual migration
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: &'static str,
    },
}

/// Declared schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Columns in creation order
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Reads the live schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Columns of `table_name` ordered by position
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let rows = sqlx::query("SELECT * FROM pragma_table_info(?)")
            .bind(table_name)
            .fetch_all(pool)
            .await?;

        let mut columns = rows
            .iter()
            .map(|row| -> Result<ActualColumn> {
                Ok(ActualColumn {
                    cid: row.try_get("cid")?,
                    name: row.try_get("name")?,
                    type_name: row.try_get("type")?,
                    not_null: row.try_get::<i32, _>("notnull")? != 0,
                    default_value: row.try_get("dflt_value")?,
                    pk: row.try_get::<i32, _>("pk")? != 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        columns.sort_by_key(|c| c.cid);
        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Compares declared and live schema
pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn],
    ) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for expected_col in expected {
            let Some(actual_col) = actual.iter().find(|c| c.name == expected_col.name) else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                });
                continue;
            };

            if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    expected: expected_col.sql_type.clone(),
                    actual: actual_col.type_name.clone(),
                });
            }

            if expected_col.not_null && !actual_col.not_null && !expected_col.primary_key {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "NOT NULL",
                });
            }

            if expected_col.primary_key && !actual_col.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "PRIMARY KEY",
                });
            }
        }

        drift
    }

    /// SQLite type affinity comparison
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        let is_int = |t: &str| t.contains("INT");
        let is_text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
        let is_real = |t: &str| t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB");
        // Untyped columns have BLOB affinity
        let is_blob = |t: &str| t.contains("BLOB") || t.is_empty();

        (is_int(&exp) && is_int(&act))
            || (is_text(&exp) && is_text(&act))
            || (is_real(&exp) && is_real(&act))
            || (is_blob(&exp) && is_blob(&act))
    }
}

/// Applies fixable drift
pub struct SchemaSync;

impl SchemaSync {
    /// Add missing columns to `T`'s table; report everything else
    ///
    /// Tables that do not exist are skipped; creating them is phase 1's job.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
        let table_name = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            warn!("Schema sync: table '{}' does not exist, skipping", table_name);
            return Ok(());
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            info!("Schema sync: '{}' is up to date", table_name);
            return Ok(());
        }

        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                }
                SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                    warn!(
                        "Type mismatch in {}.{}: expected '{}', found '{}'. Manual migration required.",
                        table, column, expected, actual
                    );
                }
                SchemaDrift::ConstraintMismatch { table, column, constraint } => {
                    warn!(
                        "Constraint mismatch in {}.{}: missing '{}'. Manual migration required.",
                        table, column, constraint
                    );
                }
            }
        }

        Ok(())
    }

    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        if column.primary_key {
            warn!(
                "Adding {}.{} without PRIMARY KEY (not supported by ALTER TABLE)",
                table, column.name
            );
        }
        if column.not_null && column.default_value.is_none() {
            warn!(
                "Adding {}.{} as nullable (NOT NULL requires a DEFAULT)",
                table, column.name
            );
        }

        let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, column.add_column_clause());

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => {
                info!("Schema sync: added column {}.{} ({})", table, column.name, column.sql_type);
                Ok(())
            }
            // Another process initializing the same file got there first
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                info!("Schema sync: column {}.{} already added", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
