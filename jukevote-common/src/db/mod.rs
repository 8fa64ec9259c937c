//! SQLite initialization, schema sync and migrations

pub mod init;
pub mod migrations;
pub mod schema_sync;
pub mod table_schemas;

pub use init::*;
pub use migrations::{run_migrations, CURRENT_SCHEMA_VERSION};
pub use schema_sync::*;
pub use table_schemas::*;
