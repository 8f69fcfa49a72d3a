//! Database initialization, schema maintenance and row models

pub mod init;
pub mod migrations;
pub mod models;
pub mod schema_sync;
pub mod table_schemas;

pub use init::{init_database, prepare_schema, CREATED_AT_DEFAULT};
pub use migrations::{get_schema_version, run_migrations, CURRENT_SCHEMA_VERSION};
pub use models::*;
pub use schema_sync::{ColumnDefinition, ColumnSet, SchemaIntrospector, SchemaSync, TableSchema};
pub use table_schemas::sync_all_table_schemas;
