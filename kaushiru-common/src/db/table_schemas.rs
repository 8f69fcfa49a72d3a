//! Declared column sets per table
//!
//! Columns added over the life of the service are listed here so older
//! databases pick them up at startup. `created_at` carries no DEFAULT here:
//! SQLite refuses non-constant defaults in `ALTER TABLE`, and every table
//! already has it from `CREATE TABLE`.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub struct PostsTableSchema;

impl TableSchema for PostsTableSchema {
    fn table_name() -> &'static str {
        "posts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("user_uuid", "TEXT").not_null(),
            ColumnDefinition::new("price", "INTEGER").not_null(),
            ColumnDefinition::new("is_tax_included", "INTEGER").not_null().default("1"),
            // forecast-era columns
            ColumnDefinition::new("item_category", "TEXT"),
            ColumnDefinition::new("size_status", "TEXT"),
            ColumnDefinition::new("sentiment_level", "INTEGER"),
            ColumnDefinition::new("comment", "TEXT"),
            ColumnDefinition::new("area_group", "TEXT"),
            // hierarchical region
            ColumnDefinition::new("region_big", "TEXT"),
            ColumnDefinition::new("region_pref", "TEXT"),
            ColumnDefinition::new("region_city", "TEXT"),
            // item-name scheme
            ColumnDefinition::new("item_name", "TEXT"),
            ColumnDefinition::new("category_new", "TEXT"),
            ColumnDefinition::new("quantity", "INTEGER"),
            ColumnDefinition::new("unit", "TEXT"),
            ColumnDefinition::new("created_at", "TEXT"),
        ]
    }
}

pub struct ReactionsTableSchema;

impl TableSchema for ReactionsTableSchema {
    fn table_name() -> &'static str {
        "reactions"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("post_id", "TEXT").not_null(),
            ColumnDefinition::new("user_uuid", "TEXT").not_null(),
            ColumnDefinition::new("created_at", "TEXT"),
        ]
    }
}

pub struct BuyLogsTableSchema;

impl TableSchema for BuyLogsTableSchema {
    fn table_name() -> &'static str {
        "buy_logs"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("user_uuid", "TEXT").not_null(),
            ColumnDefinition::new("log_type", "TEXT").not_null(),
            ColumnDefinition::new("is_public", "INTEGER").not_null().default("1"),
            ColumnDefinition::new("category", "TEXT"),
            ColumnDefinition::new("price", "INTEGER"),
            ColumnDefinition::new("quantity_note", "TEXT"),
            ColumnDefinition::new("extra_flag", "INTEGER"),
            ColumnDefinition::new("comment", "TEXT"),
            ColumnDefinition::new("total_price", "INTEGER"),
            ColumnDefinition::new("days_covered", "INTEGER"),
            ColumnDefinition::new("extra_level", "TEXT"),
            ColumnDefinition::new("daily_comment", "TEXT"),
            ColumnDefinition::new("created_at", "TEXT"),
        ]
    }
}

pub struct DailyQuotesTableSchema;

impl TableSchema for DailyQuotesTableSchema {
    fn table_name() -> &'static str {
        "daily_quotes"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("content", "TEXT").not_null(),
            ColumnDefinition::new("item_name", "TEXT"),
            ColumnDefinition::new("price", "INTEGER"),
            ColumnDefinition::new("quantity", "INTEGER"),
            ColumnDefinition::new("unit", "TEXT"),
            ColumnDefinition::new("region_big", "TEXT"),
            ColumnDefinition::new("region_pref", "TEXT"),
            ColumnDefinition::new("region_city", "TEXT"),
            ColumnDefinition::new("created_at", "TEXT"),
        ]
    }
}

pub struct ContactsTableSchema;

impl TableSchema for ContactsTableSchema {
    fn table_name() -> &'static str {
        "contacts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("name", "TEXT"),
            ColumnDefinition::new("email", "TEXT"),
            ColumnDefinition::new("message", "TEXT").not_null(),
            ColumnDefinition::new("created_at", "TEXT"),
        ]
    }
}

/// Add missing columns to every table
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    let added = SchemaSync::sync_table::<PostsTableSchema>(pool).await?
        + SchemaSync::sync_table::<ReactionsTableSchema>(pool).await?
        + SchemaSync::sync_table::<BuyLogsTableSchema>(pool).await?
        + SchemaSync::sync_table::<DailyQuotesTableSchema>(pool).await?
        + SchemaSync::sync_table::<ContactsTableSchema>(pool).await?;

    if added > 0 {
        info!("Schema sync added {} column(s)", added);
    }
    Ok(())
}
