//! Database initialization
//!
//! Opens (or creates) the SQLite file and brings the schema up to date:
//! tables, column sync, versioned migrations, default settings.

use crate::config::RuntimeSettings;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Column default producing the same fixed-width UTC text as
/// [`crate::time::to_db_timestamp`]
pub const CREATED_AT_DEFAULT: &str = "(strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))";

/// Open the database at `db_path`, creating it if needed, and prepare the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    prepare_schema(&pool).await?;

    Ok(pool)
}

/// Create tables, sync columns, run migrations and seed settings.
///
/// Idempotent; also used directly by tests on in-memory pools.
pub async fn prepare_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_posts_table(pool).await?;
    create_reactions_table(pool).await?;
    create_buy_logs_table(pool).await?;
    create_daily_quotes_table(pool).await?;
    create_contacts_table(pool).await?;

    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;
    init_default_settings(pool).await?;

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

/// Key/value runtime settings
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Price observations, both forecast-era and item-name rows
async fn create_posts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            user_uuid TEXT NOT NULL,
            price INTEGER NOT NULL,
            is_tax_included INTEGER NOT NULL DEFAULT 1,
            item_category TEXT,
            size_status TEXT,
            sentiment_level INTEGER,
            comment TEXT,
            area_group TEXT,
            region_big TEXT,
            region_pref TEXT,
            region_city TEXT,
            item_name TEXT,
            category_new TEXT,
            quantity INTEGER,
            unit TEXT,
            created_at TEXT NOT NULL DEFAULT {}
        )
        "#,
        CREATED_AT_DEFAULT
    ))
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_user_uuid ON posts(user_uuid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_reactions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS reactions (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            user_uuid TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT {}
        )
        "#,
        CREATED_AT_DEFAULT
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_buy_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS buy_logs (
            id TEXT PRIMARY KEY,
            user_uuid TEXT NOT NULL,
            log_type TEXT NOT NULL CHECK (log_type IN ('item', 'daily')),
            is_public INTEGER NOT NULL DEFAULT 1,
            category TEXT,
            price INTEGER,
            quantity_note TEXT,
            extra_flag INTEGER,
            comment TEXT,
            total_price INTEGER,
            days_covered INTEGER,
            extra_level TEXT,
            daily_comment TEXT,
            created_at TEXT NOT NULL DEFAULT {}
        )
        "#,
        CREATED_AT_DEFAULT
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_daily_quotes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS daily_quotes (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            item_name TEXT,
            price INTEGER,
            quantity INTEGER,
            unit TEXT,
            region_big TEXT,
            region_pref TEXT,
            region_city TEXT,
            created_at TEXT NOT NULL DEFAULT {}
        )
        "#,
        CREATED_AT_DEFAULT
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            name TEXT,
            email TEXT,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT {}
        )
        "#,
        CREATED_AT_DEFAULT
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Write defaults for missing or NULL runtime settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    for (key, value) in RuntimeSettings::default_entries() {
        ensure_setting(pool, key, &value).await?;
    }
    Ok(())
}

/// Insert `key` with `default_value` unless it already has a non-NULL value
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let current: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match current {
        Some(Some(_)) => {}
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            info!("Reset NULL setting '{}' to default: {}", key, default_value);
        }
        None => {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
        }
    }

    Ok(())
}
