//! Versioned data migrations
//!
//! Column additions are handled by schema sync before this runs; the
//! migrations here move data between the old and new column schemes.
//! Every step is idempotent so a partially applied run can be repeated.
//!
//! Never modify an existing migration. Add a new `migrate_vN` and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::db::schema_sync::ColumnSet;
use crate::region::classify_area_group;
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Increment when adding a migration
pub const CURRENT_SCHEMA_VERSION: i32 = 4;

/// Latest applied version, 0 for a fresh database
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
            "Database schema version ({}) is newer than code version ({})",
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
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    if current_version < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
        info!("✓ Migration v3 completed");
    }

    if current_version < 4 {
        migrate_v4(pool).await?;
        set_schema_version(pool, 4).await?;
        info!("✓ Migration v4 completed");
    }

    Ok(())
}

/// Migration v1: derive region columns from `area_group`
///
/// Posts written before the region hierarchy only carry `area_group`.
/// Rows with no region level get `region_big` (and `region_pref` when the
/// area group names a prefecture). Unrecognized area groups are left alone.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: backfill region columns from area_group");

    let columns = ColumnSet::load(pool, "posts").await?;
    if !columns.has_all(&["area_group", "region_big", "region_pref", "region_city"]) {
        info!("  posts lacks region columns - skipping");
        return Ok(());
    }

    let groups: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT area_group FROM posts
        WHERE area_group IS NOT NULL AND area_group <> ''
          AND COALESCE(region_big, '') = ''
          AND COALESCE(region_pref, '') = ''
          AND COALESCE(region_city, '') = ''
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut updated = 0u64;
    for group in groups {
        let selection = classify_area_group(&group);
        let Some(big) = selection.big() else {
            warn!("  Unrecognized area_group '{}' - rows left without region", group);
            continue;
        };

        let result = sqlx::query(
            r#"
            UPDATE posts SET region_big = ?, region_pref = ?
            WHERE area_group = ?
              AND COALESCE(region_big, '') = ''
              AND COALESCE(region_pref, '') = ''
              AND COALESCE(region_city, '') = ''
            "#,
        )
        .bind(big)
        .bind(selection.prefecture())
        .bind(&group)
        .execute(pool)
        .await?;
        updated += result.rows_affected();
    }

    info!("  ✓ Backfilled region for {} post(s)", updated);
    Ok(())
}

/// Migration v2: fill `category_new` from the legacy `item_category`
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: backfill category_new from item_category");

    let columns = ColumnSet::load(pool, "posts").await?;
    if !columns.has_all(&["item_category", "category_new"]) {
        info!("  posts lacks category columns - skipping");
        return Ok(());
    }

    let result = sqlx::query(
        r#"
        UPDATE posts
        SET category_new = CASE item_category
            WHEN '肉' THEN '肉'
            WHEN '野菜' THEN '野菜'
            ELSE 'その他'
        END
        WHERE category_new IS NULL AND item_category IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    info!("  ✓ Backfilled category_new for {} post(s)", result.rows_affected());
    Ok(())
}

/// Migration v3: one reaction per user and post
///
/// Duplicates from before the index existed are collapsed first, keeping
/// the earliest row.
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v3: unique index on reactions(post_id, user_uuid)");

    let columns = ColumnSet::load(pool, "reactions").await?;
    if !columns.has_all(&["post_id", "user_uuid"]) {
        info!("  reactions table incomplete - skipping");
        return Ok(());
    }

    let removed = sqlx::query(
        r#"
        DELETE FROM reactions
        WHERE rowid NOT IN (
            SELECT MIN(rowid) FROM reactions GROUP BY post_id, user_uuid
        )
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    if removed > 0 {
        info!("  Removed {} duplicate reaction(s)", removed);
    }

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_reactions_post_user ON reactions(post_id, user_uuid)",
    )
    .execute(pool)
    .await?;

    info!("  ✓ Created idx_reactions_post_user");
    Ok(())
}

/// Tables whose `created_at` is compared as text
const TIMESTAMPED_TABLES: &[&str] = &["posts", "reactions", "buy_logs", "daily_quotes", "contacts"];

/// Migration v4: rewrite `created_at` to the fixed-width UTC form
///
/// Rows written through `DEFAULT CURRENT_TIMESTAMP` hold
/// `YYYY-MM-DD HH:MM:SS`, which sorts before any `...T...Z` bound of the
/// same day. Values SQLite cannot parse are left untouched.
async fn migrate_v4(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v4: normalize created_at timestamps");

    for table in TIMESTAMPED_TABLES {
        let columns = ColumnSet::load(pool, table).await?;
        if !columns.has("created_at") {
            continue;
        }

        let sql = format!(
            r#"
            UPDATE {table}
            SET created_at = strftime('%Y-%m-%dT%H:%M:%fZ', created_at)
            WHERE created_at IS NOT NULL
              AND created_at NOT GLOB '{pattern}'
              AND strftime('%Y-%m-%dT%H:%M:%fZ', created_at) IS NOT NULL
            "#,
            table = table,
            pattern = FIXED_WIDTH_GLOB,
        );
        let result = sqlx::query(&sql).execute(pool).await?;
        if result.rows_affected() > 0 {
            info!("  ✓ Normalized {} {} timestamp(s)", result.rows_affected(), table);
        }
    }

    Ok(())
}

/// `2024-05-01T03:04:05.678Z`
const FIXED_WIDTH_GLOB: &str =
    "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]T[0-9][0-9]:[0-9][0-9]:[0-9][0-9].[0-9][0-9][0-9]Z";
