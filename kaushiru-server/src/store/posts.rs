//! Price posts: writes in both column schemes, feed reads, deletion

use chrono::{DateTime, Utc};
use kaushiru_common::aggregate::PriceObservation;
use kaushiru_common::catalog::{Category, LegacyCategory};
use kaushiru_common::config::RuntimeSettings;
use kaushiru_common::db::{ColumnSet, Post};
use kaushiru_common::region::{area_group_for, RegionFilter, RegionSelection};
use kaushiru_common::time::{now, to_db_timestamp};
use kaushiru_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::{new_id, non_blank, select_list, validate_user_uuid, InsertRow};

const TABLE: &str = "posts";

/// Every column a post row may have, in table order
pub const POST_COLUMNS: &[&str] = &[
    "id",
    "user_uuid",
    "price",
    "is_tax_included",
    "item_category",
    "size_status",
    "sentiment_level",
    "comment",
    "area_group",
    "region_big",
    "region_pref",
    "region_city",
    "item_name",
    "category_new",
    "quantity",
    "unit",
    "created_at",
];

/// Columns that must exist for item-name posts
const ITEM_SCHEME_COLUMNS: &[&str] = &["item_name", "category_new"];

/// Default mood for posts converted to the legacy scheme
const NEUTRAL_SENTIMENT: i64 = 3;

/// Pack size relative to the usual one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeStatus {
    Normal,
    Less,
    Tiny,
}

impl SizeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeStatus::Normal => "normal",
            SizeStatus::Less => "less",
            SizeStatus::Tiny => "tiny",
        }
    }
}

impl fmt::Display for SizeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(SizeStatus::Normal),
            "less" => Ok(SizeStatus::Less),
            "tiny" => Ok(SizeStatus::Tiny),
            other => Err(Error::InvalidInput(format!("Unknown size_status '{}'", other))),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_size_status() -> String {
    SizeStatus::Normal.as_str().to_string()
}

/// Forecast-era post with a fixed category and mood
#[derive(Debug, Clone, Deserialize)]
pub struct NewLegacyPost {
    pub user_uuid: String,
    pub item_category: String,
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_tax_included: bool,
    #[serde(default = "default_size_status")]
    pub size_status: String,
    pub sentiment_level: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub region_big: Option<String>,
    #[serde(default)]
    pub region_pref: Option<String>,
    #[serde(default)]
    pub region_city: Option<String>,
}

/// Item-name post
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub user_uuid: String,
    pub item_name: String,
    pub price: i64,
    pub category: String,
    #[serde(default = "default_true")]
    pub is_tax_included: bool,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub region_big: Option<String>,
    #[serde(default)]
    pub region_pref: Option<String>,
    #[serde(default)]
    pub region_city: Option<String>,
}

fn region_of(big: &Option<String>, pref: &Option<String>, city: &Option<String>) -> Result<RegionSelection> {
    let region = RegionSelection::new(big.as_deref(), pref.as_deref(), city.as_deref());
    if region.big().is_none() {
        return Err(Error::InvalidInput("region_big is required".to_string()));
    }
    Ok(region)
}

fn validate_price(price: i64) -> Result<()> {
    if price <= 0 {
        return Err(Error::InvalidInput(format!("price must be positive, got {}", price)));
    }
    Ok(())
}

/// Region columns plus the legacy `area_group`
fn with_region(row: InsertRow, region: &RegionSelection, settings: &RuntimeSettings) -> InsertRow {
    row.set("region_big", region.big().map(str::to_string))
        .set("region_pref", region.prefecture().map(str::to_string))
        .set("region_city", region.city().map(str::to_string))
        .set("area_group", area_group_for(region, &settings.default_area_group))
}

/// Save a legacy post. Region columns are skipped on tables without them.
pub async fn save_legacy_post(
    pool: &SqlitePool,
    settings: &RuntimeSettings,
    input: &NewLegacyPost,
) -> Result<Post> {
    validate_user_uuid(&input.user_uuid)?;
    let category: LegacyCategory = input.item_category.parse()?;
    validate_price(input.price)?;
    let size_status: SizeStatus = input.size_status.parse()?;
    if !(1..=5).contains(&input.sentiment_level) {
        return Err(Error::InvalidInput(format!(
            "sentiment_level must be 1-5, got {}",
            input.sentiment_level
        )));
    }
    let region = region_of(&input.region_big, &input.region_pref, &input.region_city)?;

    let columns = ColumnSet::load(pool, TABLE).await?;
    let id = new_id();

    let row = InsertRow::new()
        .set("id", id.clone())
        .set("user_uuid", input.user_uuid.trim())
        .set("price", input.price)
        .set("is_tax_included", input.is_tax_included)
        .set("item_category", category.as_str())
        .set("size_status", size_status.as_str())
        .set("sentiment_level", input.sentiment_level)
        .set("comment", non_blank(input.comment.as_deref()))
        .set("created_at", to_db_timestamp(now()));
    with_region(row, &region, settings)
        .insert(pool, TABLE, &columns)
        .await?;

    info!("Saved legacy post {} ({} ¥{})", id, category, input.price);
    fetch_post(pool, &columns, &id).await
}

/// Save an item-name post.
///
/// On a table that predates `item_name`/`category_new` the post is stored
/// as a legacy row instead: mapped category, normal size, neutral mood.
pub async fn save_post(pool: &SqlitePool, settings: &RuntimeSettings, input: &NewPost) -> Result<Post> {
    validate_user_uuid(&input.user_uuid)?;
    let item_name = non_blank(Some(input.item_name.as_str()))
        .ok_or_else(|| Error::InvalidInput("item_name is required".to_string()))?;
    validate_price(input.price)?;
    let category: Category = input.category.parse()?;
    if let Some(quantity) = input.quantity {
        if quantity <= 0 {
            return Err(Error::InvalidInput(format!("quantity must be positive, got {}", quantity)));
        }
    }
    let region = region_of(&input.region_big, &input.region_pref, &input.region_city)?;

    let columns = ColumnSet::load(pool, TABLE).await?;
    let id = new_id();

    let row = InsertRow::new()
        .set("id", id.clone())
        .set("user_uuid", input.user_uuid.trim())
        .set("price", input.price)
        .set("is_tax_included", input.is_tax_included)
        .set("comment", non_blank(input.comment.as_deref()))
        .set("created_at", to_db_timestamp(now()));

    let row = if columns.has_all(ITEM_SCHEME_COLUMNS) {
        row.set("item_name", item_name.clone())
            .set("category_new", category.as_str())
            .set("quantity", input.quantity)
            .set("unit", non_blank(input.unit.as_deref()))
    } else {
        warn!(
            "posts lacks item-name columns; storing '{}' as legacy {} post",
            item_name,
            category.to_legacy()
        );
        row.set("item_category", category.to_legacy().as_str())
            .set("size_status", SizeStatus::Normal.as_str())
            .set("sentiment_level", NEUTRAL_SENTIMENT)
    };

    with_region(row, &region, settings)
        .insert(pool, TABLE, &columns)
        .await?;

    info!("Saved post {} ({} ¥{})", id, item_name, input.price);
    fetch_post(pool, &columns, &id).await
}

async fn fetch_post(pool: &SqlitePool, columns: &ColumnSet, id: &str) -> Result<Post> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        select_list(columns, POST_COLUMNS),
        TABLE
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Post {}", id)))?;
    Post::from_row(&row)
}

/// Filter usable on this table; a missing region column degrades to the
/// legacy area group.
fn usable_filter(
    columns: &ColumnSet,
    filter: RegionFilter,
    region: &RegionSelection,
    settings: &RuntimeSettings,
) -> Option<RegionFilter> {
    if columns.has(filter.column()) {
        return Some(filter);
    }

    if columns.has("area_group") {
        warn!(
            "posts.{} missing, filtering on area_group instead",
            filter.column()
        );
        Some(RegionFilter::AreaGroup(area_group_for(region, &settings.default_area_group)))
    } else {
        None
    }
}

/// Newest posts for a region, legacy default area group when none is given
pub async fn recent_posts(
    pool: &SqlitePool,
    settings: &RuntimeSettings,
    region: &RegionSelection,
) -> Result<Vec<Post>> {
    let columns = ColumnSet::load(pool, TABLE).await?;
    let filter = usable_filter(
        &columns,
        region.filter_or_area_group(&settings.default_area_group),
        region,
        settings,
    );

    let mut sql = format!("SELECT {} FROM {}", select_list(&columns, POST_COLUMNS), TABLE);
    if let Some(filter) = &filter {
        sql.push_str(&format!(" WHERE {} = ?", filter.column()));
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ?");

    let mut query = sqlx::query(&sql);
    if let Some(filter) = &filter {
        query = query.bind(filter.value());
    }
    let rows = query.bind(settings.recent_posts_limit).fetch_all(pool).await?;

    rows.iter().map(Post::from_row).collect()
}

/// The caller's newest posts; empty for a blank `user_uuid`
pub async fn my_posts(pool: &SqlitePool, settings: &RuntimeSettings, user_uuid: &str) -> Result<Vec<Post>> {
    let user_uuid = user_uuid.trim();
    if user_uuid.is_empty() {
        return Ok(Vec::new());
    }

    let columns = ColumnSet::load(pool, TABLE).await?;
    let sql = format!(
        "SELECT {} FROM {} WHERE user_uuid = ? ORDER BY created_at DESC LIMIT ?",
        select_list(&columns, POST_COLUMNS),
        TABLE
    );
    let rows = sqlx::query(&sql)
        .bind(user_uuid)
        .bind(settings.my_posts_limit)
        .fetch_all(pool)
        .await?;

    rows.iter().map(Post::from_row).collect()
}

/// Delete an own post together with its reactions
pub async fn delete_post(pool: &SqlitePool, id: &str, user_uuid: &str) -> Result<()> {
    validate_user_uuid(user_uuid)?;

    let owner: Option<String> = sqlx::query_scalar("SELECT user_uuid FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => return Err(Error::NotFound(format!("Post {}", id))),
        Some(owner) if owner != user_uuid.trim() => {
            return Err(Error::Forbidden(format!("Post {} belongs to another user", id)));
        }
        Some(_) => {}
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM reactions WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Deleted post {}", id);
    Ok(())
}

/// Which rows an aggregation reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationScope {
    /// Legacy category rows, default filter on the area group
    Category,
    /// Item-name rows, default filter on the big region
    Item,
}

/// Price rows created since `since` for a region, ready for aggregation.
///
/// Item scope yields nothing on a table without the item-name columns.
pub async fn observations_since(
    pool: &SqlitePool,
    settings: &RuntimeSettings,
    region: &RegionSelection,
    scope: ObservationScope,
    since: DateTime<Utc>,
) -> Result<Vec<PriceObservation>> {
    let columns = ColumnSet::load(pool, TABLE).await?;

    let default_filter = match scope {
        ObservationScope::Category => {
            if !columns.has("item_category") {
                return Ok(Vec::new());
            }
            region.filter_or_area_group(&settings.default_area_group)
        }
        ObservationScope::Item => {
            if !columns.has_all(ITEM_SCHEME_COLUMNS) {
                warn!("posts lacks item-name columns; item statistics are empty");
                return Ok(Vec::new());
            }
            region.filter_or_big(&settings.default_region_big)
        }
    };
    let filter = usable_filter(&columns, default_filter, region, settings);

    let mut sql = format!(
        "SELECT {} FROM {} WHERE created_at >= ?",
        select_list(&columns, POST_COLUMNS),
        TABLE
    );
    if let Some(filter) = &filter {
        sql.push_str(&format!(" AND {} = ?", filter.column()));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query = sqlx::query(&sql).bind(to_db_timestamp(since));
    if let Some(filter) = &filter {
        query = query.bind(filter.value());
    }
    let rows = query.fetch_all(pool).await?;

    rows.iter()
        .map(|row| Post::from_row(row).map(|post| post.observation()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::*;
    use chrono::{Duration, TimeZone};
    use kaushiru_common::db::prepare_schema;

    fn legacy(user: &str, category: &str, price: i64) -> NewLegacyPost {
        NewLegacyPost {
            user_uuid: user.to_string(),
            item_category: category.to_string(),
            price,
            is_tax_included: true,
            size_status: "normal".to_string(),
            sentiment_level: 3,
            comment: None,
            region_big: Some("中部".to_string()),
            region_pref: Some("愛知県".to_string()),
            region_city: Some("名古屋市".to_string()),
        }
    }

    fn item(name: &str, price: i64, unit: Option<&str>) -> NewPost {
        NewPost {
            user_uuid: USER_A.to_string(),
            item_name: name.to_string(),
            price,
            category: "野菜".to_string(),
            is_tax_included: true,
            quantity: Some(1),
            unit: unit.map(str::to_string),
            comment: Some("  安い！ ".to_string()),
            region_big: Some("中部".to_string()),
            region_pref: None,
            region_city: None,
        }
    }

    #[tokio::test]
    async fn test_save_legacy_post_writes_area_group() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();

        let post = save_legacy_post(&pool, &settings, &legacy(USER_A, "卵", 248)).await.unwrap();
        assert_eq!(post.area_group.as_deref(), Some("名古屋市"));
        assert_eq!(post.item_category.as_deref(), Some("卵"));
        assert_eq!(post.size_status.as_deref(), Some("normal"));
        assert_eq!(post.region_display, "📍 中部／愛知県／名古屋市");
    }

    #[tokio::test]
    async fn test_save_legacy_post_validation() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();

        let mut bad = legacy(USER_A, "お菓子", 100);
        assert!(matches!(save_legacy_post(&pool, &settings, &bad).await, Err(Error::InvalidInput(_))));

        bad = legacy(USER_A, "卵", 0);
        assert!(matches!(save_legacy_post(&pool, &settings, &bad).await, Err(Error::InvalidInput(_))));

        bad = legacy(USER_A, "卵", 100);
        bad.sentiment_level = 6;
        assert!(matches!(save_legacy_post(&pool, &settings, &bad).await, Err(Error::InvalidInput(_))));

        bad = legacy(USER_A, "卵", 100);
        bad.region_big = Some(" ".to_string());
        assert!(matches!(save_legacy_post(&pool, &settings, &bad).await, Err(Error::InvalidInput(_))));

        bad = legacy("nobody", "卵", 100);
        assert!(matches!(save_legacy_post(&pool, &settings, &bad).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_save_post_item_scheme() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();

        let post = save_post(&pool, &settings, &item("キャベツ", 198, Some("個"))).await.unwrap();
        assert_eq!(post.item_name.as_deref(), Some("キャベツ"));
        assert_eq!(post.category_new.as_deref(), Some("野菜"));
        assert_eq!(post.unit.as_deref(), Some("個"));
        assert_eq!(post.comment.as_deref(), Some("安い！"));
        assert_eq!(post.area_group.as_deref(), Some("中部"));
        assert_eq!(post.item_category, None);
    }

    #[tokio::test]
    async fn test_save_post_falls_back_to_legacy_table() {
        let pool = bare_memory_db().await;
        sqlx::query(
            r#"
            CREATE TABLE posts (
                id TEXT PRIMARY KEY, user_uuid TEXT NOT NULL, price INTEGER NOT NULL,
                is_tax_included INTEGER NOT NULL DEFAULT 1, item_category TEXT,
                size_status TEXT, sentiment_level INTEGER, comment TEXT,
                area_group TEXT, created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        let settings = RuntimeSettings::default();

        let mut input = item("鮭", 300, Some("切れ"));
        input.category = "魚".to_string();
        input.is_tax_included = false;
        let post = save_post(&pool, &settings, &input).await.unwrap();

        assert_eq!(post.item_category.as_deref(), Some("その他"));
        assert_eq!(post.size_status.as_deref(), Some("normal"));
        assert_eq!(post.sentiment_level, Some(3));
        assert!(!post.is_tax_included);
        assert_eq!(post.item_name, None);
        assert_eq!(post.region_display, "");
    }

    #[tokio::test]
    async fn test_recent_posts_filters_and_limits() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();

        for price in [100, 200, 300, 400] {
            save_legacy_post(&pool, &settings, &legacy(USER_A, "卵", price)).await.unwrap();
        }
        let mut elsewhere = legacy(USER_B, "牛乳", 180);
        elsewhere.region_big = Some("関東".to_string());
        elsewhere.region_pref = Some("東京都".to_string());
        elsewhere.region_city = None;
        save_legacy_post(&pool, &settings, &elsewhere).await.unwrap();

        let nagoya = RegionSelection::new(Some("中部"), Some("愛知県"), Some("名古屋市"));
        let posts = recent_posts(&pool, &settings, &nagoya).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|p| p.region_city.as_deref() == Some("名古屋市")));

        let tokyo = RegionSelection::new(None, Some("東京都"), None);
        let posts = recent_posts(&pool, &settings, &tokyo).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].price, 180);

        // nothing was posted under the default area group
        let posts = recent_posts(&pool, &settings, &RegionSelection::default()).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_my_posts() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();
        save_legacy_post(&pool, &settings, &legacy(USER_A, "卵", 100)).await.unwrap();
        save_legacy_post(&pool, &settings, &legacy(USER_B, "卵", 200)).await.unwrap();

        let mine = my_posts(&pool, &settings, USER_A).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].price, 100);
        assert!(my_posts(&pool, &settings, "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_post_ownership() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();
        let post = save_legacy_post(&pool, &settings, &legacy(USER_A, "卵", 100)).await.unwrap();
        sqlx::query("INSERT INTO reactions (id, post_id, user_uuid) VALUES ('r1', ?, ?)")
            .bind(&post.id)
            .bind(USER_B)
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(delete_post(&pool, &post.id, "").await, Err(Error::InvalidInput(_))));
        assert!(matches!(delete_post(&pool, &post.id, "  ").await, Err(Error::InvalidInput(_))));
        assert!(matches!(delete_post(&pool, "missing", USER_A).await, Err(Error::NotFound(_))));
        assert!(matches!(delete_post(&pool, &post.id, USER_B).await, Err(Error::Forbidden(_))));

        delete_post(&pool, &post.id, USER_A).await.unwrap();
        let reactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reactions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(reactions, 0);
    }

    #[tokio::test]
    async fn test_observations_scope_and_window() {
        let pool = memory_db().await;
        let settings = RuntimeSettings::default();
        save_legacy_post(&pool, &settings, &legacy(USER_A, "卵", 100)).await.unwrap();
        save_post(&pool, &settings, &item("キャベツ", 198, Some("個"))).await.unwrap();

        let old = to_db_timestamp(now() - Duration::days(40));
        sqlx::query(
            "INSERT INTO posts (id, user_uuid, price, item_name, category_new, region_big, created_at) \
             VALUES ('old', ?, 50, 'キャベツ', '野菜', '中部', ?)",
        )
        .bind(USER_A)
        .bind(&old)
        .execute(&pool)
        .await
        .unwrap();

        let since = now() - Duration::days(30);
        let items = observations_since(&pool, &settings, &RegionSelection::default(), ObservationScope::Item, since)
            .await
            .unwrap();
        // default big region 中部 matches both recent posts; the 40-day-old row is outside
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|o| o.price != 50));

        let nagoya = RegionSelection::new(None, None, Some("名古屋市"));
        let legacy_rows =
            observations_since(&pool, &settings, &nagoya, ObservationScope::Category, since)
                .await
                .unwrap();
        assert_eq!(legacy_rows.len(), 1);
        assert_eq!(legacy_rows[0].item_category.as_deref(), Some("卵"));
    }

    #[tokio::test]
    async fn test_region_columns_missing_fall_back_to_area_group() {
        let pool = bare_memory_db().await;
        sqlx::query(
            r#"
            CREATE TABLE posts (
                id TEXT PRIMARY KEY, user_uuid TEXT NOT NULL, price INTEGER NOT NULL,
                is_tax_included INTEGER NOT NULL DEFAULT 1, item_category TEXT,
                comment TEXT, area_group TEXT, region_big TEXT,
                item_name TEXT, category_new TEXT, quantity INTEGER, unit TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        let settings = RuntimeSettings::default();

        let mut nagoya_post = item("キャベツ", 198, Some("個"));
        nagoya_post.region_pref = Some("愛知県".to_string());
        nagoya_post.region_city = Some("名古屋市".to_string());
        save_post(&pool, &settings, &nagoya_post).await.unwrap();
        save_post(&pool, &settings, &item("キャベツ", 250, Some("個"))).await.unwrap();

        let nagoya = RegionSelection::new(Some("中部"), Some("愛知県"), Some("名古屋市"));
        let posts = recent_posts(&pool, &settings, &nagoya).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].price, 198);
        assert_eq!(posts[0].area_group.as_deref(), Some("名古屋市"));
        assert_eq!(posts[0].region_city, None);

        let since = now() - Duration::days(1);
        let rows = observations_since(&pool, &settings, &nagoya, ObservationScope::Item, since)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, 198);

        // region_big exists, so a big-only selection still filters on it
        let chubu = RegionSelection::new(Some("中部"), None, None);
        let rows = observations_since(&pool, &settings, &chubu, ObservationScope::Item, since)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_timestamp_on_window_boundary_day() {
        let pool = bare_memory_db().await;
        sqlx::query(
            r#"
            CREATE TABLE posts (
                id TEXT PRIMARY KEY, user_uuid TEXT NOT NULL, price INTEGER NOT NULL,
                is_tax_included INTEGER NOT NULL DEFAULT 1, item_category TEXT,
                size_status TEXT, sentiment_level INTEGER, comment TEXT,
                area_group TEXT, created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO posts (id, user_uuid, price, item_category, area_group, created_at) \
             VALUES ('noon', ?, 230, '肉', '愛知西部', '2024-05-01 12:00:00')",
        )
        .bind(USER_A)
        .execute(&pool)
        .await
        .unwrap();

        prepare_schema(&pool).await.unwrap();
        let settings = RuntimeSettings::default();
        let everywhere = RegionSelection::default();

        let since = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let rows = observations_since(&pool, &settings, &everywhere, ObservationScope::Category, since)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_at, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        let since = Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap();
        let rows = observations_since(&pool, &settings, &everywhere, ObservationScope::Category, since)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
