//! Quote of the day: short comments copied from buy logs

use chrono::{DateTime, Utc};
use kaushiru_common::db::{ColumnSet, DailyQuote};
use kaushiru_common::region::RegionSelection;
use kaushiru_common::time::{jst_day_bounds, to_db_timestamp};
use kaushiru_common::Result;
use rand::seq::SliceRandom;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::{new_id, select_list, InsertRow};

const TABLE: &str = "daily_quotes";

const QUOTE_COLUMNS: &[&str] = &[
    "id",
    "content",
    "item_name",
    "price",
    "quantity",
    "unit",
    "region_big",
    "region_pref",
    "region_city",
    "created_at",
];

/// Quote row to insert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewQuote {
    pub content: String,
    pub item_name: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
}

impl NewQuote {
    /// Quote from a comment: trimmed and cut to `max_chars` characters.
    /// `None` for a blank comment.
    pub fn from_comment(comment: Option<&str>, max_chars: usize) -> Option<Self> {
        let trimmed = comment.map(str::trim).filter(|c| !c.is_empty())?;
        Some(Self {
            content: trimmed.chars().take(max_chars).collect(),
            ..Self::default()
        })
    }
}

/// Leading integer and the rest of a note: `300g` → (300, g), `1 パック` → (1, パック).
/// Without a leading integer nothing is extracted.
pub fn parse_quantity_note(note: &str) -> (Option<i64>, Option<String>) {
    let note = note.trim();
    let digits_end = note
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(note.len());

    let Ok(quantity) = note[..digits_end].parse::<i64>() else {
        return (None, None);
    };

    let unit = note[digits_end..].trim();
    let unit = (!unit.is_empty()).then(|| unit.to_string());
    (Some(quantity), unit)
}

pub async fn insert_quote(pool: &SqlitePool, quote: &NewQuote, created_at: DateTime<Utc>) -> Result<String> {
    let columns = ColumnSet::load(pool, TABLE).await?;
    let id = new_id();

    InsertRow::new()
        .set("id", id.clone())
        .set("content", quote.content.clone())
        .set("item_name", quote.item_name.clone())
        .set("price", quote.price)
        .set("quantity", quote.quantity)
        .set("unit", quote.unit.clone())
        .set("created_at", to_db_timestamp(created_at))
        .insert(pool, TABLE, &columns)
        .await?;

    debug!("Saved daily quote {}", id);
    Ok(id)
}

/// Insert a quote, logging instead of failing
pub async fn insert_quote_best_effort(pool: &SqlitePool, quote: &NewQuote, created_at: DateTime<Utc>) {
    if let Err(e) = insert_quote(pool, quote, created_at).await {
        warn!("Skipping daily quote: {}", e);
    }
}

/// A random quote written during the current JST day.
///
/// The region filter applies only when a region is given and the table has
/// the matching column.
pub async fn today_quote(
    pool: &SqlitePool,
    region: &RegionSelection,
    now: DateTime<Utc>,
) -> Result<Option<DailyQuote>> {
    let columns = ColumnSet::load(pool, TABLE).await?;
    if !columns.table_exists() {
        return Ok(None);
    }

    let (start, end) = jst_day_bounds(now);
    let filter = region
        .most_specific()
        .filter(|f| columns.has(f.column()));

    let mut sql = format!(
        "SELECT {} FROM {} WHERE created_at >= ? AND created_at < ?",
        select_list(&columns, QUOTE_COLUMNS),
        TABLE
    );
    if let Some(filter) = &filter {
        sql.push_str(&format!(" AND {} = ?", filter.column()));
    }

    let mut query = sqlx::query(&sql)
        .bind(to_db_timestamp(start))
        .bind(to_db_timestamp(end));
    if let Some(filter) = &filter {
        query = query.bind(filter.value());
    }
    let rows = query.fetch_all(pool).await?;

    let Some(row) = rows.choose(&mut rand::thread_rng()) else {
        return Ok(None);
    };
    DailyQuote::from_row(row).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::*;
    use chrono::{Duration, TimeZone};
    use kaushiru_common::db::prepare_schema;

    #[test]
    fn test_parse_quantity_note() {
        assert_eq!(parse_quantity_note("300g"), (Some(300), Some("g".to_string())));
        assert_eq!(parse_quantity_note("1 パック"), (Some(1), Some("パック".to_string())));
        assert_eq!(parse_quantity_note("12"), (Some(12), None));
        assert_eq!(parse_quantity_note("約300g"), (None, None));
        assert_eq!(parse_quantity_note(""), (None, None));
    }

    #[test]
    fn test_quote_from_comment() {
        let quote = NewQuote::from_comment(Some("  今日はキャベツが安かった！また行きたいお店です  "), 20).unwrap();
        assert_eq!(quote.content.chars().count(), 20);
        assert!(quote.content.starts_with("今日は"));

        assert!(NewQuote::from_comment(Some("   "), 20).is_none());
        assert!(NewQuote::from_comment(None, 20).is_none());
    }

    #[tokio::test]
    async fn test_today_quote_uses_jst_day() {
        let pool = memory_db().await;
        // 2024-05-01 10:00 JST
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();

        let today = NewQuote { content: "今日".into(), ..NewQuote::default() };
        let yesterday = NewQuote { content: "昨日".into(), ..NewQuote::default() };
        // 00:30 JST today is 15:30 UTC the previous day
        insert_quote(&pool, &today, now - Duration::minutes(9 * 60 + 30)).await.unwrap();
        insert_quote(&pool, &yesterday, now - Duration::hours(11)).await.unwrap();

        let quote = today_quote(&pool, &RegionSelection::default(), now).await.unwrap().unwrap();
        assert_eq!(quote.content, "今日");

        let tomorrow = now + Duration::days(1);
        assert!(today_quote(&pool, &RegionSelection::default(), tomorrow).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_today_quote_region_filter() {
        let pool = memory_db().await;
        let now = kaushiru_common::time::now();
        insert_quote(&pool, &NewQuote { content: "どこか".into(), ..NewQuote::default() }, now)
            .await
            .unwrap();
        sqlx::query("UPDATE daily_quotes SET region_big = '関東'")
            .execute(&pool)
            .await
            .unwrap();

        let kanto = RegionSelection::new(Some("関東"), None, None);
        assert!(today_quote(&pool, &kanto, now).await.unwrap().is_some());

        let chubu = RegionSelection::new(Some("中部"), None, None);
        assert!(today_quote(&pool, &chubu, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_today_quote_without_table() {
        let pool = bare_memory_db().await;
        let now = kaushiru_common::time::now();
        assert!(today_quote(&pool, &RegionSelection::default(), now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_timestamps_respect_jst_day() {
        let pool = bare_memory_db().await;
        sqlx::query(
            r#"
            CREATE TABLE daily_quotes (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        // 23:00 JST on 05-01 and 01:00 JST on 05-02
        sqlx::query(
            r#"
            INSERT INTO daily_quotes (id, content, created_at) VALUES
                ('late', '今日', '2024-05-01 14:00:00'),
                ('next', '明日', '2024-05-01 16:00:00')
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        prepare_schema(&pool).await.unwrap();

        // 2024-05-01 10:00 JST
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();
        for _ in 0..5 {
            let quote = today_quote(&pool, &RegionSelection::default(), now).await.unwrap().unwrap();
            assert_eq!(quote.content, "今日");
        }

        let next_day = Utc.with_ymd_and_hms(2024, 5, 1, 16, 30, 0).unwrap();
        let quote = today_quote(&pool, &RegionSelection::default(), next_day).await.unwrap().unwrap();
        assert_eq!(quote.content, "明日");
    }
}
