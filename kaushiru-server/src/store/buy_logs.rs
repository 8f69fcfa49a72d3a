//! Purchase logs and the public feed
//!
//! A non-blank comment on either kind of log is also copied into the
//! quote-of-the-day table; that copy never fails the save.

use kaushiru_common::config::RuntimeSettings;
use kaushiru_common::db::{BuyLog, ColumnSet, PublicBuyLog};
use kaushiru_common::time::{now, to_db_timestamp};
use kaushiru_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::quotes::{insert_quote_best_effort, parse_quantity_note, NewQuote};
use super::{new_id, non_blank, select_list, validate_user_uuid, InsertRow};

const TABLE: &str = "buy_logs";

const BUY_LOG_COLUMNS: &[&str] = &[
    "id",
    "user_uuid",
    "log_type",
    "is_public",
    "category",
    "price",
    "quantity_note",
    "extra_flag",
    "comment",
    "total_price",
    "days_covered",
    "extra_level",
    "daily_comment",
    "created_at",
];

/// Unit recorded for the day count of a daily log
const DAYS_UNIT: &str = "日分";

const EXTRA_LEVELS: &[&str] = &["yes", "maybe", "no"];

fn default_true() -> bool {
    true
}

/// Single-item memo
#[derive(Debug, Clone, Deserialize)]
pub struct NewItemLog {
    pub user_uuid: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub quantity_note: Option<String>,
    #[serde(default)]
    pub extra_flag: Option<bool>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

/// Summary of a whole shopping trip
#[derive(Debug, Clone, Deserialize)]
pub struct NewDailyLog {
    pub user_uuid: String,
    #[serde(default)]
    pub total_price: Option<i64>,
    #[serde(default)]
    pub days_covered: Option<i64>,
    /// `yes`, `maybe` or `no`
    #[serde(default)]
    pub extra_level: Option<String>,
    #[serde(default)]
    pub daily_comment: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn check_positive(field: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(v) if v <= 0 => Err(Error::InvalidInput(format!("{} must be positive, got {}", field, v))),
        _ => Ok(()),
    }
}

pub async fn save_item_log(pool: &SqlitePool, settings: &RuntimeSettings, input: &NewItemLog) -> Result<String> {
    validate_user_uuid(&input.user_uuid)?;
    check_positive("price", input.price)?;

    let category = non_blank(input.category.as_deref());
    let quantity_note = non_blank(input.quantity_note.as_deref());
    let created_at = now();
    let id = new_id();

    let columns = ColumnSet::load(pool, TABLE).await?;
    InsertRow::new()
        .set("id", id.clone())
        .set("user_uuid", input.user_uuid.trim())
        .set("log_type", "item")
        .set("is_public", input.is_public)
        .set("category", category.clone())
        .set("price", input.price)
        .set("quantity_note", quantity_note.clone())
        .set("extra_flag", input.extra_flag)
        .set("comment", non_blank(input.comment.as_deref()))
        .set("created_at", to_db_timestamp(created_at))
        .insert(pool, TABLE, &columns)
        .await?;
    info!("Saved item buy log {}", id);

    if let Some(mut quote) = NewQuote::from_comment(input.comment.as_deref(), settings.quote_max_chars) {
        quote.price = input.price;
        quote.item_name = category;
        if let Some(note) = &quantity_note {
            let (quantity, unit) = parse_quantity_note(note);
            quote.quantity = quantity;
            quote.unit = unit;
        }
        insert_quote_best_effort(pool, &quote, created_at).await;
    }

    Ok(id)
}

pub async fn save_daily_log(pool: &SqlitePool, settings: &RuntimeSettings, input: &NewDailyLog) -> Result<String> {
    validate_user_uuid(&input.user_uuid)?;
    check_positive("total_price", input.total_price)?;
    check_positive("days_covered", input.days_covered)?;

    let extra_level = non_blank(input.extra_level.as_deref());
    if let Some(level) = &extra_level {
        if !EXTRA_LEVELS.contains(&level.as_str()) {
            return Err(Error::InvalidInput(format!("Unknown extra_level '{}'", level)));
        }
    }

    let created_at = now();
    let id = new_id();

    let columns = ColumnSet::load(pool, TABLE).await?;
    InsertRow::new()
        .set("id", id.clone())
        .set("user_uuid", input.user_uuid.trim())
        .set("log_type", "daily")
        .set("is_public", input.is_public)
        .set("total_price", input.total_price)
        .set("days_covered", input.days_covered)
        .set("extra_level", extra_level)
        .set("daily_comment", non_blank(input.daily_comment.as_deref()))
        .set("created_at", to_db_timestamp(created_at))
        .insert(pool, TABLE, &columns)
        .await?;
    info!("Saved daily buy log {}", id);

    if let Some(mut quote) = NewQuote::from_comment(input.daily_comment.as_deref(), settings.quote_max_chars) {
        quote.price = input.total_price;
        if let Some(days) = input.days_covered {
            quote.quantity = Some(days);
            quote.unit = Some(DAYS_UNIT.to_string());
        }
        insert_quote_best_effort(pool, &quote, created_at).await;
    }

    Ok(id)
}

/// Newest public logs with a relative time label
pub async fn public_buy_logs(pool: &SqlitePool, settings: &RuntimeSettings) -> Result<Vec<PublicBuyLog>> {
    let columns = ColumnSet::load(pool, TABLE).await?;
    if !columns.table_exists() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {} FROM {} WHERE is_public = 1 ORDER BY created_at DESC LIMIT ?",
        select_list(&columns, BUY_LOG_COLUMNS),
        TABLE
    );
    let rows = sqlx::query(&sql)
        .bind(settings.public_buy_logs_limit)
        .fetch_all(pool)
        .await?;

    let now = now();
    rows.iter()
        .map(|row| BuyLog::from_row(row).map(|log| PublicBuyLog::new(log, now)))
        .collect()
}
