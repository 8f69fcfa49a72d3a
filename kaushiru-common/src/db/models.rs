//! Row models
//!
//! Readers select only the columns a table actually has (see
//! [`crate::db::schema_sync::ColumnSet`]), so optional columns are mapped
//! with [`optional_column`], which treats an absent column like NULL.

use crate::aggregate::PriceObservation;
use crate::region::format_region_display;
use crate::time::{parse_db_timestamp, relative_label};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Decode, Row, Sqlite, Type};

/// Value of `column`, or `None` when it is NULL or not selected.
pub fn optional_column<'r, T>(row: &'r SqliteRow, column: &str) -> Result<Option<T>>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    match row.try_get::<Option<T>, _>(column) {
        Ok(value) => Ok(value),
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn created_at(row: &SqliteRow) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get("created_at")?;
    parse_db_timestamp(&raw)
        .ok_or_else(|| Error::Internal(format!("Unparsable created_at '{}'", raw)))
}

/// A price post, legacy or item-name scheme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub user_uuid: String,
    pub price: i64,
    pub is_tax_included: bool,
    pub item_category: Option<String>,
    pub size_status: Option<String>,
    pub sentiment_level: Option<i64>,
    pub comment: Option<String>,
    pub area_group: Option<String>,
    pub region_big: Option<String>,
    pub region_pref: Option<String>,
    pub region_city: Option<String>,
    pub item_name: Option<String>,
    pub category_new: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `📍 big／pref／city`, empty when the post has no region
    pub region_display: String,
}

impl Post {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let region_big: Option<String> = optional_column(row, "region_big")?;
        let region_pref: Option<String> = optional_column(row, "region_pref")?;
        let region_city: Option<String> = optional_column(row, "region_city")?;
        let region_display = format_region_display(
            region_big.as_deref(),
            region_pref.as_deref(),
            region_city.as_deref(),
        );

        Ok(Self {
            id: row.try_get("id")?,
            user_uuid: row.try_get("user_uuid")?,
            price: row.try_get("price")?,
            is_tax_included: optional_column::<bool>(row, "is_tax_included")?.unwrap_or(true),
            item_category: optional_column(row, "item_category")?,
            size_status: optional_column(row, "size_status")?,
            sentiment_level: optional_column(row, "sentiment_level")?,
            comment: optional_column(row, "comment")?,
            area_group: optional_column(row, "area_group")?,
            region_big,
            region_pref,
            region_city,
            item_name: optional_column(row, "item_name")?,
            category_new: optional_column(row, "category_new")?,
            quantity: optional_column(row, "quantity")?,
            unit: optional_column(row, "unit")?,
            created_at: created_at(row)?,
            region_display,
        })
    }

    pub fn observation(&self) -> PriceObservation {
        PriceObservation {
            item_category: self.item_category.clone(),
            item_name: self.item_name.clone(),
            unit: self.unit.clone(),
            price: self.price,
            is_tax_included: self.is_tax_included,
            created_at: self.created_at,
            region_big: self.region_big.clone(),
            region_pref: self.region_pref.clone(),
            region_city: self.region_city.clone(),
        }
    }
}

/// Purchase log entry, `item` or `daily`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyLog {
    pub id: String,
    pub user_uuid: String,
    pub log_type: String,
    pub is_public: bool,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub quantity_note: Option<String>,
    pub extra_flag: Option<bool>,
    pub comment: Option<String>,
    pub total_price: Option<i64>,
    pub days_covered: Option<i64>,
    pub extra_level: Option<String>,
    pub daily_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BuyLog {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_uuid: row.try_get("user_uuid")?,
            log_type: row.try_get("log_type")?,
            is_public: optional_column::<bool>(row, "is_public")?.unwrap_or(true),
            category: optional_column(row, "category")?,
            price: optional_column(row, "price")?,
            quantity_note: optional_column(row, "quantity_note")?,
            extra_flag: optional_column(row, "extra_flag")?,
            comment: optional_column(row, "comment")?,
            total_price: optional_column(row, "total_price")?,
            days_covered: optional_column(row, "days_covered")?,
            extra_level: optional_column(row, "extra_level")?,
            daily_comment: optional_column(row, "daily_comment")?,
            created_at: created_at(row)?,
        })
    }
}

/// Buy log as shown in the public feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicBuyLog {
    #[serde(flatten)]
    pub log: BuyLog,
    /// `たった今`, `5分前`, `3/14`
    pub time_label: String,
}

impl PublicBuyLog {
    pub fn new(log: BuyLog, now: DateTime<Utc>) -> Self {
        let time_label = relative_label(log.created_at, now);
        Self { log, time_label }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyQuote {
    pub id: String,
    pub content: String,
    pub item_name: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub region_big: Option<String>,
    pub region_pref: Option<String>,
    pub region_city: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DailyQuote {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            item_name: optional_column(row, "item_name")?,
            price: optional_column(row, "price")?,
            quantity: optional_column(row, "quantity")?,
            unit: optional_column(row, "unit")?,
            region_big: optional_column(row, "region_big")?,
            region_pref: optional_column(row, "region_pref")?,
            region_city: optional_column(row, "region_city")?,
            created_at: created_at(row)?,
        })
    }
}
