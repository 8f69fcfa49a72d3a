//! Data access over the SQLite pool
//!
//! Writers build their column list at runtime and drop the columns the live
//! table does not have, so an older database keeps accepting writes.

pub mod buy_logs;
pub mod contacts;
pub mod posts;
pub mod quotes;
pub mod reactions;

use kaushiru_common::db::ColumnSet;
use kaushiru_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Bindable column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Bool(Option<bool>),
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(Some(v))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(v: Option<i64>) -> Self {
        SqlValue::Int(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(Some(v))
    }
}

impl From<Option<bool>> for SqlValue {
    fn from(v: Option<bool>) -> Self {
        SqlValue::Bool(v)
    }
}

/// Column/value pairs for a single-row insert
#[derive(Debug, Clone, Default)]
pub struct InsertRow {
    values: Vec<(&'static str, SqlValue)>,
}

impl InsertRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    /// Insert into `table`, skipping columns missing from `present`.
    pub async fn insert(self, pool: &SqlitePool, table: &str, present: &ColumnSet) -> Result<()> {
        let kept: Vec<(&'static str, SqlValue)> = self
            .values
            .into_iter()
            .filter(|(column, _)| {
                let has = present.has(column);
                if !has {
                    debug!("{}.{} missing, value dropped", table, column);
                }
                has
            })
            .collect();

        if kept.is_empty() {
            return Err(Error::Internal(format!("No insertable columns in {}", table)));
        }

        let columns: Vec<&str> = kept.iter().map(|(c, _)| *c).collect();
        let placeholders = vec!["?"; kept.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in kept {
            query = match value {
                SqlValue::Text(v) => query.bind(v),
                SqlValue::Int(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
            };
        }

        query.execute(pool).await?;
        Ok(())
    }
}

/// Comma-separated SELECT list of the wanted columns the table has
pub fn select_list(present: &ColumnSet, wanted: &[&str]) -> String {
    present.retain_present(wanted).join(", ")
}

/// Reject anything that is not a UUID
pub fn validate_user_uuid(user_uuid: &str) -> Result<()> {
    Uuid::parse_str(user_uuid.trim())
        .map(|_| ())
        .map_err(|_| Error::InvalidInput(format!("user_uuid is not a valid UUID: '{}'", user_uuid)))
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trimmed value, `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod test_support {
    use kaushiru_common::db::prepare_schema;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    pub const USER_A: &str = "11111111-1111-4111-8111-111111111111";
    pub const USER_B: &str = "22222222-2222-4222-8222-222222222222";

    /// Fully initialized in-memory database
    pub async fn memory_db() -> SqlitePool {
        let pool = bare_memory_db().await;
        prepare_schema(&pool).await.unwrap();
        pool
    }

    /// In-memory database without any tables
    pub async fn bare_memory_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }
}
