//! Declarative schema synchronization
//!
//! The tables in this service were migrated by hand for a long time, so an
//! existing database may lack columns the code expects. Each table declares
//! its expected columns (see [`crate::db::table_schemas`]); at startup the
//! missing ones are added with `ALTER TABLE ... ADD COLUMN`.
//!
//! Initialization order:
//! 1. `CREATE TABLE IF NOT EXISTS`
//! 2. column sync (this module)
//! 3. versioned migrations ([`crate::db::migrations`])
//!
//! Type and constraint differences are reported, never rewritten.
//!
//! Readers and writers that must tolerate a database which has not been
//! synced yet use [`ColumnSet`] to ask which columns are present.

use crate::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Expected column with the constraints SQLite can express
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (`TEXT`, `INTEGER`, `REAL`)
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    /// SQL literal or expression, inserted verbatim after `DEFAULT`
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column clause for `ALTER TABLE ADD COLUMN`.
    ///
    /// SQLite cannot add a PRIMARY KEY column, and NOT NULL only together
    /// with a DEFAULT; those parts are dropped with a warning.
    fn add_column_clause(&self, table: &str) -> String {
        let mut clause = format!("{} {}", self.name, self.sql_type);

        if self.primary_key {
            warn!(
                "  Cannot add PRIMARY KEY column {}.{} via ALTER TABLE; adding it as a plain column",
                table, self.name
            );
        }

        match (&self.default_value, self.not_null) {
            (Some(default), true) => clause.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => clause.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => warn!(
                "  Cannot add NOT NULL column {}.{} without DEFAULT; adding it as nullable",
                table, self.name
            ),
            (None, false) => {}
        }

        clause
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between declared and actual schema
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
}

/// Declared schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Reads the live schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Columns of `table_name` ordered by position; empty when the table is missing
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
            .fetch_all(pool)
            .await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i32, _>("pk") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);
        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Names of the columns a table currently has
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    table: String,
    columns: HashSet<String>,
}

impl ColumnSet {
    pub async fn load(pool: &SqlitePool, table_name: &str) -> Result<Self> {
        let columns = SchemaIntrospector::introspect_table(pool, table_name)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        Ok(Self {
            table: table_name.to_string(),
            columns,
        })
    }

    /// False when the table itself does not exist
    pub fn table_exists(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn has_all(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.has(c))
    }

    /// Keep only the columns this table has, logging the dropped ones
    pub fn retain_present<'a>(&self, wanted: &[&'a str]) -> Vec<&'a str> {
        wanted
            .iter()
            .copied()
            .filter(|c| {
                let present = self.has(c);
                if !present {
                    debug!("{}.{} not present, omitting", self.table, c);
                }
                present
            })
            .collect()
    }
}

/// Compares declared and actual columns
pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(table_name: &str, expected: &[ColumnDefinition], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
        expected
            .iter()
            .filter_map(|col| match actual.iter().find(|a| a.name == col.name) {
                None => Some(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: col.clone(),
                }),
                Some(a) if !Self::types_compatible(&col.sql_type, &a.type_name) => {
                    Some(SchemaDrift::TypeMismatch {
                        table: table_name.to_string(),
                        column: col.name.clone(),
                        expected: col.sql_type.clone(),
                        actual: a.type_name.clone(),
                    })
                }
                Some(_) => None,
            })
            .collect()
    }

    /// SQLite type affinity comparison
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        let integer = |t: &str| t.contains("INT") || t.contains("BOOL");
        let text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
        let real = |t: &str| t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB");

        (integer(&exp) && integer(&act)) || (text(&exp) && text(&act)) || (real(&exp) && real(&act))
    }
}

/// Applies column additions
pub struct SchemaSync;

impl SchemaSync {
    /// Add every declared column the table lacks. Returns the number added.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<usize> {
        let table_name = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            warn!("Schema sync: table '{}' does not exist, skipping", table_name);
            return Ok(0);
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            debug!("Schema sync: '{}' up to date", table_name);
            return Ok(0);
        }

        let mut added = 0;
        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                    added += 1;
                }
                SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                    warn!(
                        "Schema sync: {}.{} is '{}', expected '{}' (left unchanged)",
                        table, column, actual, expected
                    );
                }
            }
        }

        Ok(added)
    }

    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, column.add_column_clause(table));
        info!("Schema sync: adding column {}.{} ({})", table, column.name, column.sql_type);

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                // another connection added it first
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    struct DemoTable;

    impl TableSchema for DemoTable {
        fn table_name() -> &'static str {
            "demo"
        }

        fn expected_columns() -> Vec<ColumnDefinition> {
            vec![
                ColumnDefinition::new("id", "TEXT").primary_key(),
                ColumnDefinition::new("price", "INTEGER").not_null(),
                ColumnDefinition::new("unit", "TEXT"),
                ColumnDefinition::new("is_public", "INTEGER").not_null().default("1"),
            ]
        }
    }

    #[test]
    fn test_types_compatible() {
        assert!(SchemaDiff::types_compatible("TEXT", "text"));
        assert!(SchemaDiff::types_compatible("INTEGER", "BIGINT"));
        assert!(SchemaDiff::types_compatible("INTEGER", "BOOLEAN"));
        assert!(SchemaDiff::types_compatible("TEXT", "VARCHAR(20)"));
        assert!(SchemaDiff::types_compatible("REAL", "DOUBLE PRECISION"));
        assert!(!SchemaDiff::types_compatible("TEXT", "INTEGER"));
    }

    #[test]
    fn test_add_column_clause() {
        let col = ColumnDefinition::new("is_public", "INTEGER").not_null().default("1");
        assert_eq!(col.add_column_clause("t"), "is_public INTEGER NOT NULL DEFAULT 1");

        let col = ColumnDefinition::new("unit", "TEXT").not_null();
        assert_eq!(col.add_column_clause("t"), "unit TEXT");
    }

    #[tokio::test]
    async fn test_sync_adds_missing_columns() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE demo (id TEXT PRIMARY KEY, price INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let added = SchemaSync::sync_table::<DemoTable>(&pool).await.unwrap();
        assert_eq!(added, 2);

        let columns = ColumnSet::load(&pool, "demo").await.unwrap();
        assert!(columns.has_all(&["id", "price", "unit", "is_public"]));

        // idempotent
        assert_eq!(SchemaSync::sync_table::<DemoTable>(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_reports_type_mismatch_without_change() {
        let pool = setup_test_db().await;
        sqlx::query(
            "CREATE TABLE demo (id TEXT PRIMARY KEY, price TEXT, unit TEXT, is_public INTEGER)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let actual = SchemaIntrospector::introspect_table(&pool, "demo").await.unwrap();
        let drift = SchemaDiff::compare("demo", &DemoTable::expected_columns(), &actual);
        assert_eq!(drift.len(), 1);
        assert!(matches!(
            &drift[0],
            SchemaDrift::TypeMismatch { column, .. } if column == "price"
        ));

        assert_eq!(SchemaSync::sync_table::<DemoTable>(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_skips_missing_table() {
        let pool = setup_test_db().await;
        assert_eq!(SchemaSync::sync_table::<DemoTable>(&pool).await.unwrap(), 0);
        assert!(!SchemaIntrospector::table_exists(&pool, "demo").await.unwrap());
    }

    #[tokio::test]
    async fn test_column_set() {
        let pool = setup_test_db().await;
        let missing = ColumnSet::load(&pool, "demo").await.unwrap();
        assert!(!missing.table_exists());

        sqlx::query("CREATE TABLE demo (id TEXT, price INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        let columns = ColumnSet::load(&pool, "demo").await.unwrap();
        assert!(columns.table_exists());
        assert_eq!(columns.retain_present(&["id", "unit", "price"]), vec!["id", "price"]);
        assert!(!columns.has_all(&["id", "unit"]));
    }
}
