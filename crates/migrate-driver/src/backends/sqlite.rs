//! SQLite Driver Implementation
//!
//! Reference dialect driver built on sqlx. It keeps the generic DDL, maps
//! `DATE_TIME` to `DATETIME` and supports the `ALTER TABLE` forms SQLite
//! understands. Foreign keys on existing tables, `change_column` and database
//! management stay unsupported.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use super::core::*;
use crate::data_type::{self, LogicalType};
use crate::error::DriverResult;
use crate::migrations::column::{standard_column_constraint, ColumnDefOptions, ColumnSpec};
use crate::security::quote_identifier;

/// SQLite dialect driver
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
    config: DriverConfig,
}

impl SqliteDriver {
    /// Connect to `database_url` (e.g. `sqlite::memory:` or `sqlite://app.db`)
    ///
    /// In-memory databases are private to a connection, so the pool is
    /// limited to a single connection.
    pub async fn connect(database_url: &str, config: DriverConfig) -> DriverResult<Self> {
        config.validate()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        tracing::debug!(url = %database_url, table = %config.migrations_table, "SQLite driver connected");
        Ok(Self { pool, config })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool, config: DriverConfig) -> DriverResult<Self> {
        config.validate()?;
        Ok(Self { pool, config })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn config(&self) -> &DriverConfig {
        &self.config
    }

    async fn run_sql(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<()> {
        tracing::debug!(sql = %sql, "executing statement");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn all(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<Vec<Box<dyn DatabaseRow>>> {
        tracing::debug!(sql = %sql, "fetching rows");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_database_value(query, param);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| sqlite_row_to_map_row(row).map(|row| Box::new(row) as Box<dyn DatabaseRow>))
            .collect()
    }

    fn create_column_constraint(&self, spec: &ColumnSpec, options: &ColumnDefOptions) -> String {
        standard_column_constraint(self, spec, options)
    }

    async fn close(&self) -> DriverResult<()> {
        self.pool.close().await;
        Ok(())
    }

    fn map_data_type(&self, data_type: &LogicalType) -> String {
        match data_type {
            LogicalType::DateTime => "DATETIME".to_string(),
            other => data_type::map_data_type(other),
        }
    }

    async fn rename_table(&self, table_name: &str, new_table_name: &str) -> DriverResult<()> {
        let sql = format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_identifier(table_name),
            quote_identifier(new_table_name)
        );
        self.run_sql(&sql, &[]).await
    }

    async fn remove_column(&self, table_name: &str, column_name: &str) -> DriverResult<()> {
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_identifier(table_name),
            quote_identifier(column_name)
        );
        self.run_sql(&sql, &[]).await
    }

    async fn rename_column(
        &self,
        table_name: &str,
        old_column_name: &str,
        new_column_name: &str,
    ) -> DriverResult<()> {
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_identifier(table_name),
            quote_identifier(old_column_name),
            quote_identifier(new_column_name)
        );
        self.run_sql(&sql, &[]).await
    }
}

/// Bind a DatabaseValue to a sqlx query
///
/// Datetimes are bound as RFC 3339 text so that `ORDER BY run_on` sorts
/// chronologically.
fn bind_database_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &DatabaseValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::DateTime(dt) => query.bind(dt.to_rfc3339()),
    }
}

/// Convert a SQLite row by the storage class of each value
fn sqlite_row_to_map_row(row: &SqliteRow) -> DriverResult<MapRow> {
    let mut map_row = MapRow::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            DatabaseValue::Null
        } else {
            let storage_class = raw.type_info().name().to_string();
            match storage_class.as_str() {
                "INTEGER" => DatabaseValue::Int64(row.try_get(index)?),
                "REAL" => DatabaseValue::Float64(row.try_get(index)?),
                "BLOB" => DatabaseValue::Bytes(row.try_get(index)?),
                _ => DatabaseValue::String(row.try_get(index)?),
            }
        };
        map_row.insert(column.name(), value);
    }

    Ok(map_row)
}
