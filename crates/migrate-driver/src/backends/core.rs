//! Core Driver Contract
//!
//! This module defines the capability surface a concrete dialect driver
//! implements. A driver supplies the execution primitives, its column
//! constraint syntax and resource cleanup; everything else has a usable
//! generic default:
//!
//! - type mapping, escaping and literal rendering
//! - `CREATE TABLE`, `DROP TABLE`, `ALTER TABLE ... ADD COLUMN`, indexes and
//!   the small `INSERT` builder used by the migrations ledger
//! - transaction-scope hooks that complete immediately
//!
//! Alteration hooks that have no portable SQL (foreign keys on existing
//! tables, renames, database management) return
//! [`DriverError::NotImplemented`] unless the dialect overrides them.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data_type::{self, LogicalType};
use crate::error::{DriverError, DriverResult};
use crate::migrations::column::{self, ColumnDefOptions, ColumnDefinition, ColumnSpec, ForeignKeyRules};
use crate::migrations::schema_builder::{self, DropTableOptions, TableSpec};
use crate::security;

/// Default name of the migrations ledger table
pub const DEFAULT_MIGRATIONS_TABLE: &str = "migrations";

/// Per-driver configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Table name for tracking applied migrations
    pub migrations_table: String,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom ledger table name
    pub fn with_migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }

    /// Validate the configuration before a driver is built from it
    pub fn validate(&self) -> DriverResult<()> {
        security::validate_identifier(&self.migrations_table)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_string(),
        }
    }
}

/// Database value enumeration for parameter binding and literal rendering
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(chrono::DateTime<chrono::Utc>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Int64(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(
                b.iter()
                    .map(|&x| JsonValue::Number(serde_json::Number::from(x)))
                    .collect(),
            ),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> DriverResult<DatabaseValue>;

    /// Get column names in result order
    fn column_names(&self) -> Vec<String>;

    /// Convert row to JSON object
    fn to_json(&self) -> DriverResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for name in self.column_names() {
            let value = self.get_by_name(&name)?;
            map.insert(name, value.to_json());
        }
        Ok(JsonValue::Object(map))
    }
}

/// Extension trait for typed column access
pub trait DatabaseRowExt {
    /// Get a typed value from a column
    fn get<T>(&self, column: &str) -> DriverResult<T>
    where
        T: for<'de> Deserialize<'de>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get<T>(&self, column: &str) -> DriverResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self.get_by_name(column)?;
        serde_json::from_value(value.to_json()).map_err(|e| {
            DriverError::Decode(format!("Failed to deserialize column '{}': {}", column, e))
        })
    }
}

/// Owned row with columns in result order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRow {
    columns: Vec<(String, DatabaseValue)>,
}

impl MapRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing any earlier value with the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn into_map(self) -> HashMap<String, DatabaseValue> {
        self.columns.into_iter().collect()
    }
}

impl DatabaseRow for MapRow {
    fn get_by_name(&self, name: &str) -> DriverResult<DatabaseValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| DriverError::Decode(format!("Column '{}' not found", name)))
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Capability surface of a dialect driver
#[async_trait]
pub trait Driver: Send + Sync {
    /// Configuration captured when the driver was built
    fn config(&self) -> &DriverConfig;

    /// Execute a statement that returns no rows
    async fn run_sql(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<()>;

    /// Execute a statement and return its rows in order
    async fn all(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<Vec<Box<dyn DatabaseRow>>>;

    /// Render the dialect's constraint fragment for a column
    ///
    /// `options.emit_primary_key` is false when the table carries a composite
    /// primary key clause, in which case no inline `PRIMARY KEY` may appear.
    fn create_column_constraint(&self, spec: &ColumnSpec, options: &ColumnDefOptions) -> String;

    /// Release driver resources
    async fn close(&self) -> DriverResult<()>;

    /// Map a logical column type to this dialect's SQL keyword
    fn map_data_type(&self, data_type: &LogicalType) -> String {
        data_type::map_data_type(data_type)
    }

    /// Escape a string for use inside a single-quoted literal
    fn escape(&self, value: &str) -> String {
        security::escape_string_literal(value)
    }

    /// Render a value as an inline SQL literal
    ///
    /// NaN and infinite floats have no portable literal; `insert` rejects
    /// them before rendering.
    fn literal(&self, value: &DatabaseValue) -> String {
        match value {
            DatabaseValue::Null => "NULL".to_string(),
            DatabaseValue::Bool(true) => "TRUE".to_string(),
            DatabaseValue::Bool(false) => "FALSE".to_string(),
            DatabaseValue::Int32(i) => i.to_string(),
            DatabaseValue::Int64(i) => i.to_string(),
            DatabaseValue::Float64(f) => f.to_string(),
            DatabaseValue::String(s) => format!("'{}'", self.escape(s)),
            DatabaseValue::Bytes(b) => format!("X'{}'", hex::encode(b)),
            DatabaseValue::DateTime(dt) => format!("'{}'", self.escape(&dt.to_rfc3339())),
        }
    }

    /// Placeholder for the positional parameter at `index` (zero-based)
    fn parameter_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Called before a migration body runs
    ///
    /// When the body or its ledger update fails, [`Driver::end_migration`]
    /// is not called and the error goes straight back to the caller. A
    /// dialect that opens a transaction here must roll it back itself on
    /// that error path, or the next migration runs inside the stale scope.
    async fn start_migration(&self) -> DriverResult<()> {
        Ok(())
    }

    /// Called after a migration body and its ledger update succeeded
    async fn end_migration(&self) -> DriverResult<()> {
        Ok(())
    }

    /// Build one column's DDL fragment and its deferred foreign key, if any
    fn create_column_def(
        &self,
        table_name: &str,
        column_name: &str,
        spec: ColumnSpec,
        options: &ColumnDefOptions,
    ) -> ColumnDefinition<'_> {
        column::create_column_def(self, table_name, column_name, spec, options)
    }

    /// Create a table, then its foreign keys one at a time
    async fn create_table(&self, table: TableSpec) -> DriverResult<()> {
        schema_builder::create_table(self, table).await
    }

    async fn drop_table(&self, table_name: &str, options: DropTableOptions) -> DriverResult<()> {
        let sql = schema_builder::drop_table_sql(table_name, &options);
        self.run_sql(&sql, &[]).await
    }

    /// Add one column, then run its foreign key if it declares one
    async fn add_column(&self, table_name: &str, column_name: &str, spec: ColumnSpec) -> DriverResult<()> {
        schema_builder::add_column(self, table_name, column_name, spec).await
    }

    async fn add_index(
        &self,
        table_name: &str,
        index_name: &str,
        columns: &[&str],
        unique: bool,
    ) -> DriverResult<()> {
        let sql = schema_builder::add_index_sql(table_name, index_name, columns, unique)?;
        self.run_sql(&sql, &[]).await
    }

    /// Drop an index; `table_name` is available to dialects that scope indexes by table
    async fn remove_index(&self, _table_name: Option<&str>, index_name: &str) -> DriverResult<()> {
        let sql = schema_builder::remove_index_sql(index_name);
        self.run_sql(&sql, &[]).await
    }

    /// Insert one row with inline literals
    async fn insert(&self, table_name: &str, columns: &[&str], values: &[DatabaseValue]) -> DriverResult<()> {
        let sql = schema_builder::insert_sql(self, table_name, columns, values)?;
        self.run_sql(&sql, &[]).await
    }

    async fn rename_table(&self, _table_name: &str, _new_table_name: &str) -> DriverResult<()> {
        Err(DriverError::not_implemented("rename_table"))
    }

    async fn remove_column(&self, _table_name: &str, _column_name: &str) -> DriverResult<()> {
        Err(DriverError::not_implemented("remove_column"))
    }

    async fn rename_column(
        &self,
        _table_name: &str,
        _old_column_name: &str,
        _new_column_name: &str,
    ) -> DriverResult<()> {
        Err(DriverError::not_implemented("rename_column"))
    }

    async fn change_column(&self, _table_name: &str, _column_name: &str, _spec: ColumnSpec) -> DriverResult<()> {
        Err(DriverError::not_implemented("change_column"))
    }

    /// Add a foreign key from `table_name` to `referenced_table`
    ///
    /// `mapping` pairs local columns with referenced columns, in order.
    async fn add_foreign_key(
        &self,
        _table_name: &str,
        _referenced_table: &str,
        _key_name: Option<&str>,
        _mapping: &[(String, String)],
        _rules: &ForeignKeyRules,
    ) -> DriverResult<()> {
        Err(DriverError::not_implemented("add_foreign_key"))
    }

    async fn remove_foreign_key(&self, _table_name: &str, _key_name: &str) -> DriverResult<()> {
        Err(DriverError::not_implemented("remove_foreign_key"))
    }

    async fn create_database(&self, _name: &str) -> DriverResult<()> {
        Err(DriverError::not_implemented("create_database"))
    }

    async fn switch_database(&self, _name: &str) -> DriverResult<()> {
        Err(DriverError::not_implemented("switch_database"))
    }

    async fn drop_database(&self, _name: &str) -> DriverResult<()> {
        Err(DriverError::not_implemented("drop_database"))
    }
}
