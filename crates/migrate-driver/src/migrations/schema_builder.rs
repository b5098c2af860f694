//! Schema Builder - DDL generation for tables, columns and indexes
//!
//! Statements are assembled here and executed through the driver's
//! execution primitive. Identifiers are always double-quoted.

use crate::backends::{DatabaseValue, Driver};
use crate::error::{DriverError, DriverResult};
use crate::security::{quote_identifier, quote_identifier_list};

use super::column::{ColumnDefOptions, ColumnSpec};
use super::foreign_keys::ForeignKeyChain;

/// Table specification for `CREATE TABLE`
///
/// Columns keep declaration order; declaring a name twice replaces the
/// earlier spec in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<(String, ColumnSpec)>,
    pub if_not_exists: bool,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            if_not_exists: false,
        }
    }

    /// Build a table from a bare column mapping
    pub fn with_columns<N, S>(name: impl Into<String>, columns: impl IntoIterator<Item = (N, S)>) -> Self
    where
        N: Into<String>,
        S: Into<ColumnSpec>,
    {
        columns
            .into_iter()
            .fold(Self::new(name), |table, (column, spec)| table.column(column, spec))
    }

    /// Add a column
    pub fn column(mut self, name: impl Into<String>, spec: impl Into<ColumnSpec>) -> Self {
        let name = name.into();
        let spec = spec.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.columns.push((name, spec)),
        }
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Names of the columns marked as primary key, in declaration order
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, spec)| spec.primary_key)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Options for `DROP TABLE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropTableOptions {
    pub if_exists: bool,
}

/// A `CREATE TABLE` statement and the foreign keys to add after it
#[derive(Debug)]
pub struct CreateTableStatement<'a> {
    pub sql: String,
    pub foreign_keys: ForeignKeyChain<'a>,
}

/// Assemble `CREATE TABLE` for `table`
///
/// A single primary key column is rendered inline. With two or more, no
/// column carries an inline marker and a trailing `PRIMARY KEY (...)` clause
/// lists them in declaration order.
pub fn build_create_table<D: Driver + ?Sized>(driver: &D, table: TableSpec) -> DriverResult<CreateTableStatement<'_>> {
    if table.columns.is_empty() {
        return Err(DriverError::argument_mismatch(format!(
            "Table '{}' must declare at least one column",
            table.name
        )));
    }

    let composite_key = match table.primary_key_columns() {
        keys if keys.len() > 1 => Some(format!("PRIMARY KEY ({})", quote_identifier_list(&keys))),
        _ => None,
    };
    let options = ColumnDefOptions {
        emit_primary_key: composite_key.is_none(),
    };

    let TableSpec {
        name,
        columns,
        if_not_exists,
    } = table;

    let mut definitions = Vec::with_capacity(columns.len() + 1);
    let mut foreign_keys = ForeignKeyChain::new();
    for (column_name, spec) in columns {
        let definition = driver.create_column_def(&name, &column_name, spec, &options);
        definitions.push(definition.constraints);
        if let Some(action) = definition.foreign_key {
            foreign_keys.push(action);
        }
    }
    definitions.extend(composite_key);

    let sql = format!(
        "CREATE TABLE {}{} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_identifier(&name),
        definitions.join(", ")
    );

    Ok(CreateTableStatement { sql, foreign_keys })
}

/// Create a table, then add its foreign keys one at a time
pub async fn create_table<D: Driver + ?Sized>(driver: &D, table: TableSpec) -> DriverResult<()> {
    tracing::debug!(table = %table.name, "creating table");
    let statement = build_create_table(driver, table)?;
    driver.run_sql(&statement.sql, &[]).await?;
    statement.foreign_keys.run().await
}

pub fn drop_table_sql(table_name: &str, options: &DropTableOptions) -> String {
    format!(
        "DROP TABLE {}{}",
        if options.if_exists { "IF EXISTS " } else { "" },
        quote_identifier(table_name)
    )
}

/// Add one column, then run its foreign key if it declares one
pub async fn add_column<D: Driver + ?Sized>(
    driver: &D,
    table_name: &str,
    column_name: &str,
    spec: ColumnSpec,
) -> DriverResult<()> {
    tracing::debug!(table = %table_name, column = %column_name, "adding column");
    let definition = driver.create_column_def(table_name, column_name, spec, &ColumnDefOptions::default());
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_identifier(table_name),
        definition.constraints
    );

    driver.run_sql(&sql, &[]).await?;
    match definition.foreign_key {
        Some(action) => action.await,
        None => Ok(()),
    }
}

pub fn add_index_sql(table_name: &str, index_name: &str, columns: &[&str], unique: bool) -> DriverResult<String> {
    if columns.is_empty() {
        return Err(DriverError::argument_mismatch(format!(
            "Index '{}' must cover at least one column",
            index_name
        )));
    }

    Ok(format!(
        "CREATE {}INDEX {} ON {} ({})",
        if unique { "UNIQUE " } else { "" },
        quote_identifier(index_name),
        quote_identifier(table_name),
        quote_identifier_list(columns)
    ))
}

pub fn remove_index_sql(index_name: &str) -> String {
    format!("DROP INDEX {}", quote_identifier(index_name))
}

/// Build an `INSERT` with inline literals
///
/// Fails before rendering anything when the column and value counts differ
/// or a float is NaN or infinite.
pub fn insert_sql<D: Driver + ?Sized>(
    driver: &D,
    table_name: &str,
    columns: &[&str],
    values: &[DatabaseValue],
) -> DriverResult<String> {
    if columns.len() != values.len() {
        return Err(DriverError::argument_mismatch(format!(
            "The number of columns ({}) does not match the number of values ({})",
            columns.len(),
            values.len()
        )));
    }

    if let Some((column, value)) = columns
        .iter()
        .zip(values)
        .find(|(_, value)| matches!(value, DatabaseValue::Float64(f) if !f.is_finite()))
    {
        return Err(DriverError::argument_mismatch(format!(
            "Column '{}' has no SQL literal for {:?}",
            column, value
        )));
    }

    let literals: Vec<String> = values.iter().map(|value| driver.literal(value)).collect();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table_name),
        columns.join(", "),
        literals.join(", ")
    ))
}
