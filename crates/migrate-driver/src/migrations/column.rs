//! Column Definitions - Column specs and their DDL fragments
//!
//! A [`ColumnSpec`] is consumed once per DDL call. Rendering it yields the
//! column fragment and, when the spec declares a foreign key, a deferred
//! action that adds the key once the owning table exists.

use serde::{Deserialize, Serialize};

use crate::backends::{DatabaseValue, Driver};
use crate::data_type::LogicalType;
use crate::security::quote_identifier;

use super::foreign_keys::{bind_foreign_key, DeferredAction};

/// Specification of a single column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub data_type: LogicalType,
    pub length: Option<u32>,
    pub not_null: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub default_value: Option<DatabaseValue>,
    pub foreign_key: Option<ForeignKeyOptions>,
}

impl ColumnSpec {
    pub fn new(data_type: impl Into<LogicalType>) -> Self {
        Self {
            data_type: data_type.into(),
            length: None,
            not_null: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
            default_value: None,
            foreign_key: None,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<DatabaseValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKeyOptions) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }
}

/// Shorthand: a bare type name is a column of that type
impl From<&str> for ColumnSpec {
    fn from(data_type: &str) -> Self {
        ColumnSpec::new(data_type)
    }
}

impl From<LogicalType> for ColumnSpec {
    fn from(data_type: LogicalType) -> Self {
        ColumnSpec::new(data_type)
    }
}

/// Options threaded from the table builder into column rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnDefOptions {
    /// Whether the column may carry an inline `PRIMARY KEY`
    pub emit_primary_key: bool,
}

/// Column mapping of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForeignKeyMapping {
    /// The declaring column references this single column
    Single(String),
    /// Explicit local → referenced column pairs
    Columns(Vec<(String, String)>),
}

/// Referential actions of a foreign key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRules {
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

/// Foreign key declared on a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyOptions {
    /// Referenced table
    pub table: String,
    pub mapping: ForeignKeyMapping,
    /// Constraint name
    pub name: Option<String>,
    #[serde(default)]
    pub rules: ForeignKeyRules,
}

impl ForeignKeyOptions {
    /// Reference a single column of `table`
    pub fn new(table: impl Into<String>, referenced_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            mapping: ForeignKeyMapping::Single(referenced_column.into()),
            name: None,
            rules: ForeignKeyRules::default(),
        }
    }

    /// Reference `table` through explicit column pairs
    pub fn columns<L, R>(table: impl Into<String>, pairs: impl IntoIterator<Item = (L, R)>) -> Self
    where
        L: Into<String>,
        R: Into<String>,
    {
        Self {
            table: table.into(),
            mapping: ForeignKeyMapping::Columns(
                pairs
                    .into_iter()
                    .map(|(local, foreign)| (local.into(), foreign.into()))
                    .collect(),
            ),
            name: None,
            rules: ForeignKeyRules::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.rules.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.rules.on_update = Some(action.into());
        self
    }

    /// Local → referenced column pairs, with the single-column shorthand
    /// bound to `column_name`
    pub fn resolve_mapping(&self, column_name: &str) -> Vec<(String, String)> {
        match &self.mapping {
            ForeignKeyMapping::Single(foreign) => vec![(column_name.to_string(), foreign.clone())],
            ForeignKeyMapping::Columns(pairs) => pairs.clone(),
        }
    }
}

/// Rendered column fragment plus its deferred foreign key
pub struct ColumnDefinition<'a> {
    pub constraints: String,
    pub foreign_key: Option<DeferredAction<'a>>,
}

impl std::fmt::Debug for ColumnDefinition<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("constraints", &self.constraints)
            .field("foreign_key", &self.foreign_key.is_some())
            .finish()
    }
}

/// Render `"name" TYPE[(len)] [constraints]` and bind the column's foreign key
///
/// The foreign key action is only constructed here; nothing runs until the
/// caller awaits it.
pub fn create_column_def<'a, D: Driver + ?Sized>(
    driver: &'a D,
    table_name: &str,
    column_name: &str,
    spec: ColumnSpec,
    options: &ColumnDefOptions,
) -> ColumnDefinition<'a> {
    let mut sql_type = driver.map_data_type(&spec.data_type);
    if let Some(length) = spec.length {
        sql_type.push_str(&format!("({})", length));
    }
    let constraint = driver.create_column_constraint(&spec, options);

    let mut parts = vec![quote_identifier(column_name), sql_type];
    if !constraint.is_empty() {
        parts.push(constraint);
    }

    ColumnDefinition {
        constraints: parts.join(" "),
        foreign_key: spec
            .foreign_key
            .map(|fk| bind_foreign_key(driver, table_name, column_name, fk)),
    }
}

/// Generic constraint syntax for dialects that follow the common grammar
///
/// Produces `[PRIMARY KEY [AUTOINCREMENT]] [NOT NULL] [UNIQUE] [DEFAULT v]`.
/// `AUTOINCREMENT` is only emitted together with an inline primary key.
pub fn standard_column_constraint<D: Driver + ?Sized>(
    driver: &D,
    spec: &ColumnSpec,
    options: &ColumnDefOptions,
) -> String {
    let mut parts = Vec::new();

    if spec.primary_key && options.emit_primary_key {
        parts.push("PRIMARY KEY".to_string());
        if spec.auto_increment {
            parts.push("AUTOINCREMENT".to_string());
        }
    }
    if spec.not_null {
        parts.push("NOT NULL".to_string());
    }
    if spec.unique {
        parts.push("UNIQUE".to_string());
    }
    if let Some(value) = &spec.default_value {
        parts.push(format!("DEFAULT {}", driver.literal(value)));
    }

    parts.join(" ")
}
