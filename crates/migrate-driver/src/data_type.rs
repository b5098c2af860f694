//! Logical column types and their default SQL keywords

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Dialect-independent column type
///
/// `Other` carries any type name this crate does not recognize; it is passed
/// through to the database uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    String,
    Text,
    Integer,
    BigInteger,
    DateTime,
    Real,
    Blob,
    Timestamp,
    Binary,
    Boolean,
    Decimal,
    Char,
    Date,
    SmallInt,
    Other(String),
}

impl LogicalType {
    /// Canonical lowercase type name, as accepted by [`FromStr`]
    pub fn name(&self) -> &str {
        match self {
            LogicalType::String => "string",
            LogicalType::Text => "text",
            LogicalType::Integer => "int",
            LogicalType::BigInteger => "bigint",
            LogicalType::DateTime => "datetime",
            LogicalType::Real => "real",
            LogicalType::Blob => "blob",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Binary => "binary",
            LogicalType::Boolean => "boolean",
            LogicalType::Decimal => "decimal",
            LogicalType::Char => "char",
            LogicalType::Date => "date",
            LogicalType::SmallInt => "smallint",
            LogicalType::Other(name) => name,
        }
    }
}

/// Parse a type name exactly as written
///
/// Only the canonical lowercase names are recognized. Anything else,
/// including other casings such as `"DATETIME"`, becomes
/// [`LogicalType::Other`] and reaches the database uppercased.
impl FromStr for LogicalType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s {
            "string" => LogicalType::String,
            "text" => LogicalType::Text,
            "int" => LogicalType::Integer,
            "bigint" => LogicalType::BigInteger,
            "datetime" => LogicalType::DateTime,
            "real" => LogicalType::Real,
            "blob" => LogicalType::Blob,
            "timestamp" => LogicalType::Timestamp,
            "binary" => LogicalType::Binary,
            "boolean" => LogicalType::Boolean,
            "decimal" => LogicalType::Decimal,
            "char" => LogicalType::Char,
            "date" => LogicalType::Date,
            "smallint" => LogicalType::SmallInt,
            _ => LogicalType::Other(s.to_string()),
        };
        Ok(parsed)
    }
}

impl From<&str> for LogicalType {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default logical type to SQL keyword mapping
///
/// Unknown types are uppercased and used verbatim; a warning is logged but
/// the call never fails. Dialect drivers override
/// [`Driver::map_data_type`](crate::backends::Driver::map_data_type) and fall
/// back to this function for the types they leave alone.
pub fn map_data_type(data_type: &LogicalType) -> String {
    let keyword = match data_type {
        LogicalType::String => "VARCHAR",
        LogicalType::Text => "TEXT",
        LogicalType::Integer => "INTEGER",
        LogicalType::BigInteger => "BIGINT",
        LogicalType::DateTime => "INTEGER",
        LogicalType::Real => "REAL",
        LogicalType::Blob => "BLOB",
        LogicalType::Timestamp => "TIMESTAMP",
        LogicalType::Binary => "BINARY",
        LogicalType::Boolean => "BOOLEAN",
        LogicalType::Decimal => "DECIMAL",
        LogicalType::Char => "CHAR",
        LogicalType::Date => "DATE",
        LogicalType::SmallInt => "SMALLINT",
        LogicalType::Other(name) => {
            let unknown = name.to_uppercase();
            tracing::warn!(data_type = %unknown, "Using unknown data type");
            return unknown;
        }
    };
    keyword.to_string()
}
