//! Quoting and identifier validation helpers
//!
//! Identifiers in generated DDL are always double-quoted. String literals use
//! the narrow quote-doubling escape; this is not a general SQL-injection
//! defence, which is why statement values should travel as bound parameters
//! or typed [`DatabaseValue`](crate::backends::DatabaseValue)s.

use crate::error::DriverError;

/// Characters allowed in configured identifiers (alphanumeric, underscore, dollar)
const ALLOWED_IDENTIFIER_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_$";

/// Maximum identifier length accepted for configured names
const MAX_IDENTIFIER_LEN: usize = 63;

/// Quote a SQL identifier (table name, column name, index name)
///
/// Embedded double quotes are doubled before wrapping.
///
/// # Examples
/// ```
/// use elif_migrate_driver::security::quote_identifier;
///
/// assert_eq!(quote_identifier("users"), "\"users\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Quote every identifier and join them with `, `
pub fn quote_identifier_list<S: AsRef<str>>(identifiers: &[S]) -> String {
    identifiers
        .iter()
        .map(|identifier| quote_identifier(identifier.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Double every single quote in `value`
pub fn escape_string_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Validate that a configured identifier is plain enough to embed in SQL
pub fn validate_identifier(identifier: &str) -> Result<(), DriverError> {
    let Some(first) = identifier.chars().next() else {
        return Err(DriverError::Configuration(
            "Identifier cannot be empty".to_string(),
        ));
    };

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(DriverError::Configuration(format!(
            "Identifier '{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = identifier
        .chars()
        .find(|c| !ALLOWED_IDENTIFIER_CHARS.contains(*c))
    {
        return Err(DriverError::Configuration(format!(
            "Identifier '{}' contains invalid character '{}'",
            identifier, c
        )));
    }

    if first.is_ascii_digit() {
        return Err(DriverError::Configuration(format!(
            "Identifier '{}' cannot start with a number",
            identifier
        )));
    }

    Ok(())
}
