//! Database Driver Abstractions
//!
//! The driver contract lives in [`core`]; [`sqlite`] is the reference dialect.

pub mod core;
pub mod sqlite;

// Re-export core traits and types
pub use self::core::*;
pub use self::sqlite::SqliteDriver;
