//! # elif-migrate-driver: Dialect Drivers for Schema Migrations
//!
//! A migration engine talks to a database through the [`Driver`] trait. The
//! trait bundles the SQL a migration needs: logical type mapping, table and
//! column DDL, indexes, a small insert builder and transaction-scope hooks.
//! Concrete dialects supply the execution primitives and their column
//! constraint syntax; the rest is generic.
//!
//! Foreign keys declared on a new table are deferred until the table exists
//! and then added one at a time. Applied migrations are tracked in a ledger
//! table managed by [`MigrationLedger`].
//!
//! ```no_run
//! use elif_migrate_driver::{
//!     ColumnSpec, DriverConfig, LogicalType, MigrationLedger, SqliteDriver, TableSpec, Driver,
//! };
//!
//! # async fn run() -> elif_migrate_driver::DriverResult<()> {
//! let driver = SqliteDriver::connect("sqlite::memory:", DriverConfig::default()).await?;
//! let ledger = MigrationLedger::new(&driver);
//! ledger.ensure_table().await?;
//!
//! ledger
//!     .apply("20240101-create-users", async {
//!         driver
//!             .create_table(
//!                 TableSpec::new("users")
//!                     .column("id", ColumnSpec::new(LogicalType::Integer).primary_key())
//!                     .column("email", ColumnSpec::new(LogicalType::String).length(255).not_null()),
//!             )
//!             .await
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod data_type;
pub mod error;
pub mod events;
pub mod migrations;
pub mod security;

#[cfg(test)]
mod testing;

// Re-export core traits and types
pub use backends::{
    DatabaseRow, DatabaseRowExt, DatabaseValue, Driver, DriverConfig, MapRow, SqliteDriver,
    DEFAULT_MIGRATIONS_TABLE,
};
pub use data_type::{map_data_type, LogicalType};
pub use error::*;
pub use events::*;
pub use migrations::*;
