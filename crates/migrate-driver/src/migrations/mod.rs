//! Migration Schema Support
//!
//! DDL generation, deferred foreign keys and the migrations ledger shared by
//! every driver.

pub mod column;
pub mod definitions;
pub mod foreign_keys;
pub mod ledger;
pub mod schema_builder;

pub use column::*;
pub use definitions::*;
pub use foreign_keys::*;
pub use ledger::*;
pub use schema_builder::*;
