//! Migrations Ledger - Bookkeeping of applied migrations
//!
//! The ledger owns the fixed-shape table recording which migrations ran and
//! when. Its name comes from the driver's [`DriverConfig`](crate::backends::DriverConfig).

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::backends::{DatabaseValue, Driver};
use crate::error::DriverResult;
use crate::events::{MigrationObserver, ObserverRegistry};
use crate::security::quote_identifier;

use super::definitions::{ledger_table_spec, MigrationRecord};

/// Migrations ledger bound to a driver
pub struct MigrationLedger<'a, D: Driver + ?Sized> {
    driver: &'a D,
    observers: ObserverRegistry,
}

impl<'a, D: Driver + ?Sized> MigrationLedger<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self {
            driver,
            observers: ObserverRegistry::new(),
        }
    }

    /// Register an observer for applied, reverted and failed migrations
    pub fn with_observer(mut self, observer: Box<dyn MigrationObserver>) -> Self {
        self.observers.register(observer);
        self
    }

    pub fn driver(&self) -> &'a D {
        self.driver
    }

    /// Name of the ledger table
    pub fn table_name(&self) -> &str {
        &self.driver.config().migrations_table
    }

    /// Create the ledger table if it does not exist yet
    pub async fn ensure_table(&self) -> DriverResult<()> {
        self.driver.create_table(ledger_table_spec(self.table_name())).await
    }

    /// Record `name` as applied now
    pub async fn record_applied(&self, name: &str) -> DriverResult<()> {
        self.record_applied_at(name, Utc::now()).await
    }

    /// Record `name` as applied at `run_on`
    pub async fn record_applied_at(&self, name: &str, run_on: DateTime<Utc>) -> DriverResult<()> {
        let sql = format!(
            "INSERT INTO {} (name, run_on) VALUES ({}, {})",
            quote_identifier(self.table_name()),
            self.driver.parameter_placeholder(0),
            self.driver.parameter_placeholder(1)
        );
        self.driver
            .run_sql(&sql, &[DatabaseValue::from(name), DatabaseValue::DateTime(run_on)])
            .await?;

        tracing::info!(migration = %name, "recorded migration");
        Ok(())
    }

    /// All applied migrations, most recent first, ties broken by name descending
    pub async fn list_applied(&self) -> DriverResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY run_on DESC, name DESC",
            quote_identifier(self.table_name())
        );
        let rows = self.driver.all(&sql, &[]).await?;

        rows.iter().map(|row| MigrationRecord::from_row(row.as_ref())).collect()
    }

    /// Check whether a migration with exactly this name was recorded
    pub async fn is_applied(&self, name: &str) -> DriverResult<bool> {
        let sql = format!(
            "SELECT * FROM {} WHERE name = {}",
            quote_identifier(self.table_name()),
            self.driver.parameter_placeholder(0)
        );
        let rows = self.driver.all(&sql, &[DatabaseValue::from(name)]).await?;
        Ok(!rows.is_empty())
    }

    /// Delete the rows recorded under exactly `name`
    pub async fn remove_record(&self, name: &str) -> DriverResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE name = {}",
            quote_identifier(self.table_name()),
            self.driver.parameter_placeholder(0)
        );
        self.driver.run_sql(&sql, &[DatabaseValue::from(name)]).await?;

        tracing::info!(migration = %name, "removed migration record");
        Ok(())
    }

    pub async fn begin_transaction_scope(&self) -> DriverResult<()> {
        self.driver.start_migration().await
    }

    pub async fn end_transaction_scope(&self) -> DriverResult<()> {
        self.driver.end_migration().await
    }

    /// Run a migration body inside the transaction scope and record it
    ///
    /// On failure the scope is left open and observers are told; the error
    /// is returned unchanged. Rolling back a scope opened by
    /// [`Driver::start_migration`] is up to the driver.
    pub async fn apply<F>(&self, name: &str, body: F) -> DriverResult<()>
    where
        F: Future<Output = DriverResult<()>> + Send,
    {
        let result = self
            .in_scope(body, async { self.record_applied(name).await })
            .await;

        match result {
            Ok(()) => {
                self.observers.trigger_applied(name).await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(migration = %name, error = %err, "migration failed");
                self.observers.trigger_failed(name, &err).await;
                Err(err)
            }
        }
    }

    /// Run a migration's reverting body inside the transaction scope and
    /// remove its record
    pub async fn revert<F>(&self, name: &str, body: F) -> DriverResult<()>
    where
        F: Future<Output = DriverResult<()>> + Send,
    {
        let result = self
            .in_scope(body, async { self.remove_record(name).await })
            .await;

        match result {
            Ok(()) => {
                self.observers.trigger_reverted(name).await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(migration = %name, error = %err, "migration revert failed");
                self.observers.trigger_failed(name, &err).await;
                Err(err)
            }
        }
    }

    async fn in_scope<B, L>(&self, body: B, bookkeeping: L) -> DriverResult<()>
    where
        B: Future<Output = DriverResult<()>> + Send,
        L: Future<Output = DriverResult<()>> + Send,
    {
        self.begin_transaction_scope().await?;
        body.await?;
        bookkeeping.await?;
        self.end_transaction_scope().await
    }
}
