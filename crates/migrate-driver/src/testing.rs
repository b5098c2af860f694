//! In-memory drivers for unit tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::backends::{DatabaseRow, DatabaseValue, Driver, DriverConfig, MapRow};
use crate::error::{DriverError, DriverResult};
use crate::migrations::column::{standard_column_constraint, ColumnDefOptions, ColumnSpec, ForeignKeyRules};
use crate::security::{quote_identifier, quote_identifier_list};

type Executed = Vec<(String, Vec<DatabaseValue>)>;

/// Records every statement, optionally failing on a substring match
pub(crate) struct RecordingDriver {
    config: DriverConfig,
    executed: Mutex<Executed>,
    foreign_keys: Mutex<Vec<String>>,
    rows: Vec<MapRow>,
    fail_on: Option<String>,
    transactional: bool,
}

impl RecordingDriver {
    pub(crate) fn new() -> Self {
        Self::with_config(DriverConfig::default())
    }

    pub(crate) fn with_config(config: DriverConfig) -> Self {
        Self {
            config,
            executed: Mutex::new(Vec::new()),
            foreign_keys: Mutex::new(Vec::new()),
            rows: Vec::new(),
            fail_on: None,
            transactional: false,
        }
    }

    /// Rows returned by every `all` call
    pub(crate) fn with_rows(mut self, rows: Vec<MapRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Record `BEGIN`/`COMMIT` from the migration hooks
    pub(crate) fn transactional(mut self) -> Self {
        self.transactional = true;
        self
    }

    pub(crate) fn fail_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub(crate) fn executed(&self) -> Executed {
        self.executed.lock().unwrap().clone()
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.executed().into_iter().map(|(sql, _)| sql).collect()
    }

    pub(crate) fn foreign_keys(&self) -> Vec<String> {
        self.foreign_keys.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<()> {
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        match &self.fail_on {
            Some(fragment) if sql.contains(fragment.as_str()) => {
                Err(DriverError::execution(format!("rejected: {}", sql)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    fn config(&self) -> &DriverConfig {
        &self.config
    }

    async fn run_sql(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<()> {
        self.record(sql, params)
    }

    async fn all(&self, sql: &str, params: &[DatabaseValue]) -> DriverResult<Vec<Box<dyn DatabaseRow>>> {
        self.record(sql, params)?;
        Ok(self
            .rows
            .iter()
            .cloned()
            .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
            .collect())
    }

    fn create_column_constraint(&self, spec: &ColumnSpec, options: &ColumnDefOptions) -> String {
        standard_column_constraint(self, spec, options)
    }

    async fn close(&self) -> DriverResult<()> {
        Ok(())
    }

    async fn start_migration(&self) -> DriverResult<()> {
        if self.transactional {
            self.record("BEGIN", &[])?;
        }
        Ok(())
    }

    async fn end_migration(&self) -> DriverResult<()> {
        if self.transactional {
            self.record("COMMIT", &[])?;
        }
        Ok(())
    }

    async fn add_foreign_key(
        &self,
        table_name: &str,
        referenced_table: &str,
        key_name: Option<&str>,
        mapping: &[(String, String)],
        rules: &ForeignKeyRules,
    ) -> DriverResult<()> {
        let (local, foreign): (Vec<&str>, Vec<&str>) = mapping
            .iter()
            .map(|(local, foreign)| (local.as_str(), foreign.as_str()))
            .unzip();

        let mut description = format!(
            "{}({}) -> {}({})",
            table_name,
            local.join(", "),
            referenced_table,
            foreign.join(", ")
        );
        if let Some(name) = key_name {
            description.push_str(&format!(" {}", name));
        }
        if let Some(action) = &rules.on_delete {
            description.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = &rules.on_update {
            description.push_str(&format!(" ON UPDATE {}", action));
        }

        let sql = format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_identifier(table_name),
            quote_identifier_list(&local),
            quote_identifier(referenced_table),
            quote_identifier_list(&foreign)
        );
        self.record(&sql, &[])?;
        self.foreign_keys.lock().unwrap().push(description);
        Ok(())
    }
}

/// Implements only the required surface
pub(crate) struct BareDriver {
    config: DriverConfig,
    executed: Mutex<Vec<String>>,
}

impl BareDriver {
    pub(crate) fn new() -> Self {
        Self {
            config: DriverConfig::default(),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Driver for BareDriver {
    fn config(&self) -> &DriverConfig {
        &self.config
    }

    async fn run_sql(&self, sql: &str, _params: &[DatabaseValue]) -> DriverResult<()> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(())
    }

    async fn all(&self, sql: &str, _params: &[DatabaseValue]) -> DriverResult<Vec<Box<dyn DatabaseRow>>> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(Vec::new())
    }

    fn create_column_constraint(&self, _spec: &ColumnSpec, _options: &ColumnDefOptions) -> String {
        String::new()
    }

    async fn close(&self) -> DriverResult<()> {
        Ok(())
    }
}
