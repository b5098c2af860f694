//! Migration Definitions - Ledger record and table shape

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::backends::{DatabaseRow, DatabaseRowExt, DatabaseValue};
use crate::data_type::LogicalType;
use crate::error::{DriverError, DriverResult};

use super::column::ColumnSpec;
use super::schema_builder::TableSpec;

/// A row of the migrations ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Auto-increment key
    pub id: i64,
    /// Migration name
    pub name: String,
    /// When the migration was applied
    pub run_on: DateTime<Utc>,
}

impl MigrationRecord {
    /// Decode a ledger row
    ///
    /// `run_on` is stored with whatever type the dialect maps `DATE_TIME` to,
    /// so native datetimes, RFC 3339 or `YYYY-MM-DD HH:MM:SS` text and epoch
    /// milliseconds are all accepted.
    pub fn from_row(row: &dyn DatabaseRow) -> DriverResult<Self> {
        let id: i64 = row.get("id")?;
        let name: String = row.get("name")?;
        let run_on = parse_run_on(row.get_by_name("run_on")?)?;

        Ok(Self { id, name, run_on })
    }
}

fn parse_run_on(value: DatabaseValue) -> DriverResult<DateTime<Utc>> {
    match value {
        DatabaseValue::DateTime(dt) => Ok(dt),
        DatabaseValue::Int64(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| DriverError::Decode(format!("run_on {} is out of range", millis))),
        DatabaseValue::Int32(millis) => parse_run_on(DatabaseValue::Int64(millis.into())),
        DatabaseValue::String(text) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f").map(|naive| naive.and_utc())
            })
            .map_err(|e| DriverError::Decode(format!("Invalid run_on '{}': {}", text, e))),
        other => Err(DriverError::Decode(format!(
            "Unsupported run_on value: {:?}",
            other
        ))),
    }
}

/// The fixed shape of the ledger table, created with `IF NOT EXISTS`
pub fn ledger_table_spec(table_name: &str) -> TableSpec {
    TableSpec::new(table_name)
        .if_not_exists()
        .column(
            "id",
            ColumnSpec::new(LogicalType::Integer)
                .not_null()
                .primary_key()
                .auto_increment(),
        )
        .column("name", ColumnSpec::new(LogicalType::String).length(255).not_null())
        .column("run_on", ColumnSpec::new(LogicalType::DateTime).not_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MapRow;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_record_from_native_datetime() {
        let row = MapRow::new()
            .with("id", 1i64)
            .with("name", "20240101-init")
            .with("run_on", at(1_704_067_200));

        let record = MigrationRecord::from_row(&row).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.name, "20240101-init");
        assert_eq!(record.run_on, at(1_704_067_200));
    }

    #[test]
    fn test_record_from_text_and_millis() {
        let rfc = MapRow::new()
            .with("id", 2i32)
            .with("name", "m")
            .with("run_on", "2024-01-01T00:00:00+00:00");
        assert_eq!(MigrationRecord::from_row(&rfc).unwrap().run_on, at(1_704_067_200));

        let plain = MapRow::new()
            .with("id", 3i64)
            .with("name", "m")
            .with("run_on", "2024-01-01 00:00:00");
        assert_eq!(MigrationRecord::from_row(&plain).unwrap().run_on, at(1_704_067_200));

        let millis = MapRow::new()
            .with("id", 4i64)
            .with("name", "m")
            .with("run_on", 1_704_067_200_000i64);
        assert_eq!(MigrationRecord::from_row(&millis).unwrap().run_on, at(1_704_067_200));
    }

    #[test]
    fn test_record_rejects_garbage() {
        let row = MapRow::new()
            .with("id", 1i64)
            .with("name", "m")
            .with("run_on", true);
        assert!(matches!(MigrationRecord::from_row(&row), Err(DriverError::Decode(_))));

        let row = MapRow::new().with("id", 1i64).with("run_on", "2024-01-01 00:00:00");
        assert!(MigrationRecord::from_row(&row).is_err());
    }

    #[test]
    fn test_ledger_table_shape() {
        let spec = ledger_table_spec("migrations");
        assert!(spec.if_not_exists);
        assert_eq!(spec.primary_key_columns(), vec!["id"]);
        let names: Vec<&str> = spec.columns.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "run_on"]);
        assert_eq!(spec.columns[1].1.length, Some(255));
    }
}
