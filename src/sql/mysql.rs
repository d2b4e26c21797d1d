//! MySQL backend on `sqlx`
//!
//! Statements run through the text protocol so anything the server accepts
//! (including statements MySQL refuses to prepare) works. Cells are decoded
//! to JSON by their column type name.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Value as JsonValue, json};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::dispatcher::{SqlBackend, TabularData};
use crate::connection::ConnectionManager;
use crate::error::Result;

/// [`SqlBackend`] talking to a MySQL server
pub struct MySqlBackend {
    connections: Arc<ConnectionManager>,
}

impl MySqlBackend {
    /// Create a backend drawing connections from `connections`
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl SqlBackend for MySqlBackend {
    async fn query(&self, schema: &str, sql: &str) -> Result<TabularData> {
        let mut handle = self.connections.mysql(schema).await?;
        let conn: &mut MySqlConnection = &mut handle;
        let result = fetch_table(conn, sql).await;
        handle.release().await;
        result
    }

    async fn execute(&self, schema: &str, sql: &str) -> Result<u64> {
        let mut handle = self.connections.mysql(schema).await?;
        let conn: &mut MySqlConnection = &mut handle;
        let result = execute_committed(conn, sql).await;
        handle.release().await;
        result
    }
}

async fn fetch_table(conn: &mut MySqlConnection, sql: &str) -> Result<TabularData> {
    let rows: Vec<MySqlRow> = (&mut *conn).fetch_all(sqlx::raw_sql(sql)).await?;

    let columns = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        // No rows to read names from; ask the server to describe the statement
        None => match (&mut *conn).describe(sql).await {
            Ok(described) => described
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(e) => {
                debug!("Could not describe empty result: {}", e);
                Vec::new()
            }
        },
    };

    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| cell_to_json(row, i)).collect())
        .collect();

    Ok(TabularData { columns, rows })
}

async fn execute_committed(conn: &mut MySqlConnection, sql: &str) -> Result<u64> {
    let mut tx = conn.begin().await?;

    let inner: &mut MySqlConnection = &mut tx;
    match inner.execute(sqlx::raw_sql(sql)).await {
        Ok(done) => {
            tx.commit().await?;
            Ok(done.rows_affected())
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                debug!("Rollback failed: {}", rollback_error);
            }
            Err(e.into())
        }
    }
}

/// How a column's values are turned into JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
    Binary,
    Text,
}

fn cell_kind(type_name: &str) -> CellKind {
    let upper = type_name.to_ascii_uppercase();
    let base = upper.split_whitespace().next().unwrap_or_default();
    let unsigned = upper.ends_with("UNSIGNED");

    match base {
        "BOOLEAN" | "BOOL" => CellKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" if unsigned => {
            CellKind::Unsigned
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            CellKind::Signed
        }
        "FLOAT" => CellKind::Float,
        "DOUBLE" | "REAL" => CellKind::Double,
        "DECIMAL" | "NUMERIC" => CellKind::Decimal,
        "DATE" => CellKind::Date,
        "TIME" => CellKind::Time,
        "DATETIME" => CellKind::DateTime,
        "TIMESTAMP" => CellKind::Timestamp,
        "JSON" => CellKind::Json,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => CellKind::Binary,
        _ => CellKind::Text,
    }
}

/// Decode one cell; NULL and undecodable values become JSON null
fn cell_to_json(row: &MySqlRow, index: usize) -> JsonValue {
    let kind = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return JsonValue::Null,
        Ok(raw) => cell_kind(raw.type_info().name()),
        Err(_) => return JsonValue::Null,
    };

    match decode_cell(row, index, kind) {
        Ok(value) => value,
        Err(e) => {
            debug!("Could not decode column {} as {:?}: {}", index, kind, e);
            JsonValue::Null
        }
    }
}

fn decode_cell(row: &MySqlRow, index: usize, kind: CellKind) -> sqlx::Result<JsonValue> {
    let value = match kind {
        CellKind::Bool => json!(row.try_get_unchecked::<bool, _>(index)?),
        CellKind::Signed => json!(row.try_get_unchecked::<i64, _>(index)?),
        CellKind::Unsigned => json!(row.try_get_unchecked::<u64, _>(index)?),
        CellKind::Float => json!(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        CellKind::Double => json!(row.try_get_unchecked::<f64, _>(index)?),
        // Exact decimals stay strings
        CellKind::Decimal => json!(row.try_get_unchecked::<String, _>(index)?),
        CellKind::Date => json!(row.try_get_unchecked::<NaiveDate, _>(index)?.to_string()),
        CellKind::Time => json!(row.try_get_unchecked::<NaiveTime, _>(index)?.to_string()),
        CellKind::DateTime => {
            json!(row.try_get_unchecked::<NaiveDateTime, _>(index)?.to_string())
        }
        CellKind::Timestamp => {
            json!(row.try_get_unchecked::<DateTime<Utc>, _>(index)?.to_rfc3339())
        }
        CellKind::Json => {
            let text = row.try_get_unchecked::<String, _>(index)?;
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        }
        CellKind::Binary => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            json!(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        CellKind::Text => json!(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_kind_integers() {
        assert_eq!(cell_kind("INT"), CellKind::Signed);
        assert_eq!(cell_kind("BIGINT"), CellKind::Signed);
        assert_eq!(cell_kind("INT UNSIGNED"), CellKind::Unsigned);
        assert_eq!(cell_kind("tinyint unsigned"), CellKind::Unsigned);
        assert_eq!(cell_kind("YEAR"), CellKind::Signed);
        assert_eq!(cell_kind("BOOLEAN"), CellKind::Bool);
    }

    #[test]
    fn test_cell_kind_numbers_and_dates() {
        assert_eq!(cell_kind("DECIMAL"), CellKind::Decimal);
        assert_eq!(cell_kind("DOUBLE"), CellKind::Double);
        assert_eq!(cell_kind("FLOAT"), CellKind::Float);
        assert_eq!(cell_kind("DATE"), CellKind::Date);
        assert_eq!(cell_kind("DATETIME"), CellKind::DateTime);
        assert_eq!(cell_kind("TIMESTAMP"), CellKind::Timestamp);
    }

    #[test]
    fn test_cell_kind_text_and_binary() {
        assert_eq!(cell_kind("VARCHAR"), CellKind::Text);
        assert_eq!(cell_kind("ENUM"), CellKind::Text);
        assert_eq!(cell_kind("LONGBLOB"), CellKind::Binary);
        assert_eq!(cell_kind("VARBINARY"), CellKind::Binary);
        assert_eq!(cell_kind("JSON"), CellKind::Json);
        assert_eq!(cell_kind(""), CellKind::Text);
    }
}
