//! SQL dispatcher
//!
//! Resolves a logical database to its relational schema, classifies the
//! statement as a read or a write by its first keyword, and runs it on a
//! [`SqlBackend`]. Every failure becomes an `ExecutionResult::Error`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::catalog::{DatabaseCatalog, LogicalDatabase};
use crate::error::{ParseError, Result};
use crate::executor::ExecutionResult;

/// Statements whose first keyword marks them as row-returning
const READ_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Column names plus rows of JSON cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

/// A relational store the dispatcher can run statements on
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Run a row-returning statement against `schema`
    ///
    /// Column names come from result metadata, so an empty result still
    /// carries its columns.
    async fn query(&self, schema: &str, sql: &str) -> Result<TabularData>;

    /// Run a write statement against `schema`, commit, and return the number
    /// of affected rows. A failed statement is rolled back.
    async fn execute(&self, schema: &str, sql: &str) -> Result<u64>;
}

/// Read or write, decided by the first keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

/// Classify a statement by its first keyword, case-insensitively
pub fn classify(sql: &str) -> StatementKind {
    let first = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();

    if READ_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(first))
    {
        StatementKind::Read
    } else {
        StatementKind::Write
    }
}

/// Runs normalized SQL against the schema bound to a logical database
#[derive(Clone)]
pub struct SqlDispatcher {
    backend: Arc<dyn SqlBackend>,
    catalog: Arc<DatabaseCatalog>,
}

impl SqlDispatcher {
    /// Create a dispatcher over a backend and catalog
    pub fn new(backend: Arc<dyn SqlBackend>, catalog: Arc<DatabaseCatalog>) -> Self {
        Self { backend, catalog }
    }

    /// Execute a normalized statement; never fails
    ///
    /// # Arguments
    /// * `normalized_sql` - Output of the normalizer
    /// * `db` - Target logical database
    ///
    /// # Returns
    /// * `ExecutionResult` - Rows, RowCount, or Error
    pub async fn execute(&self, normalized_sql: &str, db: LogicalDatabase) -> ExecutionResult {
        match self.try_execute(normalized_sql, db).await {
            Ok(result) => result,
            Err(e) => {
                warn!("SQL execution on {} failed: {}", db, e);
                ExecutionResult::error(e.to_string())
            }
        }
    }

    async fn try_execute(&self, sql: &str, db: LogicalDatabase) -> Result<ExecutionResult> {
        let schema = self.catalog.schema(db)?;
        let sql = sql.trim();

        if sql.is_empty() {
            return Err(ParseError::InvalidCommand("Empty SQL statement".to_string()).into());
        }

        match classify(sql) {
            StatementKind::Read => {
                info!("Running SQL read on schema '{}'", schema);
                let data = self.backend.query(schema, sql).await?;
                debug!("SQL read returned {} row(s)", data.rows.len());
                Ok(ExecutionResult::Rows {
                    columns: data.columns,
                    data: data.rows,
                })
            }
            StatementKind::Write => {
                info!("Running SQL write on schema '{}'", schema);
                let n = self.backend.execute(schema, sql).await?;
                debug!("SQL write affected {} row(s)", n);
                Ok(ExecutionResult::RowCount { n })
            }
        }
    }
}
