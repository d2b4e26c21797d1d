//! Interpreter facade
//!
//! The [`Interpreter`] takes raw generated text plus its kind, resolves the
//! target logical database, and routes it:
//! - SQL → normalizer → [`SqlDispatcher`]
//! - Mongo → shell parser → [`MongoDispatcher`]
//!
//! Whatever happens, the caller gets an [`ExecutionResult`] back.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use super::mongo::{DocumentStore, MongoDispatcher, MongoStore};
use super::result::ExecutionResult;
use crate::catalog::{DatabaseCatalog, LogicalDatabase, detect};
use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::ConfigError;
use crate::parser::Parser;
use crate::sql::{MySqlBackend, SqlBackend, SqlDispatcher, normalize};

/// Which language a raw command is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Sql,
    Mongo,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Sql => f.write_str("sql"),
            CommandKind::Mongo => f.write_str("mongo"),
        }
    }
}

impl FromStr for CommandKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sql" | "mysql" => Ok(CommandKind::Sql),
            "mongo" | "mongodb" => Ok(CommandKind::Mongo),
            _ => Err(ConfigError::InvalidValue {
                field: "kind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Generated command text and its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub text: String,
    pub kind: CommandKind,
}

impl RawCommand {
    pub fn sql(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CommandKind::Sql,
        }
    }

    pub fn mongo(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CommandKind::Mongo,
        }
    }
}

/// Entry point: raw command in, [`ExecutionResult`] out
#[derive(Clone)]
pub struct Interpreter {
    sql: SqlDispatcher,
    mongo: MongoDispatcher,
    parser: Arc<Parser>,
}

impl Interpreter {
    /// Build an interpreter over explicit backends
    ///
    /// # Arguments
    /// * `sql_backend` - Relational store
    /// * `document_store` - Document store
    /// * `catalog` - Logical database bindings
    pub fn new(
        sql_backend: Arc<dyn SqlBackend>,
        document_store: Arc<dyn DocumentStore>,
        catalog: DatabaseCatalog,
    ) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            sql: SqlDispatcher::new(sql_backend, catalog.clone()),
            mongo: MongoDispatcher::new(document_store, catalog),
            parser: Arc::new(Parser::new()),
        }
    }

    /// Build an interpreter talking to MySQL and MongoDB as configured
    ///
    /// No connection is opened until a command runs.
    pub fn from_config(config: &Config) -> Self {
        let connections = Arc::new(ConnectionManager::new(config.connection.clone()));
        Self::new(
            Arc::new(MySqlBackend::new(connections.clone())),
            Arc::new(MongoStore::new(connections)),
            config.database_catalog(),
        )
    }

    /// Run one command
    ///
    /// # Arguments
    /// * `command` - Generated text and its kind
    /// * `database` - Explicit target; when `None`, detected from the text
    ///
    /// # Returns
    /// * `ExecutionResult` - Never an `Err`; failures are the `Error` variant
    pub async fn run(
        &self,
        command: &RawCommand,
        database: Option<LogicalDatabase>,
    ) -> ExecutionResult {
        let request_id = Uuid::new_v4();
        let resolved = database.or_else(|| detect(&command.text));
        let span = info_span!(
            "run",
            request_id = %request_id,
            kind = %command.kind,
            database = resolved.map(|db| db.name()).unwrap_or("none"),
        );

        async move {
            let Some(db) = resolved else {
                info!("No logical database selected or detected");
                return ExecutionResult::error(
                    "No database selected: name Bike Store, AdventureWorks or FIFA",
                );
            };

            let start = Instant::now();
            let result = match command.kind {
                CommandKind::Sql => {
                    let sql = normalize(&command.text);
                    debug!("Normalized SQL: {}", sql);
                    self.sql.execute(&sql, db).await
                }
                CommandKind::Mongo => match self.parser.parse(&command.text) {
                    Ok(parsed) => self.mongo.execute(&parsed, db).await,
                    Err(e) => {
                        info!("Rejected shell command: {}", e);
                        ExecutionResult::error(e.to_string())
                    }
                },
            };

            debug!(
                "Finished in {} ms (error: {})",
                start.elapsed().as_millis(),
                result.is_error()
            );
            result
        }
        .instrument(span)
        .await
    }
}
