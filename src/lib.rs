//! nlquery - interpreter for generated SQL and MongoDB shell commands
//!
//! Takes the text a language model produced for a question about one of the
//! logical databases (Bike Store, AdventureWorks, FIFA) and runs it:
//! - SQL is normalized to the MySQL dialect and run on the bound schema
//! - MongoDB shell syntax is parsed into a typed command and run on the
//!   bound document database
//!
//! Every run yields an [`ExecutionResult`]; failures are a variant of it.
//!
//! # Example
//!
//! ```rust,no_run
//! use nlquery::{Config, Interpreter, RawCommand};
//!
//! # async fn demo() {
//! let interpreter = Interpreter::from_config(&Config::default());
//! let result = interpreter
//!     .run(&RawCommand::sql("SELECT first_name || ' ' || last_name FROM customers -- bike store"), None)
//!     .await;
//! println!("{}", serde_json::to_string(&result).unwrap());
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod parser;
pub mod sql;
pub mod utils;

// Re-export commonly used types
pub use catalog::{DatabaseCatalog, LogicalDatabase, detect};
pub use config::Config;
pub use error::{NlqError, Result};
pub use executor::{CommandKind, ExecutionResult, Interpreter, RawCommand};
pub use formatter::Formatter;
pub use parser::{ParsedMongoCommand, Parser, ShellCommand};
pub use sql::normalize;
