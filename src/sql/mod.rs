//! SQL path: cleanup of generated statements and dispatch to MySQL
//!
//! - [`normalizer`] turns model output into one runnable statement
//! - [`dispatcher`] classifies it and runs it against the bound schema
//! - [`mysql`] is the `sqlx` backend used outside tests

pub mod dispatcher;
pub mod mysql;
pub mod normalizer;

pub use dispatcher::{SqlBackend, SqlDispatcher, StatementKind, TabularData, classify};
pub use mysql::MySqlBackend;
pub use normalizer::normalize;
