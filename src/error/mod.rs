//! Error handling for the interpreter.
//!
//! This module provides:
//! - The crate-wide error type [`NlqError`] and its more specific kinds
//! - One-line descriptions of MongoDB and MySQL driver failures, used when a
//!   backend fault is folded into an `ExecutionResult::Error`
//!
//! # Example
//!
//! ```rust,no_run
//! use nlquery::error::{NlqError, ParseError, Result};
//!
//! fn reject(input: &str) -> Result<()> {
//!     Err(ParseError::InvalidCommand(input.to_string()).into())
//! }
//!
//! let err: NlqError = reject("db").unwrap_err();
//! println!("{err}");
//! ```

pub mod backend;
pub mod kinds;

// Re-export commonly used types
pub use backend::{describe_mongodb_error, describe_sqlx_error};
pub use kinds::{ConfigError, ConnectionError, ExecutionError, NlqError, ParseError, Result};
