//! Mongo shell-syntax parser
//!
//! Turns generated shell text such as
//! `db.products.find({brand: 'Trek'}).sort({list_price: -1}).limit(5)` into a
//! typed [`ShellCommand`].
//!
//! # Architecture
//!
//! - `mongo_lexer`: flat token stream (strings are single tokens, so `.` and
//!   `(` inside literals never split the chain)
//! - `mongo_ast`: call-chain AST
//! - `mongo_parser`: recursive-descent parser over the tokens
//! - `expr_converter`: literal → BSON conversion and shell re-serialization
//! - `command`: `ShellCommand`, `ParsedMongoCommand`, operation validation
//!
//! # Examples
//!
//! ```no_run
//! use nlquery::parser::{Parser, ShellCommand};
//!
//! let parser = Parser::new();
//! let cmd = parser.parse("db.players.find({ nationality: 'Brazil' }).limit(3)").unwrap();
//! assert!(matches!(cmd, ShellCommand::Collection(_)));
//! ```

mod command;
mod expr_converter;
pub mod mongo_ast;
pub mod mongo_lexer;
pub mod mongo_parser;

// Re-export public API
pub use command::*;
pub use expr_converter::render_value;

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::utils::text::strip_code_fences;
use mongo_ast::Statement;
use mongo_parser::MongoParser;

/// Exact text of the collection listing command
const LIST_COLLECTIONS: &str = "db.getCollectionNames()";

/// Parser for Mongo shell commands
pub struct Parser {}

impl Parser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self {}
    }

    /// Parse an input string into a ShellCommand
    ///
    /// Code fences and trailing semicolons around generated text are removed
    /// first. `db.getCollectionNames()` is recognized before tokenizing.
    ///
    /// # Arguments
    ///
    /// * `input` - The shell text to parse
    ///
    /// # Returns
    ///
    /// * `Result<ShellCommand>` - The parsed command, or a parse /
    ///   unsupported-operation error
    pub fn parse(&self, input: &str) -> Result<ShellCommand> {
        let stripped = strip_code_fences(input);
        let trimmed = stripped.trim().trim_end_matches(';').trim();

        if trimmed.is_empty() {
            return Err(ParseError::InvalidCommand("Empty input".to_string()).into());
        }

        if trimmed == LIST_COLLECTIONS {
            return Ok(ShellCommand::ListCollections);
        }

        let command = match MongoParser::parse(trimmed)? {
            Statement::ListCollections(_) => ShellCommand::ListCollections,
            Statement::Chain(chain) => ShellCommand::Collection(ParsedMongoCommand::from_chain(chain)?),
        };

        debug!("Parsed shell command: {}", command);
        Ok(command)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse shell text with a default [`Parser`]
pub fn parse(input: &str) -> Result<ShellCommand> {
    Parser::new().parse(input)
}
