use std::{fmt, io};

use super::backend::{describe_mongodb_error, describe_sqlx_error};

/// Crate-wide `Result` type using [`NlqError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, NlqError>;

/// Top-level error type for the interpreter.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum NlqError {
    /// Shell-syntax parsing errors.
    Parse(ParseError),

    /// Dispatch and execution errors.
    Execution(ExecutionError),

    /// Connection-related errors.
    Connection(ConnectionError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),

    /// MySQL driver errors.
    Sql(sqlx::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Parsing-specific errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Syntax error in a literal or call.
    SyntaxError(String),

    /// Invalid command format (missing `db.` prefix, empty input, ...).
    InvalidCommand(String),

    /// Unexpected token while parsing.
    UnexpectedToken { expected: String, found: String },

    /// A `(`, `{`, `[` or quote was never closed.
    UnbalancedDelimiter(char),

    /// An argument has the wrong shape for its operation.
    InvalidArgument { operation: String, message: String },
}

/// Execution-specific errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The logical database has no binding in the catalog.
    InvalidDatabase(String),

    /// Well-formed call with an unrecognized method name.
    UnsupportedOperation(String),

    /// Collection is not in the logical database's allow-list.
    UnknownCollection { database: String, collection: String },

    /// The store rejected or failed the operation.
    Backend(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Invalid connection URI.
    InvalidUri(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for NlqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NlqError::Parse(e) => write!(f, "{e}"),
            NlqError::Execution(e) => write!(f, "{e}"),
            NlqError::Connection(e) => write!(f, "Connection error: {e}"),
            NlqError::Config(e) => write!(f, "Configuration error: {e}"),
            NlqError::Io(e) => write!(f, "I/O error: {e}"),
            NlqError::MongoDb(e) => write!(f, "{}", describe_mongodb_error(e)),
            NlqError::Sql(e) => write!(f, "{}", describe_sqlx_error(e)),
            NlqError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::SyntaxError(msg) => write!(f, "Syntax error: {msg}"),
            ParseError::InvalidCommand(cmd) => write!(f, "Invalid command: {cmd}"),
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "Expected '{expected}', found '{found}'")
            }
            ParseError::UnbalancedDelimiter(ch) => write!(f, "Unbalanced delimiter: '{ch}'"),
            ParseError::InvalidArgument { operation, message } => {
                write!(f, "Invalid arguments for {operation}: {message}")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::InvalidDatabase(name) => write!(f, "Invalid database: {name}"),
            ExecutionError::UnsupportedOperation(op) => {
                write!(f, "Unsupported operation: {op}")
            }
            ExecutionError::UnknownCollection {
                database,
                collection,
            } => write!(f, "Collection '{collection}' is not part of {database}"),
            ExecutionError::Backend(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for NlqError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to NlqError ========================= */

impl From<io::Error> for NlqError {
    fn from(err: io::Error) -> Self {
        NlqError::Io(err)
    }
}

impl From<mongodb::error::Error> for NlqError {
    fn from(err: mongodb::error::Error) -> Self {
        NlqError::MongoDb(err)
    }
}

impl From<sqlx::Error> for NlqError {
    fn from(err: sqlx::Error) -> Self {
        NlqError::Sql(err)
    }
}

impl From<toml::de::Error> for NlqError {
    fn from(err: toml::de::Error) -> Self {
        NlqError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<ParseError> for NlqError {
    fn from(err: ParseError) -> Self {
        NlqError::Parse(err)
    }
}

impl From<ExecutionError> for NlqError {
    fn from(err: ExecutionError) -> Self {
        NlqError::Execution(err)
    }
}

impl From<ConnectionError> for NlqError {
    fn from(err: ConnectionError) -> Self {
        NlqError::Connection(err)
    }
}

impl From<ConfigError> for NlqError {
    fn from(err: ConfigError) -> Self {
        NlqError::Config(err)
    }
}

impl From<String> for NlqError {
    fn from(msg: String) -> Self {
        NlqError::Generic(msg)
    }
}

impl From<&str> for NlqError {
    fn from(msg: &str) -> Self {
        NlqError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err: NlqError = ParseError::UnbalancedDelimiter('(').into();
        assert_eq!(err.to_string(), "Unbalanced delimiter: '('");

        let err = ParseError::UnexpectedToken {
            expected: ")".to_string(),
            found: "end of input".to_string(),
        };
        assert_eq!(err.to_string(), "Expected ')', found 'end of input'");
    }

    #[test]
    fn test_execution_error_display() {
        let err: NlqError = ExecutionError::InvalidDatabase("FIFA".to_string()).into();
        assert_eq!(err.to_string(), "Invalid database: FIFA");

        let err = ExecutionError::UnknownCollection {
            database: "Bike Store".to_string(),
            collection: "brands".to_string(),
        };
        assert_eq!(err.to_string(), "Collection 'brands' is not part of Bike Store");
    }

    #[test]
    fn test_toml_error_becomes_config_error() {
        let err = toml::from_str::<toml::Table>("a = ").unwrap_err();
        let err: NlqError = err.into();
        assert!(matches!(err, NlqError::Config(ConfigError::InvalidFormat(_))));
    }
}
