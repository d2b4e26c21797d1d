//! One-line descriptions of driver failures.
//!
//! Backend faults never escape the dispatchers; they are reported as a
//! message string inside `ExecutionResult::Error`. These helpers pull the
//! useful parts (code, server message) out of the typed driver errors instead
//! of relying on their verbose `Display` output.

/// Describe a MongoDB driver error as a single line.
pub fn describe_mongodb_error(error: &mongodb::error::Error) -> String {
    use mongodb::error::{ErrorKind, WriteFailure};

    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            with_code(write_error.code, &write_error.message)
        }
        ErrorKind::Write(WriteFailure::WriteConcernError(wc_error)) => {
            with_code(wc_error.code, &wc_error.message)
        }
        ErrorKind::Command(command_error) => with_code(command_error.code, &command_error.message),
        ErrorKind::InsertMany(insert_error) => {
            if let Some(errors) = insert_error.write_errors.as_ref().filter(|e| !e.is_empty()) {
                let first = &errors[0];
                format!(
                    "{} (document #{}, {} write error(s))",
                    with_code(first.code, &first.message),
                    first.index,
                    errors.len()
                )
            } else if let Some(wc_error) = &insert_error.write_concern_error {
                with_code(wc_error.code, &wc_error.message)
            } else {
                error.to_string()
            }
        }
        ErrorKind::Authentication { message, .. } => format!("Authentication failed: {message}"),
        ErrorKind::InvalidArgument { message, .. } => format!("Invalid argument: {message}"),
        ErrorKind::ServerSelection { message, .. } => {
            format!("Cannot reach MongoDB server: {message}")
        }
        _ => error.to_string(),
    }
}

/// Describe a MySQL driver error as a single line.
pub fn describe_sqlx_error(error: &sqlx::Error) -> String {
    match error {
        sqlx::Error::Database(db_error) => match db_error.code() {
            Some(code) => format!("({code}) {}", db_error.message()),
            None => db_error.message().to_string(),
        },
        sqlx::Error::Io(io_error) => format!("Cannot reach MySQL server: {io_error}"),
        sqlx::Error::PoolTimedOut => "Timed out waiting for a MySQL connection".to_string(),
        other => other.to_string(),
    }
}

/// Prefix a server message with its symbolic name when the code is known.
fn with_code(code: i32, message: &str) -> String {
    match error_name(code) {
        Some(name) => format!("{name} ({code}): {message}"),
        None => format!("({code}) {message}"),
    }
}

/// Human-readable name for common MongoDB error codes.
fn error_name(code: i32) -> Option<&'static str> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_code_known_name() {
        assert_eq!(
            with_code(11000, "E11000 duplicate key"),
            "DuplicateKey (11000): E11000 duplicate key"
        );
    }

    #[test]
    fn test_with_code_unknown_name() {
        assert_eq!(with_code(2, "bad value"), "(2) bad value");
    }

    #[test]
    fn test_describe_sqlx_pool_timeout() {
        let msg = describe_sqlx_error(&sqlx::Error::PoolTimedOut);
        assert!(msg.contains("Timed out"));
    }
}
