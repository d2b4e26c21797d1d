//! Execution result types
//!
//! Every dispatcher path returns an [`ExecutionResult`]. Failures are a
//! variant of the result, not an `Err`, so callers tell success from failure
//! by inspecting the tag alone. All variants serialize to JSON.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Uniform result of running one command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExecutionResult {
    /// Tabular rows from a SQL read
    Rows {
        columns: Vec<String>,
        data: Vec<Vec<JsonValue>>,
    },

    /// Affected-row count from a SQL write
    RowCount { n: u64 },

    /// Documents or plain values from a document-store read
    Documents { items: Vec<JsonValue> },

    /// Structured confirmation of a mutation
    Acknowledgement { fields: Map<String, JsonValue> },

    /// Scalar count
    ScalarCount { n: u64 },

    /// Any failure, described for the user
    Error { message: String },
}

impl ExecutionResult {
    /// Create a failed result
    pub fn error(message: impl Into<String>) -> Self {
        ExecutionResult::Error {
            message: message.into(),
        }
    }

    /// Build an acknowledgement from ordered key/value pairs
    pub fn acknowledgement<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        ExecutionResult::Acknowledgement {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Whether this result reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionResult::Error { .. })
    }

    /// Number of items carried (rows, documents) or the count itself
    pub fn len(&self) -> u64 {
        match self {
            ExecutionResult::Rows { data, .. } => data.len() as u64,
            ExecutionResult::Documents { items } => items.len() as u64,
            ExecutionResult::RowCount { n } | ExecutionResult::ScalarCount { n } => *n,
            ExecutionResult::Acknowledgement { .. } | ExecutionResult::Error { .. } => 0,
        }
    }

    /// True when [`len`](Self::len) is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_helpers() {
        let result = ExecutionResult::error("boom");
        assert!(result.is_error());
        assert_eq!(
            result,
            ExecutionResult::Error {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_acknowledgement_keeps_field_order() {
        let ack = ExecutionResult::acknowledgement([
            ("acknowledged", json!(true)),
            ("matchedCount", json!(2)),
            ("modifiedCount", json!(1)),
        ]);
        let text = serde_json::to_string(&ack).unwrap();
        assert_eq!(
            text,
            r#"{"type":"acknowledgement","fields":{"acknowledged":true,"matchedCount":2,"modifiedCount":1}}"#
        );
    }

    #[test]
    fn test_rows_serialization() {
        let rows = ExecutionResult::Rows {
            columns: vec!["id".to_string()],
            data: vec![vec![json!(1)], vec![json!(2)]],
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!({"type": "rows", "columns": ["id"], "data": [[1], [2]]})
        );
    }

    #[test]
    fn test_counts() {
        assert!(ExecutionResult::RowCount { n: 0 }.is_empty());
        assert_eq!(ExecutionResult::ScalarCount { n: 7 }.len(), 7);
    }
}
