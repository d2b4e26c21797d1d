//! JSON rendering of execution results
//!
//! Results are serialized with their `type` tag, compact or pretty, and
//! optionally colored for terminals.

use colored_json::prelude::*;

use crate::error::Result;
use crate::executor::ExecutionResult;

/// JSON formatter with pretty printing support
pub struct JsonFormatter {
    /// Enable pretty printing
    pretty: bool,

    /// Enable colored output
    use_colors: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    ///
    /// # Arguments
    /// * `pretty` - Enable pretty printing
    /// * `use_colors` - Enable colored output
    pub fn new(pretty: bool, use_colors: bool) -> Self {
        Self { pretty, use_colors }
    }

    /// Format a result as JSON
    ///
    /// # Arguments
    /// * `result` - Result to format
    ///
    /// # Returns
    /// * `Result<String>` - JSON string or error
    pub fn format(&self, result: &ExecutionResult) -> Result<String> {
        let json_str = if self.pretty {
            serde_json::to_string_pretty(result)
        } else {
            serde_json::to_string(result)
        }
        .map_err(|e| format!("Cannot serialize result: {e}"))?;

        if self.use_colors {
            Ok(json_str.to_colored_json_auto().unwrap_or(json_str))
        } else {
            Ok(json_str)
        }
    }
}
