//! Output formatting for execution results
//!
//! - JSON (compact or pretty, optionally colored) for every result
//! - Tables for SQL rows and document lists; other results fall back to JSON

pub mod json;
pub mod table;

pub use json::JsonFormatter;
pub use table::TableFormatter;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::executor::ExecutionResult;

/// Main formatter for execution results
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// Enable colored output
    use_colors: bool,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    /// * `use_colors` - Enable colored output
    pub fn new(format_type: OutputFormat, use_colors: bool) -> Self {
        Self {
            format_type,
            use_colors,
        }
    }

    /// Render a result in the configured format
    pub fn format(&self, result: &ExecutionResult) -> Result<String> {
        match self.format_type {
            OutputFormat::Json => JsonFormatter::new(false, self.use_colors).format(result),
            OutputFormat::JsonPretty => JsonFormatter::new(true, self.use_colors).format(result),
            OutputFormat::Table => match result {
                ExecutionResult::Rows { columns, data } => {
                    Ok(TableFormatter::new(self.use_colors).format_rows(columns, data))
                }
                ExecutionResult::Documents { items } => {
                    Ok(TableFormatter::new(self.use_colors).format_documents(items))
                }
                other => JsonFormatter::new(true, self.use_colors).format(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_falls_back_to_json() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format(&ExecutionResult::RowCount { n: 3 }).unwrap();
        assert_eq!(output, "{\n  \"type\": \"rowCount\",\n  \"n\": 3\n}");
    }

    #[test]
    fn test_compact_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format(&ExecutionResult::RowCount { n: 0 }).unwrap();
        assert_eq!(output, r#"{"type":"rowCount","n":0}"#);
    }
}
