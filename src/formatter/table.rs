//! Table rendering of rows and documents using tabled
//!
//! SQL rows keep their column order. Document columns are the union of the
//! documents' keys in first-seen order; non-object items go in a single
//! `value` column.

use serde_json::Value as JsonValue;
use tabled::{
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Table formatter for tabular results
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Enable colored output
    use_colors: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    ///
    /// # Arguments
    /// * `use_colors` - Color the header row
    pub fn new(use_colors: bool) -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            use_colors,
        }
    }

    /// Render SQL rows under their column names
    pub fn format_rows(&self, columns: &[String], rows: &[Vec<JsonValue>]) -> String {
        if rows.is_empty() {
            return "(empty result set)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(columns.iter().cloned());
        for row in rows {
            builder.push_record(row.iter().map(cell_text));
        }
        self.render(builder, columns.len())
    }

    /// Render documents, one row each
    pub fn format_documents(&self, items: &[JsonValue]) -> String {
        if items.is_empty() {
            return "(empty result set)".to_string();
        }

        let fields = extract_field_names(items);
        let mut builder = Builder::default();
        builder.push_record(fields.iter().cloned());
        for item in items {
            let row: Vec<String> = match item {
                JsonValue::Object(map) => fields
                    .iter()
                    .map(|field| map.get(field).map(cell_text).unwrap_or_default())
                    .collect(),
                other => fields
                    .iter()
                    .map(|field| if field == "value" { cell_text(other) } else { String::new() })
                    .collect(),
            };
            builder.push_record(row);
        }
        self.render(builder, fields.len())
    }

    fn render(&self, builder: Builder, width: usize) -> String {
        let mut table = builder.build();
        table.with(Style::modern());

        for i in 0..width {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }

        table.to_string()
    }
}

/// Union of object keys in first-seen order, `value` for scalars
fn extract_field_names(items: &[JsonValue]) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let mut has_scalars = false;

    for item in items {
        match item {
            JsonValue::Object(map) => {
                for key in map.keys() {
                    if !fields.contains(key) {
                        fields.push(key.clone());
                    }
                }
            }
            _ => has_scalars = true,
        }
    }

    if has_scalars && !fields.iter().any(|f| f == "value") {
        fields.push("value".to_string());
    }
    fields
}

/// Cell text: strings unquoted, null empty, everything else as JSON
fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_first_seen_order() {
        let items = vec![json!({"b": 1, "a": 2}), json!({"c": 3, "a": 4})];
        assert_eq!(extract_field_names(&items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_scalars_use_value_column() {
        let items = vec![json!("players"), json!("matches")];
        assert_eq!(extract_field_names(&items), vec!["value"]);
        let output = TableFormatter::new(false).format_documents(&items);
        assert!(output.contains("players"));
        assert!(output.contains("matches"));
    }

    #[test]
    fn test_rows_table() {
        let output = TableFormatter::new(false).format_rows(
            &["name".to_string(), "goals".to_string()],
            &[vec![json!("Pelé"), json!(12)], vec![json!("Zico"), JsonValue::Null]],
        );
        assert!(output.contains("name"));
        assert!(output.contains("Pelé"));
        assert!(output.contains("12"));
    }

    #[test]
    fn test_empty() {
        let formatter = TableFormatter::new(false);
        assert_eq!(formatter.format_rows(&[], &[]), "(empty result set)");
        assert_eq!(formatter.format_documents(&[]), "(empty result set)");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("x")), "x");
        assert_eq!(cell_text(&JsonValue::Null), "");
        assert_eq!(cell_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
