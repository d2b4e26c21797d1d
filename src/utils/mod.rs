//! Utility functions and helpers
//!
//! This module provides common utility functions used throughout the application:
//! - Text cleanup for generated commands (code fences, whitespace)
//! - Quote- and bracket-aware scanning used by the SQL normalizer
//! - File system helpers
//! - Validation functions

use std::path::PathBuf;

/// Text utilities for generated command strings
pub mod text {
    use std::sync::LazyLock;

    use regex::Regex;

    static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)```(?:sql|mysql|javascript|js|mongodb|mongo)?\s*|\s*```")
            .expect("code fence pattern is valid")
    });

    static WHITESPACE_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

    /// Remove fenced code-block markers, optionally language-tagged
    ///
    /// # Arguments
    /// * `s` - Raw generated text
    ///
    /// # Returns
    /// * `String` - Text without any ``` markers
    pub fn strip_code_fences(s: &str) -> String {
        CODE_FENCE.replace_all(s, "").into_owned()
    }

    /// Collapse every whitespace run to a single space and trim both ends
    pub fn collapse_whitespace(s: &str) -> String {
        WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
    }

    /// Check whether byte offset `pos` falls inside a quoted SQL literal
    ///
    /// Single quotes, double quotes and backticks are recognized. A doubled
    /// quote (`''`) closes and reopens the literal, which leaves the state
    /// unchanged, so it needs no special handling. Inside string literals a
    /// backslash escapes the next character, as in MySQL's default mode.
    ///
    /// # Arguments
    /// * `s` - SQL text
    /// * `pos` - Byte offset to test
    ///
    /// # Returns
    /// * `bool` - True if inside a literal
    pub fn is_quoted_at(s: &str, pos: usize) -> bool {
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for (idx, ch) in s.char_indices() {
            if idx >= pos {
                break;
            }
            if escaped {
                escaped = false;
                continue;
            }
            match quote {
                Some(q) if ch == '\\' && q != '`' => escaped = true,
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None if matches!(ch, '\'' | '"' | '`') => quote = Some(ch),
                None => {}
            }
        }
        quote.is_some()
    }

    /// Split `s` on `separator` where it appears outside quotes and brackets
    ///
    /// The pieces are returned untrimmed so callers can reassemble the input
    /// byte for byte.
    ///
    /// # Arguments
    /// * `s` - Text to split
    /// * `separator` - ASCII separator, e.g. `","` or `"||"`
    ///
    /// # Returns
    /// * `Vec<&str>` - Pieces between top-level separators
    pub fn split_top_level<'a>(s: &'a str, separator: &str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut depth: usize = 0;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        let mut start = 0;
        let mut skip_until = 0;

        for (idx, ch) in s.char_indices() {
            if idx < skip_until {
                continue;
            }
            if escaped {
                escaped = false;
                continue;
            }
            if let Some(q) = quote {
                if ch == '\\' && q != '`' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ if depth == 0 && s[idx..].starts_with(separator) => {
                    pieces.push(&s[start..idx]);
                    start = idx + separator.len();
                    skip_until = start;
                }
                _ => {}
            }
        }

        pieces.push(&s[start..]);
        pieces
    }
}

/// File system utilities
pub mod fs {
    use super::*;

    /// Expand home directory in path
    ///
    /// # Arguments
    /// * `path` - Path potentially starting with ~
    ///
    /// # Returns
    /// * `PathBuf` - Expanded path
    pub fn expand_home(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }
}

/// Validation utilities
pub mod validate {
    /// Validate MongoDB collection name
    ///
    /// # Arguments
    /// * `name` - Collection name to validate
    ///
    /// # Returns
    /// * `bool` - True if valid
    pub fn is_valid_collection_name(name: &str) -> bool {
        if name.is_empty() || name.len() > 120 {
            return false;
        }

        if name.starts_with("system.") {
            return false;
        }

        let invalid_chars = ['$', '\0'];
        !name.chars().any(|c| invalid_chars.contains(&c))
    }

    /// Validate MongoDB connection URI
    ///
    /// # Arguments
    /// * `uri` - Connection URI to validate
    ///
    /// # Returns
    /// * `bool` - True if valid format
    pub fn is_valid_connection_uri(uri: &str) -> bool {
        uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")
    }
}
