//! SQL dialect normalizer
//!
//! Generated SQL arrives wrapped in code fences, spread over several lines and
//! sometimes written with ANSI `||` string concatenation, which MySQL reads as
//! logical OR. Normalization strips the formatting and rewrites concatenations
//! in the select list into `CONCAT(...)` calls. It never fails: anything it
//! does not understand is passed through unchanged.
//!
//! The rewrite is a conservative scan, not a SQL parser. Only top-level
//! select-list items are considered; `||` nested inside a function call or
//! appearing after `FROM` is left alone.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::utils::text::{collapse_whitespace, is_quoted_at, split_top_level, strip_code_fences};

static FROM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").expect("FROM pattern is valid"));

static SELECT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*SELECT\s+(?:(?:DISTINCT|ALL)\s+)?").expect("SELECT pattern is valid")
});

static ALIAS_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+AS\s+(?:\w+|`[^`]+`|'[^']+'|\x22[^\x22]+\x22)$")
        .expect("alias pattern is valid")
});

/// Normalize generated SQL for the MySQL backend.
///
/// Steps, in order: strip code fences, collapse whitespace, rewrite `||`
/// concatenations that appear before the first `FROM`. Normalizing an already
/// normalized statement returns it unchanged.
pub fn normalize(raw: &str) -> String {
    let cleaned = collapse_whitespace(&strip_code_fences(raw));

    match rewrite_concatenation(&cleaned) {
        Some(rewritten) => {
            debug!("Rewrote || concatenation: {}", rewritten);
            rewritten
        }
        None => cleaned,
    }
}

/// Rewrite `a || b [AS x]` select-list items into `CONCAT(a, b) [AS x]`.
///
/// Returns `None` when there is no `FROM`, no `||` before it, or no item that
/// could be rewritten.
fn rewrite_concatenation(sql: &str) -> Option<String> {
    let from = first_unquoted_from(sql)?;
    let (select_clause, rest) = sql.split_at(from);

    if !select_clause.contains("||") {
        return None;
    }

    let prefix_end = SELECT_PREFIX
        .find(select_clause)
        .map(|m| m.end())
        .unwrap_or(0);
    let (prefix, list) = select_clause.split_at(prefix_end);

    let mut changed = false;
    let items: Vec<String> = split_top_level(list, ",")
        .into_iter()
        .map(|item| match rewrite_item(item) {
            Some(rewritten) => {
                changed = true;
                rewritten
            }
            None => item.to_string(),
        })
        .collect();

    if !changed {
        return None;
    }

    Some(format!("{prefix}{}{rest}", items.join(",")))
}

/// Byte offset of the first `FROM` keyword outside a quoted literal
fn first_unquoted_from(sql: &str) -> Option<usize> {
    FROM_KEYWORD
        .find_iter(sql)
        .map(|m| m.start())
        .find(|&pos| !is_quoted_at(sql, pos))
}

/// Rewrite one select-list item, keeping its surrounding whitespace
fn rewrite_item(item: &str) -> Option<String> {
    let core = item.trim();
    let leading = &item[..item.len() - item.trim_start().len()];
    let trailing = &item[item.trim_end().len()..];

    let (expression, alias) = match ALIAS_SUFFIX.find(core) {
        Some(m) => core.split_at(m.start()),
        None => (core, ""),
    };

    let parts: Vec<&str> = split_top_level(expression, "||")
        .into_iter()
        .map(str::trim)
        .collect();

    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    Some(format!(
        "{leading}CONCAT({}){alias}{trailing}",
        parts.join(", ")
    ))
}
