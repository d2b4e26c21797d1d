//! Literal expression to BSON converter
//!
//! Converts parsed shell literals into BSON values, and renders BSON values
//! back into shell syntax. Rendering then re-parsing a value yields the same
//! value: integers stay `Int64` and floats always carry a `.` or exponent.

use std::fmt::{self, Write};

use mongodb::bson::{Bson, Document};

use super::mongo_ast::{ArrayExpr, Expr, ObjectExpr};

/// Converter for shell literals to BSON
pub struct ExpressionConverter;

impl ExpressionConverter {
    /// Convert a literal expression to a BSON value
    pub fn expr_to_bson(expr: &Expr) -> Bson {
        match expr {
            Expr::Object(obj) => Bson::Document(Self::object_to_bson(obj)),
            Expr::Array(arr) => Bson::Array(Self::array_to_bson(arr)),
            Expr::String(s) => Bson::String(s.clone()),
            Expr::Integer(n) => Bson::Int64(*n),
            Expr::Float(f) => Bson::Double(*f),
            Expr::Boolean(b) => Bson::Boolean(*b),
            Expr::Null => Bson::Null,
        }
    }

    /// Convert an object literal to a document; a repeated key keeps its
    /// first position and its last value
    pub fn object_to_bson(obj: &ObjectExpr) -> Document {
        let mut doc = Document::new();
        for prop in &obj.properties {
            doc.insert(prop.key.as_str(), Self::expr_to_bson(&prop.value));
        }
        doc
    }

    /// Convert an array literal to a BSON array
    pub fn array_to_bson(arr: &ArrayExpr) -> Vec<Bson> {
        arr.elements.iter().map(Self::expr_to_bson).collect()
    }
}

/// Write a BSON value in shell syntax
///
/// Only the literal subset the parser accepts is rendered faithfully; other
/// BSON types fall back to their extended JSON text.
pub fn write_value(out: &mut impl Write, value: &Bson) -> fmt::Result {
    match value {
        Bson::Document(doc) => write_document(out, doc),
        Bson::Array(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, item)?;
            }
            out.write_char(']')
        }
        Bson::String(s) => write_string(out, s),
        Bson::Int32(n) => write!(out, "{n}"),
        Bson::Int64(n) => write!(out, "{n}"),
        Bson::Double(f) if f.is_finite() => write!(out, "{f:?}"),
        Bson::Boolean(b) => write!(out, "{b}"),
        Bson::Null | Bson::Undefined => out.write_str("null"),
        other => write!(out, "{other}"),
    }
}

/// Write a document in shell syntax with quoted keys
pub fn write_document(out: &mut impl Write, doc: &Document) -> fmt::Result {
    if doc.is_empty() {
        return out.write_str("{}");
    }
    out.write_char('{')?;
    for (i, (key, value)) in doc.iter().enumerate() {
        out.write_str(if i > 0 { ", " } else { " " })?;
        write_string(out, key)?;
        out.write_str(": ")?;
        write_value(out, value)?;
    }
    out.write_str(" }")
}

fn write_string(out: &mut impl Write, s: &str) -> fmt::Result {
    // JSON escaping is a subset of what the lexer decodes
    match serde_json::to_string(s) {
        Ok(quoted) => out.write_str(&quoted),
        Err(_) => Err(fmt::Error),
    }
}

/// Render a BSON value to a shell-syntax string
pub fn render_value(value: &Bson) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_value(&mut out, value);
    out
}
