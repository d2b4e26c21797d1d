//! Mongo Shell AST (Abstract Syntax Tree)
//!
//! A shell command is a chain rooted at a collection:
//! `db.<collection>.<call>(<args>).<call>(<args>)...`. Arguments are literal
//! values only: objects, arrays, strings, numbers, booleans and null.

use std::ops::Range;

/// Span information for source locations
pub type Span = Range<usize>;

/// Literal value expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Object literal: { key: value, ... }
    Object(ObjectExpr),
    /// Array literal: [1, 2, 3]
    Array(ArrayExpr),
    /// String literal: "hello" or 'world'
    String(String),
    /// Integer literal: 42
    Integer(i64),
    /// Floating point literal: 3.14, 1e3
    Float(f64),
    /// Boolean literal: true or false
    Boolean(bool),
    /// Null literal
    Null,
}

/// Object expression: { key: value, ... }
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    pub properties: Vec<Property>,
    pub span: Span,
}

impl ObjectExpr {
    pub fn new(properties: Vec<Property>, span: Span) -> Self {
        Self { properties, span }
    }
}

/// Object property: key: value
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub span: Span,
}

impl Property {
    pub fn new(key: PropertyKey, value: Expr, span: Span) -> Self {
        Self { key, value, span }
    }
}

/// Property key (can be identifier, string, or number)
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(String),
    String(String),
    Number(String),
}

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKey::Ident(s) | PropertyKey::String(s) | PropertyKey::Number(s) => s,
        }
    }
}

/// Array expression: [1, 2, 3]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

impl ArrayExpr {
    pub fn new(elements: Vec<Expr>, span: Span) -> Self {
        Self { elements, span }
    }
}

/// One method call in a chain: name(arg1, arg2, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl CallExpr {
    pub fn new(name: String, arguments: Vec<Expr>, span: Span) -> Self {
        Self {
            name,
            arguments,
            span,
        }
    }
}

/// Top-level shell statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// db.getCollectionNames()
    ListCollections(Span),
    /// db.<collection>.<call>(...)...
    Chain(ChainExpr),
}

/// Whole command: db.<collection> followed by one or more calls
#[derive(Debug, Clone, PartialEq)]
pub struct ChainExpr {
    pub collection: String,
    pub calls: Vec<CallExpr>,
    pub span: Span,
}

impl ChainExpr {
    pub fn new(collection: String, calls: Vec<CallExpr>, span: Span) -> Self {
        Self {
            collection,
            calls,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_key_as_str() {
        assert_eq!(PropertyKey::Ident("name".to_string()).as_str(), "name");
        assert_eq!(PropertyKey::String("age".to_string()).as_str(), "age");
        assert_eq!(PropertyKey::Number("123".to_string()).as_str(), "123");
    }

    #[test]
    fn test_chain_expr() {
        let call = CallExpr::new(
            "find".to_string(),
            vec![Expr::Object(ObjectExpr::new(vec![], 14..16))],
            9..17,
        );
        let chain = ChainExpr::new("users".to_string(), vec![call], 0..17);
        assert_eq!(chain.calls.len(), 1);
        assert_eq!(chain.calls[0].name, "find");
    }
}
