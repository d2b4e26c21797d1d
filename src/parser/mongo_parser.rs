//! Mongo Shell Parser
//!
//! Recursive-descent parser for the shell command subset:
//!
//! ```text
//! statement  := "db" collection call+ ";"*
//!             | "db" "." "getCollectionNames" "(" ")" ";"*
//! collection := "." ident
//!             | "." "getCollection" "(" string ")"
//!             | "[" string "]"
//! call       := "." ident "(" [value ("," value)* [","]] ")"
//! value      := object | array | string | number | true | false | null
//! ```
//!
//! Errors point at the innermost unclosed delimiter when input ends early.

use super::mongo_ast::*;
use super::mongo_lexer::{MongoLexer, MongoToken, MongoTokenKind};
use crate::error::{NlqError, ParseError, Result};

/// Deepest allowed delimiter nesting, the same bound MongoDB puts on documents
const MAX_DEPTH: usize = 100;

/// MongoDB Shell Parser
pub struct MongoParser {
    tokens: Vec<MongoToken>,
    pos: usize,
    /// Opening delimiters not yet closed, innermost last
    open: Vec<char>,
}

impl MongoParser {
    /// Create a new parser from input string
    pub fn new(input: &str) -> Self {
        let tokens = MongoLexer::tokenize(input);
        Self {
            tokens,
            pos: 0,
            open: Vec::new(),
        }
    }

    /// Parse a full shell statement
    pub fn parse(input: &str) -> Result<Statement> {
        let mut parser = Self::new(input);
        parser.parse_statement()
    }

    /// Parse a single literal value (used for standalone arguments)
    pub fn parse_value_str(input: &str) -> Result<Expr> {
        let mut parser = Self::new(input);
        let value = parser.parse_value()?;
        parser.expect_end()?;
        Ok(value)
    }

    /// Parse statement: db.<collection>.<call>(...)...
    fn parse_statement(&mut self) -> Result<Statement> {
        let start = self.current_pos();

        if !self.match_token(&MongoTokenKind::Db) {
            let found = self.current_kind().describe();
            return Err(ParseError::InvalidCommand(format!(
                "expected a command starting with 'db.', found '{found}'"
            ))
            .into());
        }

        let collection = if self.match_token(&MongoTokenKind::LBracket) {
            self.open.push('[');
            let name = self.expect_string("collection name")?;
            self.expect_closing(&MongoTokenKind::RBracket)?;
            name
        } else {
            if !self.match_token(&MongoTokenKind::Dot) {
                return Err(ParseError::InvalidCommand(
                    "expected '.' after 'db'".to_string(),
                )
                .into());
            }
            let name = match self.current_kind() {
                MongoTokenKind::Db => {
                    self.advance();
                    "db".to_string()
                }
                _ => self.expect_identifier("collection name")?,
            };

            match name.as_str() {
                "getCollectionNames" if self.check(&MongoTokenKind::LParen) => {
                    self.advance();
                    self.open.push('(');
                    self.expect_closing(&MongoTokenKind::RParen)?;
                    self.expect_end()?;
                    return Ok(Statement::ListCollections(start..self.previous_pos()));
                }
                "getCollection" if self.check(&MongoTokenKind::LParen) => {
                    self.advance();
                    self.open.push('(');
                    let name = self.expect_string("collection name")?;
                    self.expect_closing(&MongoTokenKind::RParen)?;
                    name
                }
                _ => name,
            }
        };

        let mut calls = Vec::new();
        while self.match_token(&MongoTokenKind::Dot) {
            calls.push(self.parse_call()?);
        }

        if calls.is_empty() {
            return Err(ParseError::InvalidCommand(format!(
                "db.{collection} must be followed by an operation call"
            ))
            .into());
        }

        self.expect_end()?;
        let end = self.previous_pos();
        Ok(Statement::Chain(ChainExpr::new(collection, calls, start..end)))
    }

    /// Parse one call: name(args), with the leading dot already consumed
    fn parse_call(&mut self) -> Result<CallExpr> {
        let start = self.current_pos();
        let name = self.expect_identifier("method name")?;

        if !self.match_token(&MongoTokenKind::LParen) {
            return Err(self.unexpected("("));
        }
        self.open.push('(');

        let mut arguments = Vec::new();
        loop {
            if self.check(&MongoTokenKind::RParen) {
                break;
            }
            arguments.push(self.parse_value()?);
            if !self.match_token(&MongoTokenKind::Comma) {
                break;
            }
        }

        self.expect_closing(&MongoTokenKind::RParen)?;
        let end = self.previous_pos();
        Ok(CallExpr::new(name, arguments, start..end))
    }

    /// Parse a literal value
    fn parse_value(&mut self) -> Result<Expr> {
        let start = self.current_pos();

        match self.current_kind().clone() {
            MongoTokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            MongoTokenKind::Number(n) => {
                self.advance();
                parse_number(&n)
            }
            MongoTokenKind::Ident(name) => match name.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::Boolean(true))
                }
                "false" => {
                    self.advance();
                    Ok(Expr::Boolean(false))
                }
                "null" | "undefined" => {
                    self.advance();
                    Ok(Expr::Null)
                }
                _ => Err(ParseError::SyntaxError(format!(
                    "unsupported value '{name}': only literal objects, arrays, strings, numbers, booleans and null are accepted"
                ))
                .into()),
            },
            MongoTokenKind::LBrace => self.parse_object(start),
            MongoTokenKind::LBracket => self.parse_array(start),
            _ => Err(self.unexpected("a value")),
        }
    }

    /// Parse object literal: { key: value, ... }
    fn parse_object(&mut self, start: usize) -> Result<Expr> {
        self.enter('{')?;

        let mut properties = Vec::new();
        loop {
            if self.check(&MongoTokenKind::RBrace) {
                break;
            }

            let prop_start = self.current_pos();
            let key = self.parse_property_key()?;
            if !self.match_token(&MongoTokenKind::Colon) {
                return Err(self.unexpected(":"));
            }
            let value = self.parse_value()?;
            properties.push(Property::new(key, value, prop_start..self.previous_pos()));

            // Trailing comma allowed
            if !self.match_token(&MongoTokenKind::Comma) {
                break;
            }
        }

        self.expect_closing(&MongoTokenKind::RBrace)?;
        let end = self.previous_pos();
        Ok(Expr::Object(ObjectExpr::new(properties, start..end)))
    }

    /// Parse property key (identifier, string, or number)
    fn parse_property_key(&mut self) -> Result<PropertyKey> {
        let key = match self.current_kind() {
            MongoTokenKind::Ident(name) => PropertyKey::Ident(name.clone()),
            MongoTokenKind::Db => PropertyKey::Ident("db".to_string()),
            MongoTokenKind::String(s) => PropertyKey::String(s.clone()),
            MongoTokenKind::Number(n) => PropertyKey::Number(n.clone()),
            _ => return Err(self.unexpected("property key")),
        };
        self.advance();
        Ok(key)
    }

    /// Parse array literal: [elem1, elem2, ...]
    fn parse_array(&mut self, start: usize) -> Result<Expr> {
        self.enter('[')?;

        let mut elements = Vec::new();
        loop {
            if self.check(&MongoTokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_value()?);
            if !self.match_token(&MongoTokenKind::Comma) {
                break;
            }
        }

        self.expect_closing(&MongoTokenKind::RBracket)?;
        let end = self.previous_pos();
        Ok(Expr::Array(ArrayExpr::new(elements, start..end)))
    }

    // Token manipulation methods

    /// Kind of the current token (EOF past the end)
    fn current_kind(&self) -> &MongoTokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&MongoTokenKind::EOF)
    }

    /// Check if current token matches the given kind
    fn check(&self, kind: &MongoTokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Match and consume token if it matches the given kind
    fn match_token(&mut self, kind: &MongoTokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Consume an opening delimiter, refusing to nest past [`MAX_DEPTH`]
    fn enter(&mut self, opener: char) -> Result<()> {
        if self.open.len() >= MAX_DEPTH {
            return Err(ParseError::SyntaxError(format!(
                "nesting deeper than {MAX_DEPTH} levels"
            ))
            .into());
        }
        self.advance();
        self.open.push(opener);
        Ok(())
    }

    /// Consume the closer for the innermost open delimiter
    fn expect_closing(&mut self, kind: &MongoTokenKind) -> Result<()> {
        if self.match_token(kind) {
            self.open.pop();
            Ok(())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    /// Expect an identifier and return its name
    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match self.current_kind() {
            MongoTokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Expect a string literal and return its value
    fn expect_string(&mut self, what: &str) -> Result<String> {
        match self.current_kind() {
            MongoTokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Allow trailing semicolons, then require end of input
    fn expect_end(&mut self) -> Result<()> {
        while self.match_token(&MongoTokenKind::Semicolon) {}
        if self.check(&MongoTokenKind::EOF) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    /// Build the error for an unexpected current token
    fn unexpected(&self, expected: &str) -> NlqError {
        let error = match self.current_kind() {
            MongoTokenKind::Unterminated(quote) => ParseError::UnbalancedDelimiter(*quote),
            MongoTokenKind::EOF => match self.open.last() {
                Some(opener) => ParseError::UnbalancedDelimiter(*opener),
                None => ParseError::SyntaxError(format!("expected {expected}, found end of input")),
            },
            MongoTokenKind::RParen if self.open.last() != Some(&'(') => {
                ParseError::UnbalancedDelimiter(')')
            }
            MongoTokenKind::RBrace if self.open.last() != Some(&'{') => {
                ParseError::UnbalancedDelimiter('}')
            }
            MongoTokenKind::RBracket if self.open.last() != Some(&'[') => {
                ParseError::UnbalancedDelimiter(']')
            }
            other => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: other.describe(),
            },
        };
        error.into()
    }

    /// Get current position
    fn current_pos(&self) -> usize {
        if let Some(token) = self.tokens.get(self.pos) {
            token.span.start
        } else if let Some(last) = self.tokens.last() {
            last.span.end
        } else {
            0
        }
    }

    /// Get previous position
    fn previous_pos(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }
}

/// Integers stay integers; anything with a fraction or exponent, or too
/// large for i64, becomes a float.
fn parse_number(text: &str) -> Result<Expr> {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float && let Ok(n) = text.parse::<i64>() {
        return Ok(Expr::Integer(n));
    }
    text.parse::<f64>()
        .map(Expr::Float)
        .map_err(|_| ParseError::SyntaxError(format!("invalid number: {text}")).into())
}
