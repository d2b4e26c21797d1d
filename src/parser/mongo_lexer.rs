//! Mongo Shell lexer
//!
//! Turns `db.collection.operation(args)...` text into a flat token stream.
//! The lexer itself never fails: characters it does not understand become
//! `Unknown` tokens and an unclosed string becomes an `Unterminated` token, so
//! the parser can report a precise error.
//!
//! Accepted beyond strict JSON:
//! - single- or double-quoted strings
//! - bare identifiers (unquoted keys, `$` operators)
//! - signed numbers with optional fraction and exponent
//! - `//` and `/* */` comments

use std::ops::Range;

/// Token types for Mongo shell syntax
#[derive(Debug, Clone, PartialEq)]
pub enum MongoTokenKind {
    /// "db" keyword
    Db,
    /// Identifier (collection name, operation name, unquoted key, ...)
    Ident(String),
    /// Dot separator
    Dot,
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Left brace
    LBrace,
    /// Right brace
    RBrace,
    /// Left bracket
    LBracket,
    /// Right bracket
    RBracket,
    /// Comma
    Comma,
    /// Colon
    Colon,
    /// Semicolon
    Semicolon,
    /// String literal (escapes already resolved)
    String(String),
    /// Number literal, as written
    Number(String),
    /// String literal missing its closing quote
    Unterminated(char),
    /// End of input
    EOF,
    /// Unknown character
    Unknown(char),
}

impl MongoTokenKind {
    /// Short human-readable form used in error messages
    pub fn describe(&self) -> String {
        match self {
            MongoTokenKind::Db => "db".to_string(),
            MongoTokenKind::Ident(s) => s.clone(),
            MongoTokenKind::Dot => ".".to_string(),
            MongoTokenKind::LParen => "(".to_string(),
            MongoTokenKind::RParen => ")".to_string(),
            MongoTokenKind::LBrace => "{".to_string(),
            MongoTokenKind::RBrace => "}".to_string(),
            MongoTokenKind::LBracket => "[".to_string(),
            MongoTokenKind::RBracket => "]".to_string(),
            MongoTokenKind::Comma => ",".to_string(),
            MongoTokenKind::Colon => ":".to_string(),
            MongoTokenKind::Semicolon => ";".to_string(),
            MongoTokenKind::String(s) => format!("{s:?}"),
            MongoTokenKind::Number(n) => n.clone(),
            MongoTokenKind::Unterminated(q) => format!("unterminated {q}string"),
            MongoTokenKind::EOF => "end of input".to_string(),
            MongoTokenKind::Unknown(c) => c.to_string(),
        }
    }
}

/// Token with position information
#[derive(Debug, Clone)]
pub struct MongoToken {
    pub kind: MongoTokenKind,
    pub span: Range<usize>,
}

impl MongoToken {
    /// Create a new token
    pub fn new(kind: MongoTokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Mongo Shell Lexer
pub struct MongoLexer {
    input: Vec<char>,
    pos: usize,
}

impl MongoLexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input; the last token is always `EOF`
    pub fn tokenize(input: &str) -> Vec<MongoToken> {
        let mut lexer = Self::new(input);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token();
            let is_eof = matches!(token.kind, MongoTokenKind::EOF);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token
    fn next_token(&mut self) -> MongoToken {
        self.skip_trivia();

        let start = self.pos;

        if self.is_at_end() {
            return MongoToken::new(MongoTokenKind::EOF, start..start);
        }

        let ch = self.current_char();

        let single = match ch {
            '.' if !self.peek_char().is_ascii_digit() => Some(MongoTokenKind::Dot),
            '(' => Some(MongoTokenKind::LParen),
            ')' => Some(MongoTokenKind::RParen),
            '{' => Some(MongoTokenKind::LBrace),
            '}' => Some(MongoTokenKind::RBrace),
            '[' => Some(MongoTokenKind::LBracket),
            ']' => Some(MongoTokenKind::RBracket),
            ',' => Some(MongoTokenKind::Comma),
            ':' => Some(MongoTokenKind::Colon),
            ';' => Some(MongoTokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return MongoToken::new(kind, start..self.pos);
        }

        match ch {
            '\'' | '"' => self.scan_string(ch, start),
            '0'..='9' | '.' => self.scan_number(start),
            '-' | '+' if self.peek_char().is_ascii_digit() || self.peek_char() == '.' => {
                self.scan_number(start)
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier(start),
            _ => {
                self.advance();
                MongoToken::new(MongoTokenKind::Unknown(ch), start..self.pos)
            }
        }
    }

    /// Scan a string literal
    fn scan_string(&mut self, quote: char, start: usize) -> MongoToken {
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.current_char() != quote {
            let ch = self.current_char();
            if ch == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    '0' => value.push('\0'),
                    'u' => {
                        if let Some(decoded) = self.scan_unicode_escape() {
                            value.push(decoded);
                            continue;
                        }
                        value.push_str("\\u");
                    }
                    // \\, \', \", \/ and anything else stand for themselves
                    other => value.push(other),
                }
            } else {
                value.push(ch);
            }
            self.advance();
        }

        if self.is_at_end() {
            return MongoToken::new(MongoTokenKind::Unterminated(quote), start..self.pos);
        }

        self.advance(); // Skip closing quote
        MongoToken::new(MongoTokenKind::String(value), start..self.pos)
    }

    /// Decode `\uXXXX` (and a following low surrogate) with `pos` on the `u`.
    ///
    /// On success the position is left after the escape. On failure the
    /// position is unchanged.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        let high = self.hex4(self.pos + 1)?;

        if (0xD800..0xDC00).contains(&high) {
            // Expect a low surrogate: \uDC00-\uDFFF
            let at = self.pos + 5;
            if self.input.get(at) == Some(&'\\') && self.input.get(at + 1) == Some(&'u') {
                let low = self.hex4(at + 2)?;
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    self.pos = at + 6;
                    return char::from_u32(code);
                }
            }
            return None;
        }

        let decoded = char::from_u32(high)?;
        self.pos += 5;
        Some(decoded)
    }

    /// Read four hex digits starting at `at`
    fn hex4(&self, at: usize) -> Option<u32> {
        let digits = self.input.get(at..at + 4)?;
        if !digits.iter().all(char::is_ascii_hexdigit) {
            return None;
        }
        let digits: String = digits.iter().collect();
        u32::from_str_radix(&digits, 16).ok()
    }

    /// Scan a number: optional sign, digits, fraction, exponent
    fn scan_number(&mut self, start: usize) -> MongoToken {
        let mut value = String::new();

        if matches!(self.current_char(), '-' | '+') {
            value.push(self.current_char());
            self.advance();
        }

        self.take_digits(&mut value);

        // Handle decimal point
        if self.current_char() == '.' && self.peek_char().is_ascii_digit() {
            value.push('.');
            self.advance();
            self.take_digits(&mut value);
        }

        // Handle exponent
        if matches!(self.current_char(), 'e' | 'E') {
            let sign = self.peek_char();
            let has_exponent = sign.is_ascii_digit()
                || (matches!(sign, '+' | '-')
                    && self
                        .input
                        .get(self.pos + 2)
                        .is_some_and(|c| c.is_ascii_digit()));
            if has_exponent {
                value.push('e');
                self.advance();
                if matches!(self.current_char(), '+' | '-') {
                    value.push(self.current_char());
                    self.advance();
                }
                self.take_digits(&mut value);
            }
        }

        MongoToken::new(MongoTokenKind::Number(value), start..self.pos)
    }

    fn take_digits(&mut self, value: &mut String) {
        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self, start: usize) -> MongoToken {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Check if it's the "db" keyword
        let kind = if value == "db" {
            MongoTokenKind::Db
        } else {
            MongoTokenKind::Ident(value)
        };

        MongoToken::new(kind, start..self.pos)
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) {
        loop {
            while !self.is_at_end() && self.current_char().is_whitespace() {
                self.advance();
            }

            if self.current_char() == '/' && self.peek_char() == '/' {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
            } else if self.current_char() == '/' && self.peek_char() == '*' {
                self.pos += 2;
                while !self.is_at_end()
                    && !(self.current_char() == '*' && self.peek_char() == '/')
                {
                    self.advance();
                }
                self.pos = (self.pos + 2).min(self.input.len());
            } else {
                break;
            }
        }
    }

    /// Get current character
    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.pos]
        }
    }

    /// Peek at next character
    fn peek_char(&self) -> char {
        if self.pos + 1 >= self.input.len() {
            '\0'
        } else {
            self.input[self.pos + 1]
        }
    }

    /// Advance position
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
