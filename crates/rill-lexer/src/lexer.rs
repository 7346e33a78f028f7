//! Lexer for the Rill language
//!
//! Converts source text into a sequence of classified tokens. Lexical
//! errors are encoded as data on the token (see [`LexError`]) rather
//! than returned as failures, so lexing always makes progress and a
//! caller may collect several lexical diagnostics before giving up.

use crate::token::{LexError, Token, TokenKind};
use rill_error::span::{Position, Span};

/// Longest identifier the lexer accepts, in bytes
pub const MAX_IDENT_LEN: usize = 99;

/// The Rill language lexer
pub struct Lexer<'src> {
    /// Source code being tokenized
    source: &'src str,
    /// Source code characters
    chars: Vec<char>,
    /// Current position (index in the chars vector)
    pos: usize,
    /// Current line (1-indexed)
    line: u32,
    /// Current column (1-indexed)
    column: u32,
    /// Byte offset
    offset: usize,
    /// Source file ID
    file_id: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source code
    pub fn new(source: &'src str, file_id: u32) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            offset: 0,
            file_id,
        }
    }

    /// The source being lexed
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the current character without advancing
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Returns the character after the current one without advancing
    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    /// Advances to the next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        self.offset += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Creates a position at the current location
    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    /// Creates a span from a start position to the current location
    fn make_span(&self, start: Position) -> Span {
        Span::new(start, self.current_position(), self.file_id)
    }

    /// Skips whitespace (space, tab, newline)
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Reads a number literal (digit run, integer form only)
    fn read_number(&mut self) -> Token {
        let start = self.current_position();
        let mut num_str = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let span = self.make_span(start);

        // No sign, no fraction, no exponent; the only failure mode
        // left is a value that does not fit i64.
        if num_str.parse::<i64>().is_ok() {
            Token::new(TokenKind::Number, num_str, span)
        } else {
            Token::new(TokenKind::Error, num_str, span).with_error(LexError::InvalidNumber)
        }
    }

    /// Reads an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let start = self.current_position();
        let mut ident = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let span = self.make_span(start);

        if ident.len() > MAX_IDENT_LEN {
            return Token::new(TokenKind::Error, ident, span)
                .with_error(LexError::InvalidIdentifier);
        }

        match TokenKind::keyword_from_str(&ident) {
            Some(kind) => Token::new(kind, ident, span),
            None => Token::new(TokenKind::Ident, ident, span),
        }
    }

    /// Reads a string literal, translating escape sequences
    fn read_string(&mut self) -> Token {
        let start = self.current_position();
        self.advance(); // consume the opening quote
        let mut value = String::new();
        let mut escape_error = None;

        loop {
            match self.peek() {
                None => {
                    // End of input before the closing quote
                    return Token::new(TokenKind::Error, value, self.make_span(start))
                        .with_error(LexError::UnterminatedString);
                }
                Some('\\') => {
                    self.advance(); // consume the backslash
                    match self.peek() {
                        Some('n') => {
                            value.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            value.push('\t');
                            self.advance();
                        }
                        Some('\\') => {
                            value.push('\\');
                            self.advance();
                        }
                        Some('"') => {
                            value.push('"');
                            self.advance();
                        }
                        Some(ch) => {
                            // Unknown escape: keep the character and
                            // keep lexing so the caller can continue
                            // from the next token.
                            escape_error = Some(LexError::UnknownEscape);
                            value.push(ch);
                            self.advance();
                        }
                        None => {
                            return Token::new(TokenKind::Error, value, self.make_span(start))
                                .with_error(LexError::UnterminatedString);
                        }
                    }
                }
                Some('"') => {
                    self.advance(); // consume the closing quote
                    break;
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        let mut token = Token::new(TokenKind::StringLit, value, self.make_span(start));
        if let Some(err) = escape_error {
            token = token.with_error(err);
        }
        token
    }

    /// Reads the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.current_position();

        // End of input: the EOF token is returned repeatedly without
        // advancing further.
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Token::new(TokenKind::Eof, "EOF", Span::point(start, self.file_id)),
        };

        // Numbers
        if ch.is_ascii_digit() {
            return self.read_number();
        }

        // Identifiers and keywords
        if ch.is_ascii_alphabetic() || ch == '_' {
            return self.read_identifier();
        }

        // Strings
        if ch == '"' {
            return self.read_string();
        }

        // Arithmetic operators, with the consecutive-operator check
        if matches!(ch, '+' | '-' | '*' | '/') {
            self.advance();
            if matches!(self.peek(), Some('+' | '-' | '*' | '/')) {
                // The second operator is left in place so lexing can
                // resume on it.
                return Token::new(TokenKind::Error, ch, self.make_span(start))
                    .with_error(LexError::ConsecutiveOperators);
            }
            return Token::new(TokenKind::Operator, ch, self.make_span(start));
        }

        // Comparison and assignment operators
        match ch {
            '=' => {
                self.advance();
                return if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::Comparison, "==", self.make_span(start))
                } else {
                    Token::new(TokenKind::Equals, "=", self.make_span(start))
                };
            }
            '!' => {
                self.advance();
                return if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::Comparison, "!=", self.make_span(start))
                } else {
                    Token::new(TokenKind::Comparison, "!", self.make_span(start))
                };
            }
            '<' => {
                self.advance();
                return if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::Comparison, "<=", self.make_span(start))
                } else {
                    Token::new(TokenKind::Comparison, "<", self.make_span(start))
                };
            }
            '>' => {
                self.advance();
                return if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::Comparison, ">=", self.make_span(start))
                } else {
                    Token::new(TokenKind::Comparison, ">", self.make_span(start))
                };
            }
            '|' => {
                // `||` is one comparison token; a lone `|` has no rule
                if self.peek_next() == Some('|') {
                    self.advance();
                    self.advance();
                    return Token::new(TokenKind::Comparison, "||", self.make_span(start));
                }
            }
            _ => {}
        }

        // Single-character delimiters
        let delimiter = match ch {
            ';' => Some(TokenKind::Semicolon),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            _ => None,
        };
        if let Some(kind) = delimiter {
            self.advance();
            return Token::new(kind, ch, self.make_span(start));
        }

        // Anything else is an invalid character
        self.advance();
        Token::new(TokenKind::Error, ch, self.make_span(start)).with_error(LexError::InvalidChar)
    }

    /// Tokenizes the entire source, including the final EOF token
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        tokens
    }
}

/// Tokenizes source code and returns the tokens
pub fn tokenize(source: &str, file_id: u32) -> Vec<Token> {
    Lexer::new(source, file_id).tokenize()
}

/// Renders the token stream of a source text, one token per line
///
/// This is the human-readable lexer dump used by the driver; it is
/// pure presentation.
pub fn render_tokens(source: &str) -> String {
    let mut lexer = Lexer::new(source, 0);
    let mut out = String::new();

    loop {
        let token = lexer.next_token();

        if let Some(error) = token.error {
            out.push_str(&format!(
                "Lexical error at line {}: {} '{}'\n",
                token.line(),
                error,
                token.lexeme
            ));
        } else {
            out.push_str(&format!(
                "Token: {:<14} | Lexeme: '{}' | Line: {}\n",
                token.kind.name(),
                token.lexeme,
                token.line()
            ));
        }

        if token.is_eof() {
            break;
        }
    }

    out
}
