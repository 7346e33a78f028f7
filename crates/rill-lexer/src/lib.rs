//! rill-lexer - Lexer/tokenizer for the Rill language
//!
//! Converts source text into [`Token`]s. Lexical errors do not stop
//! the lexer; they are carried on the tokens themselves.
//!
//! # Example
//!
//! ```rust
//! use rill_lexer::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("int x; x = 5;", 0);
//! let tokens = lexer.tokenize();
//! assert_eq!(tokens.first().map(|t| t.kind), Some(TokenKind::Int));
//! assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
//! ```

pub mod lexer;
pub mod token;

pub use lexer::{render_tokens, tokenize, Lexer, MAX_IDENT_LEN};
pub use token::{LexError, Token, TokenKind};
