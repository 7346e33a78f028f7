//! rill-parser - Parser for the Rill language
//!
//! Converts a sequence of tokens into an AST (Abstract Syntax Tree)
//! by recursive descent, stopping at the first syntax error.
//!
//! # Example
//!
//! ```rust
//! use rill_lexer::tokenize;
//! use rill_parser::parse;
//!
//! let tokens = tokenize("int x; x = 5;", 0);
//! let program = parse(tokens).expect("valid program");
//! assert_eq!(program.statements.len(), 2);
//! ```

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::{parse, Parser};
