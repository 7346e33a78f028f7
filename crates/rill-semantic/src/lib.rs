//! rill-semantic - Semantic analysis for the Rill language
//!
//! Responsible for:
//! - Declaration-before-use and redeclaration checking
//! - Initialization-before-read checking
//! - The two-class (numeric vs. string) type-compatibility rule
//! - Scope lifetime of symbols across nested blocks
//!
//! Errors are non-fatal: the walk visits every statement and the run
//! returns a pass/fail verdict alongside all collected diagnostics.
//!
//! # Example
//!
//! ```rust
//! use rill_lexer::tokenize;
//! use rill_parser::parse;
//! use rill_semantic::analyze;
//!
//! let program = parse(tokenize("int x; x = 5;", 0)).unwrap();
//! let (passed, diagnostics) = analyze(&program);
//! assert!(passed);
//! assert!(diagnostics.is_empty());
//! ```

pub mod analyzer;
pub mod symbols;
pub mod types;

pub use analyzer::{analyze, Analyzer};
pub use symbols::{Scope, Symbol, SymbolTable};
pub use types::{check_binary, check_comparison, OpCheck, TypeClass};
