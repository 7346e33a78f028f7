//! Rill front-end CLI
//!
//! Runs the pipeline over a `.rl` file and renders diagnostics. There
//! is no backend: `check` is the whole story, `lex` and `parse` are
//! the debug dumps.

use clap::{Parser, Subcommand};
use rill_error::{DiagnosticRenderer, SourceCache};
use rill_lexer::render_tokens;
use rill_parser::render_ast;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "rill")]
#[command(version = "0.1.0")]
#[command(about = "Rill language front end", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Checks a file for lexical, syntax and semantic errors
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Shows file tokens (debug)
    Lex {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Shows file AST (debug)
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

/// Failures of the driver itself, as opposed to diagnostics in the
/// checked program (those are rendered before this error is returned)
#[derive(Debug, Error)]
enum DriverError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error")]
    ParseFailed,

    #[error("check failed with {count} error(s)")]
    CheckFailed { count: usize },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { input } => check(&input),
        Commands::Lex { input } => lex(&input),
        Commands::Parse { input } => parse(&input),
    };

    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<String, DriverError> {
    fs::read_to_string(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Full pipeline: lex, parse, analyze
fn check(path: &Path) -> Result<(), DriverError> {
    let source = read_source(path)?;

    let mut cache = SourceCache::new();
    let file_id = cache.add(path.display().to_string(), &source);
    let renderer = DiagnosticRenderer::new(&cache);

    // Phase 1: Lexical analysis. Error tokens flow into the parser
    // and surface there if the grammar consumes them.
    let tokens = rill_lexer::tokenize(&source, file_id);
    println!("  [ok] Lexer: {} tokens", tokens.len());

    // Phase 2: Parsing - fatal on the first syntax error
    let program = match rill_parser::parse(tokens) {
        Ok(program) => program,
        Err(diag) => {
            eprintln!("\nSyntax error:\n");
            eprintln!("{}", renderer.render(&diag));
            return Err(DriverError::ParseFailed);
        }
    };
    println!("  [ok] Parser: {} statements", program.statements.len());

    // Phase 3: Semantic analysis - collects every error before failing
    let (passed, diagnostics) = rill_semantic::analyze(&program);
    if !passed {
        eprintln!("\nSemantic errors:\n");
        for diag in diagnostics.iter() {
            eprintln!("{}", renderer.render(diag));
        }
        return Err(DriverError::CheckFailed {
            count: diagnostics.len(),
        });
    }
    println!("  [ok] Semantic: no errors");

    Ok(())
}

/// Token dump
fn lex(path: &Path) -> Result<(), DriverError> {
    let source = read_source(path)?;
    print!("{}", render_tokens(&source));
    Ok(())
}

/// AST dump
fn parse(path: &Path) -> Result<(), DriverError> {
    let source = read_source(path)?;

    let mut cache = SourceCache::new();
    let file_id = cache.add(path.display().to_string(), &source);

    let tokens = rill_lexer::tokenize(&source, file_id);
    match rill_parser::parse(tokens) {
        Ok(program) => {
            print!("{}", render_ast(&program));
            Ok(())
        }
        Err(diag) => {
            let renderer = DiagnosticRenderer::new(&cache);
            eprintln!("{}", renderer.render(&diag));
            Err(DriverError::ParseFailed)
        }
    }
}
