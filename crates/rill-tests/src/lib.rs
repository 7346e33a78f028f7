//! Integration tests for the Rill front end
//!
//! This crate exercises the complete pipeline:
//! Source → Lexer → Parser → Semantic

use rill_error::{Diagnostic, Diagnostics, ErrorCode};
use rill_lexer::tokenize;
use rill_parser::{parse, Program};
use rill_semantic::analyze;

/// Result of running a Rill source snippet through the pipeline
#[derive(Debug)]
pub struct CheckResult {
    /// Whether the whole pipeline passed
    pub passed: bool,
    /// The fatal syntax diagnostic, when parsing stopped the run
    pub syntax_error: Option<Diagnostic>,
    /// Semantic diagnostics (empty when parsing already failed)
    pub diagnostics: Diagnostics,
    /// The parsed program, when parsing succeeded
    pub program: Option<Program>,
}

/// Runs source code through the full front end
pub fn check(source: &str) -> CheckResult {
    // Phase 1: Lexing - lexical errors ride on the tokens
    let tokens = tokenize(source, 0);

    // Phase 2: Parsing - fatal on the first syntax error
    let program = match parse(tokens) {
        Ok(program) => program,
        Err(diag) => {
            return CheckResult {
                passed: false,
                syntax_error: Some(diag),
                diagnostics: Diagnostics::new(),
                program: None,
            };
        }
    };

    // Phase 3: Semantic analysis - non-fatal, collects everything
    let (passed, diagnostics) = analyze(&program);

    CheckResult {
        passed,
        syntax_error: None,
        diagnostics,
        program: Some(program),
    }
}

/// Asserts that source passes the whole pipeline without diagnostics
pub fn assert_accepts(source: &str) {
    let result = check(source);
    if let Some(diag) = &result.syntax_error {
        panic!(
            "expected '{}' to be accepted, but parsing failed: {}",
            source, diag.message
        );
    }
    if !result.passed {
        let messages: Vec<&str> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
        panic!(
            "expected '{}' to be accepted, but analysis failed: {:?}",
            source, messages
        );
    }
}

/// Asserts that parsing fails, returning the fatal diagnostic
pub fn assert_syntax_error(source: &str) -> Diagnostic {
    let result = check(source);
    match result.syntax_error {
        Some(diag) => diag,
        None => panic!("expected '{}' to fail parsing, but it did not", source),
    }
}

/// Asserts that parsing succeeds but analysis fails, returning the
/// collected diagnostics
pub fn assert_semantic_error(source: &str) -> Diagnostics {
    let result = check(source);
    if let Some(diag) = &result.syntax_error {
        panic!(
            "expected '{}' to reach the analyzer, but parsing failed: {}",
            source, diag.message
        );
    }
    if result.passed {
        panic!("expected '{}' to fail analysis, but it passed", source);
    }
    result.diagnostics
}

/// Counts diagnostics carrying the given code
pub fn count_code(diags: &Diagnostics, code: ErrorCode) -> usize {
    diags.iter().filter(|d| d.code == Some(code)).count()
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rill_parser::Stmt;

    // =========================================
    // Programs that pass end to end
    // =========================================

    #[test]
    fn test_empty_program() {
        let result = check("");
        assert!(result.passed);
        assert_eq!(result.program.map(|p| p.statements.len()), Some(0));
    }

    #[test]
    fn test_declaration_assignment_print() {
        let result = check("int x; x = 5; print x;");
        assert!(result.passed);
        assert!(result.diagnostics.is_empty());

        let program = result.program.expect("parsed program");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(program.statements[0], Stmt::VarDecl { .. }));
        assert!(matches!(program.statements[1], Stmt::Assign { .. }));
        assert!(matches!(program.statements[2], Stmt::Print { .. }));
    }

    #[test]
    fn test_all_constructs_together() {
        assert_accepts(
            r#"
            int x;
            float total;
            string label;
            x = 0;
            total = 0;
            label = "sum: " + "partial";
            while (x < 10) {
                total = total + x;
                x = x + 1;
            }
            repeat {
                x = x - 1;
            } until (x <= 0);
            if (total >= 45) {
                print label;
                print total;
            }
            factorial(x + 3);
            "#,
        );
    }

    #[test]
    fn test_if_with_single_statement_body() {
        assert_accepts("int x; x = 1; if (x == 1) x = 2;");
    }

    #[test]
    fn test_same_type_assignments_only() {
        assert_accepts("int a; a = 1; float b; b = a; char c; c = b;");
    }

    // =========================================
    // Syntax failures (fatal, first error only)
    // =========================================

    #[test]
    fn test_missing_semicolon_is_fatal() {
        let diag = assert_syntax_error("int x\nx = 5;");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_SEMICOLON));
        assert_eq!(diag.line(), Some(2));
    }

    #[test]
    fn test_parsing_stops_at_first_error() {
        // Two malformed declarations, but only the first is reported.
        let result = check("int ; int ;");
        assert!(result.syntax_error.is_some());
        assert!(result.diagnostics.is_empty());
        assert!(result.program.is_none());
    }

    #[test]
    fn test_else_is_rejected() {
        let diag = assert_syntax_error("int x; x = 1; if (x) { } else { }");
        assert_eq!(diag.code, Some(ErrorCode::UNEXPECTED_TOKEN));
    }

    #[test]
    fn test_consecutive_operator_token_surfaces_in_parse() {
        // Lexical errors surface only when the grammar consumes the
        // offending token; the diagnostic carries the lexical message.
        let diag = assert_syntax_error("int x; x = 1++2;");
        assert!(diag.notes.iter().any(|n| n.contains("consecutive operators")));
    }

    #[test]
    fn test_unterminated_string_surfaces_in_parse() {
        let diag = assert_syntax_error("string s; s = \"open;");
        assert!(diag.notes.iter().any(|n| n.contains("unterminated string")));
    }

    #[test]
    fn test_brackets_have_no_production() {
        let diag = assert_syntax_error("int x; x = [1];");
        assert_eq!(diag.code, Some(ErrorCode::INVALID_EXPRESSION));
    }

    // =========================================
    // Semantic failures (non-fatal, accumulated)
    // =========================================

    #[test]
    fn test_undeclared_assignment_fails_at_line_one() {
        let diags = assert_semantic_error("x = 5;");
        assert_eq!(count_code(&diags, ErrorCode::UNDECLARED_VARIABLE), 1);
        assert_eq!(diags.iter().next().and_then(|d| d.line()), Some(1));
    }

    #[test]
    fn test_redeclaration_fails() {
        let diags = assert_semantic_error("int x;\nint x;");
        assert_eq!(count_code(&diags, ErrorCode::REDECLARED_VARIABLE), 1);
        assert_eq!(diags.iter().next().and_then(|d| d.line()), Some(2));
    }

    #[test]
    fn test_string_concatenation_passes_but_numeric_source_fails() {
        assert_accepts("string s; s = \"a\" + \"b\";");

        let diags = assert_semantic_error("string s; int n; n = 1; s = n;");
        assert_eq!(count_code(&diags, ErrorCode::TYPE_MISMATCH), 1);
    }

    #[test]
    fn test_semantic_errors_accumulate() {
        let diags = assert_semantic_error("x = 1; y = 2; int z; print z;");
        assert_eq!(count_code(&diags, ErrorCode::UNDECLARED_VARIABLE), 2);
        assert_eq!(count_code(&diags, ErrorCode::UNINITIALIZED_VARIABLE), 1);
    }

    #[test]
    fn test_scope_visibility_across_block_exit() {
        // Inner declarations die with the block; outer ones survive it
        // with their initialized state intact.
        assert_accepts("int x; x = 1; { int y; y = x; } print x;");

        let diags = assert_semantic_error("int x; x = 1; { int y; y = 2; } print y;");
        assert_eq!(count_code(&diags, ErrorCode::UNDECLARED_VARIABLE), 1);
    }

    // =========================================
    // Tree shape
    // =========================================

    #[test]
    fn test_node_count_visits_every_node_once() {
        let result = check("int x; x = 1; { { if (x == 1) { x = (x + 2) * 3; } } }");
        let program = result.program.expect("parsed program");
        // Recounting is stable and independent of nesting depth.
        assert_eq!(program.node_count(), program.node_count());
        assert!(program.node_count() > 10);
    }

    #[test]
    fn test_deeply_nested_blocks() {
        let mut source = String::from("int x; x = 1; ");
        for _ in 0..64 {
            source.push('{');
        }
        source.push_str(" x = x + 1; ");
        for _ in 0..64 {
            source.push('}');
        }
        assert_accepts(&source);
    }
}
