//! Parser for the Rill language
//!
//! One-token-lookahead recursive descent. Every production returns a
//! `Result`; the first syntax error propagates out through `?` and the
//! run stops there - no synchronization, no multi-error recovery.

use crate::ast::*;
use rill_error::{Diagnostic, ErrorCode, Result, Span, Spanned};
use rill_lexer::{Token, TokenKind};

/// Parser for the Rill language
pub struct Parser {
    /// Tokens to be parsed (ends with EOF)
    tokens: Vec<Token>,
    /// Current position
    pos: usize,
}

impl Parser {
    /// Creates a new parser over a token stream
    ///
    /// The stream is expected to end with an EOF token, as produced by
    /// `rill_lexer::tokenize`; a trailing EOF is appended if missing so
    /// lookahead never runs off the end.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().map(Token::is_eof).unwrap_or(false) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "EOF", span));
        }
        Self { tokens, pos: 0 }
    }

    // =========================================
    // Helpers
    // =========================================

    /// Returns the current token without advancing
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("tokens end with EOF"))
    }

    /// Returns the previously consumed token
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Checks if the current token is of the given kind
    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Checks if we've reached the end
    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    /// Advances to the next token, returning the one consumed
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Requires a token of the given kind or fails with a diagnostic
    fn expect(&mut self, kind: TokenKind, code: ErrorCode, message: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(self.error_at_current(code, message))
        }
    }

    /// Builds a diagnostic pointing at the current token
    ///
    /// A lexical error token consumed by the grammar surfaces its
    /// lexical message here, riding along as a note on the fatal
    /// syntax diagnostic.
    fn error_at_current(&self, code: ErrorCode, message: &str) -> Diagnostic {
        let token = self.peek();
        let mut diag = Diagnostic::error(message)
            .with_code(code)
            .with_label(token.span, format!("found '{}'", token.lexeme));
        if let Some(lex_error) = token.error {
            diag = diag.with_note(format!("lexical error: {} '{}'", lex_error, token.lexeme));
        }
        diag
    }

    // =========================================
    // Program and statements
    // =========================================

    /// Parses the complete program
    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    /// Parses a single statement, dispatching on the leading token
    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Int | TokenKind::Float | TokenKind::Char | TokenKind::StringType => {
                self.parse_declaration()
            }
            TokenKind::Ident => self.parse_assignment(),
            TokenKind::LBrace => self.parse_block_stmt(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Factorial => self.parse_factorial(),
            // A statement may start with an operator token; the
            // expression rule then decides whether anything valid
            // follows.
            TokenKind::Operator => self.parse_expr_statement(),
            TokenKind::Else => Err(self
                .error_at_current(ErrorCode::UNEXPECTED_TOKEN, "'else' is not supported")
                .with_note("the keyword is reserved but has no grammar rule")),
            _ => Err(self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                &format!("unexpected token '{}'", self.peek().lexeme),
            )),
        }
    }

    /// Parse: `int x;` (also float/char/string)
    fn parse_declaration(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        let ty = match self.advance().kind {
            TokenKind::Int => VarType::Int,
            TokenKind::Float => VarType::Float,
            TokenKind::Char => VarType::Char,
            _ => VarType::Str,
        };

        let name_token = self.expect(
            TokenKind::Ident,
            ErrorCode::MISSING_IDENTIFIER,
            "expected identifier after type keyword",
        )?;

        // Declarations never take an initializer.
        self.expect(
            TokenKind::Semicolon,
            ErrorCode::MISSING_SEMICOLON,
            "expected ';' after declaration",
        )?;

        Ok(Stmt::VarDecl {
            ty,
            name: name_token.lexeme,
            span: start_span.merge(self.previous().span),
        })
    }

    /// Parse: `x = expr;`
    fn parse_assignment(&mut self) -> Result<Stmt> {
        let name_token = self.advance().clone();

        self.expect(
            TokenKind::Equals,
            ErrorCode::MISSING_EQUALS,
            &format!("expected '=' after '{}'", name_token.lexeme),
        )?;

        let value = self.parse_expression()?;

        self.expect(
            TokenKind::Semicolon,
            ErrorCode::MISSING_SEMICOLON,
            "expected ';' after assignment",
        )?;

        Ok(Stmt::Assign {
            name: name_token.lexeme,
            name_span: name_token.span,
            value,
            span: name_token.span.merge(self.previous().span),
        })
    }

    /// Parses `{ statement* }` and returns the inner statements
    fn parse_block_statements(&mut self) -> Result<(Vec<Stmt>, Span)> {
        let start_span = self.peek().span;
        self.expect(
            TokenKind::LBrace,
            ErrorCode::MISSING_LBRACE,
            "expected '{'",
        )?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(
                    self.error_at_current(ErrorCode::MISSING_RBRACE, "expected '}' before end of file")
                );
            }
            statements.push(self.parse_statement()?);
        }
        self.advance(); // consume '}'

        Ok((statements, start_span.merge(self.previous().span)))
    }

    /// Parse: `{ statement* }` as a statement
    fn parse_block_stmt(&mut self) -> Result<Stmt> {
        let (statements, span) = self.parse_block_statements()?;
        Ok(Stmt::Block { statements, span })
    }

    /// Parse: `if (expr) block-or-statement`
    fn parse_if(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        self.advance(); // consume 'if'

        self.expect(
            TokenKind::LParen,
            ErrorCode::MISSING_LPAREN,
            "expected '(' after 'if'",
        )?;
        let condition = self.parse_expression()?;
        self.expect(
            TokenKind::RParen,
            ErrorCode::MISSING_RPAREN,
            "expected ')' after condition",
        )?;

        // The body is a brace-delimited block or exactly one bare
        // statement; there is no `else` production.
        let body = if self.check(TokenKind::LBrace) {
            self.parse_block_stmt()?
        } else {
            self.parse_statement()?
        };

        Ok(Stmt::If {
            condition,
            body: Box::new(body),
            span: start_span.merge(self.previous().span),
        })
    }

    /// Parse: `while (expr) block-or-statement`
    fn parse_while(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        self.advance(); // consume 'while'

        self.expect(
            TokenKind::LParen,
            ErrorCode::MISSING_LPAREN,
            "expected '(' after 'while'",
        )?;
        let condition = self.parse_expression()?;
        self.expect(
            TokenKind::RParen,
            ErrorCode::MISSING_RPAREN,
            "expected ')' after condition",
        )?;

        let body = if self.check(TokenKind::LBrace) {
            self.parse_block_stmt()?
        } else {
            self.parse_statement()?
        };

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
            span: start_span.merge(self.previous().span),
        })
    }

    /// Parse: `repeat { ... } until (expr);`
    fn parse_repeat(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        self.advance(); // consume 'repeat'

        if !self.check(TokenKind::LBrace) {
            return Err(self.error_at_current(
                ErrorCode::MISSING_LBRACE,
                "expected '{' after 'repeat'",
            ));
        }
        let (body, _) = self.parse_block_statements()?;

        self.expect(
            TokenKind::Until,
            ErrorCode::MISSING_UNTIL,
            "expected 'until' after repeat block",
        )?;
        self.expect(
            TokenKind::LParen,
            ErrorCode::MISSING_LPAREN,
            "expected '(' after 'until'",
        )?;

        let test = self.parse_expression()?;
        let condition_span = test.span();

        self.expect(
            TokenKind::RParen,
            ErrorCode::MISSING_RPAREN,
            "expected ')' after condition",
        )?;
        self.expect(
            TokenKind::Semicolon,
            ErrorCode::MISSING_SEMICOLON,
            "expected ';' after 'until (...)'",
        )?;

        Ok(Stmt::RepeatUntil {
            body,
            condition: Expr::Condition {
                inner: Box::new(test),
                span: condition_span,
            },
            span: start_span.merge(self.previous().span),
        })
    }

    /// Parse: `print expr;`
    fn parse_print(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        self.advance(); // consume 'print'

        let value = self.parse_expression()?;

        self.expect(
            TokenKind::Semicolon,
            ErrorCode::MISSING_SEMICOLON,
            "expected ';' after print statement",
        )?;

        Ok(Stmt::Print {
            value,
            span: start_span.merge(self.previous().span),
        })
    }

    /// Parse: `factorial(expr);`
    fn parse_factorial(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        self.advance(); // consume 'factorial'

        self.expect(
            TokenKind::LParen,
            ErrorCode::MISSING_LPAREN,
            "expected '(' after 'factorial'",
        )?;
        let arg = self.parse_expression()?;
        self.expect(
            TokenKind::RParen,
            ErrorCode::MISSING_RPAREN,
            "expected ')' after factorial argument",
        )?;
        self.expect(
            TokenKind::Semicolon,
            ErrorCode::MISSING_SEMICOLON,
            "expected ';' after 'factorial(...)'",
        )?;

        Ok(Stmt::Factorial {
            arg,
            span: start_span.merge(self.previous().span),
        })
    }

    /// Parse a bare expression statement: `expr;`
    fn parse_expr_statement(&mut self) -> Result<Stmt> {
        let start_span = self.peek().span;
        let expr = self.parse_expression()?;

        self.expect(
            TokenKind::Semicolon,
            ErrorCode::MISSING_SEMICOLON,
            "expected ';' after expression",
        )?;

        Ok(Stmt::Expr {
            expr,
            span: start_span.merge(self.previous().span),
        })
    }

    // =========================================
    // Expressions
    // =========================================

    /// Parses an expression as a flat left-to-right chain
    ///
    /// There is no precedence climbing: `a + b * c` builds
    /// `(a + b) * c`. A comparison wraps its node in an extra
    /// Condition node, keeping comparisons structurally distinct from
    /// arithmetic.
    fn parse_expression(&mut self) -> Result<Expr> {
        let mut node = self.parse_primary()?;

        loop {
            if self.check(TokenKind::Comparison) {
                let op = self.comparison_op()?;
                self.advance();
                let right = self.parse_primary()?;
                let span = node.span().merge(right.span());
                let comparison = Expr::Comparison {
                    op,
                    left: Box::new(node),
                    right: Box::new(right),
                    span,
                };
                node = Expr::Condition {
                    inner: Box::new(comparison),
                    span,
                };
            } else if self.check(TokenKind::Operator) {
                let op = self.binary_op()?;
                self.advance();
                let right = self.parse_primary()?;
                let span = node.span().merge(right.span());
                node = Expr::Binary {
                    op,
                    left: Box::new(node),
                    right: Box::new(right),
                    span,
                };
            } else {
                break;
            }
        }

        Ok(node)
    }

    /// Parses a primary: parenthesized expression or literal/name
    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek().kind {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(
                    TokenKind::RParen,
                    ErrorCode::MISSING_RPAREN,
                    "expected ')' after expression",
                )?;
                Ok(expr)
            }
            TokenKind::Number => {
                let token = self.advance();
                let span = token.span;
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    Diagnostic::error(format!("invalid number '{}'", token.lexeme))
                        .with_code(ErrorCode::INVALID_EXPRESSION)
                        .with_label(span, "not a valid integer")
                })?;
                Ok(Expr::Number { value, span })
            }
            TokenKind::StringLit => {
                let token = self.advance();
                Ok(Expr::StringLit {
                    value: token.lexeme.clone(),
                    span: token.span,
                })
            }
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Expr::Ident {
                    name: token.lexeme.clone(),
                    span: token.span,
                })
            }
            _ => Err(self.error_at_current(
                ErrorCode::INVALID_EXPRESSION,
                &format!("invalid expression at '{}'", self.peek().lexeme),
            )),
        }
    }

    /// Maps the current operator token to a [`BinOp`]
    fn binary_op(&self) -> Result<BinOp> {
        match self.peek().lexeme.as_str() {
            "+" => Ok(BinOp::Add),
            "-" => Ok(BinOp::Sub),
            "*" => Ok(BinOp::Mul),
            "/" => Ok(BinOp::Div),
            other => Err(self.error_at_current(
                ErrorCode::INVALID_EXPRESSION,
                &format!("invalid operator '{}'", other),
            )),
        }
    }

    /// Maps the current comparison token to a [`CmpOp`]
    fn comparison_op(&self) -> Result<CmpOp> {
        match self.peek().lexeme.as_str() {
            "==" => Ok(CmpOp::Eq),
            "!=" => Ok(CmpOp::Ne),
            "||" => Ok(CmpOp::Or),
            "<=" => Ok(CmpOp::Le),
            ">=" => Ok(CmpOp::Ge),
            "<" => Ok(CmpOp::Lt),
            ">" => Ok(CmpOp::Gt),
            "!" => Ok(CmpOp::Not),
            other => Err(self.error_at_current(
                ErrorCode::INVALID_COMPARISON,
                &format!("invalid comparison '{}'", other),
            )),
        }
    }
}

/// Parses a token stream into a program
pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::render_ast;
    use pretty_assertions::assert_eq;
    use rill_lexer::tokenize;

    fn parse_source(source: &str) -> Result<Program> {
        parse(tokenize(source, 0))
    }

    fn parse_ok(source: &str) -> Program {
        match parse_source(source) {
            Ok(program) => program,
            Err(diag) => panic!("expected '{}' to parse, got: {}", source, diag.message),
        }
    }

    fn parse_err(source: &str) -> Diagnostic {
        match parse_source(source) {
            Ok(_) => panic!("expected '{}' to fail parsing", source),
            Err(diag) => diag,
        }
    }

    #[test]
    fn test_three_statement_chain() {
        let program = parse_ok("int x; x = 5; print x;");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(&program.statements[0], Stmt::VarDecl { ty: VarType::Int, name, .. } if name == "x"));
        assert!(matches!(&program.statements[1], Stmt::Assign { name, .. } if name == "x"));
        assert!(matches!(&program.statements[2], Stmt::Print { .. }));
    }

    #[test]
    fn test_declarations_of_all_types() {
        let program = parse_ok("int a; float b; char c; string d;");
        let types: Vec<VarType> = program
            .statements
            .iter()
            .map(|s| match s {
                Stmt::VarDecl { ty, .. } => *ty,
                other => panic!("expected declaration, got {:?}", other),
            })
            .collect();
        assert_eq!(
            types,
            vec![VarType::Int, VarType::Float, VarType::Char, VarType::Str]
        );
    }

    #[test]
    fn test_declaration_rejects_initializer() {
        let diag = parse_err("int x = 5;");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_SEMICOLON));
    }

    #[test]
    fn test_assignment_without_declaration_still_parses() {
        // "x = 5;" is syntactically fine; only the analyzer rejects it.
        let program = parse_ok("x = 5;");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_missing_semicolon() {
        let diag = parse_err("int x");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_SEMICOLON));
        assert_eq!(diag.line(), Some(1));
    }

    #[test]
    fn test_missing_identifier() {
        let diag = parse_err("int ;");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_IDENTIFIER));
    }

    #[test]
    fn test_missing_equals() {
        let diag = parse_err("x 5;");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_EQUALS));
    }

    #[test]
    fn test_if_with_comparison_condition() {
        let program = parse_ok("if (x == 1) { x = 2; }");
        let (condition, body) = match &program.statements[0] {
            Stmt::If { condition, body, .. } => (condition, body),
            other => panic!("expected if, got {:?}", other),
        };

        // The condition is a comparison wrapped in a Condition node.
        let inner = match condition {
            Expr::Condition { inner, .. } => inner,
            other => panic!("expected condition wrapper, got {:?}", other),
        };
        match inner.as_ref() {
            Expr::Comparison { op, left, right, .. } => {
                assert_eq!(*op, CmpOp::Eq);
                assert!(matches!(left.as_ref(), Expr::Ident { name, .. } if name == "x"));
                assert!(matches!(right.as_ref(), Expr::Number { value: 1, .. }));
            }
            other => panic!("expected comparison, got {:?}", other),
        }

        // The body is a one-statement block.
        match body.as_ref() {
            Stmt::Block { statements, .. } => assert_eq!(statements.len(), 1),
            other => panic!("expected block body, got {:?}", other),
        }
    }

    #[test]
    fn test_if_with_single_statement_body() {
        let program = parse_ok("if (x) x = 1;");
        match &program.statements[0] {
            Stmt::If { body, .. } => {
                assert!(matches!(body.as_ref(), Stmt::Assign { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_statement() {
        let program = parse_ok("while (x > 0) { x = x - 1; }");
        assert!(matches!(&program.statements[0], Stmt::While { .. }));
    }

    #[test]
    fn test_repeat_until() {
        let program = parse_ok("repeat { x = x + 1; } until (x >= 10);");
        match &program.statements[0] {
            Stmt::RepeatUntil { body, condition, .. } => {
                assert_eq!(body.len(), 1);
                assert!(matches!(condition, Expr::Condition { .. }));
            }
            other => panic!("expected repeat-until, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_requires_block() {
        let diag = parse_err("repeat x = 1; until (x);");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_LBRACE));
    }

    #[test]
    fn test_repeat_requires_until() {
        let diag = parse_err("repeat { x = 1; } (x);");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_UNTIL));
    }

    #[test]
    fn test_factorial_call() {
        let program = parse_ok("factorial(5);");
        match &program.statements[0] {
            Stmt::Factorial { arg, .. } => {
                assert!(matches!(arg, Expr::Number { value: 5, .. }));
            }
            other => panic!("expected factorial, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_precedence() {
        // "a + b * c" chains left-to-right: (a + b) * c.
        let program = parse_ok("x = a + b * c;");
        let value = match &program.statements[0] {
            Stmt::Assign { value, .. } => value,
            other => panic!("expected assignment, got {:?}", other),
        };
        match value {
            Expr::Binary { op, left, .. } => {
                assert_eq!(*op, BinOp::Mul);
                assert!(matches!(
                    left.as_ref(),
                    Expr::Binary { op: BinOp::Add, .. }
                ));
            }
            other => panic!("expected binary chain, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_grouping() {
        let program = parse_ok("x = a * (b + c);");
        let value = match &program.statements[0] {
            Stmt::Assign { value, .. } => value,
            other => panic!("expected assignment, got {:?}", other),
        };
        match value {
            Expr::Binary { op, right, .. } => {
                assert_eq!(*op, BinOp::Mul);
                assert!(matches!(
                    right.as_ref(),
                    Expr::Binary { op: BinOp::Add, .. }
                ));
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparisons_nest_conditions() {
        let program = parse_ok("x = a == b == c;");
        let value = match &program.statements[0] {
            Stmt::Assign { value, .. } => value,
            other => panic!("expected assignment, got {:?}", other),
        };
        // Outermost: Condition(Comparison(Condition(...), c))
        let inner = match value {
            Expr::Condition { inner, .. } => inner,
            other => panic!("expected condition wrapper, got {:?}", other),
        };
        match inner.as_ref() {
            Expr::Comparison { left, .. } => {
                assert!(matches!(left.as_ref(), Expr::Condition { .. }));
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_operator_statement_is_invalid_expression() {
        let diag = parse_err("+ 1;");
        assert_eq!(diag.code, Some(ErrorCode::INVALID_EXPRESSION));
    }

    #[test]
    fn test_else_is_flagged() {
        let diag = parse_err("if (x) { } else { }");
        assert_eq!(diag.code, Some(ErrorCode::UNEXPECTED_TOKEN));
    }

    #[test]
    fn test_unclosed_block() {
        let diag = parse_err("{ int x;");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_RBRACE));
    }

    #[test]
    fn test_missing_rparen() {
        let diag = parse_err("if (x { }");
        assert_eq!(diag.code, Some(ErrorCode::MISSING_RPAREN));
    }

    #[test]
    fn test_lexical_error_surfaces_when_consumed() {
        // The consecutive-operator error token is only reported once
        // the grammar actually consumes it.
        let diag = parse_err("x = 1++2;");
        assert!(diag
            .notes
            .iter()
            .any(|n| n.contains("consecutive operators")));
    }

    #[test]
    fn test_error_reports_offending_line() {
        let diag = parse_err("int x;\nint ;");
        assert_eq!(diag.line(), Some(2));
    }

    #[test]
    fn test_node_count_deeply_nested() {
        let program = parse_ok("{ { { int x; x = ((1 + 2)) * 3; } } }");
        // 1 program + 3 blocks + decl + assign + binary(+ its two
        // operands) + binary(* and number) = every node exactly once.
        assert_eq!(program.node_count(), 11);
    }

    #[test]
    fn test_render_ast_shape() {
        let program = parse_ok("int x; x = 5;");
        let dump = render_ast(&program);
        assert!(dump.starts_with("Program\n"));
        assert!(dump.contains("--VarDecl: int x"));
        assert!(dump.contains("--Assign"));
        assert!(dump.contains("----Identifier: x"));
        assert!(dump.contains("----Number: 5"));
    }
}
