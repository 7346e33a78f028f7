//! Semantic analyzer for the Rill language
//!
//! A single recursive walk over the statement list, carrying the
//! symbol table. Checking is best-effort: every error is reported as
//! a diagnostic and the walk keeps going, so one run can surface many
//! problems. The final verdict is the conjunction of every check.

use crate::symbols::{Symbol, SymbolTable};
use crate::types::{check_binary, check_comparison, OpCheck, TypeClass};
use rill_error::{Diagnostic, Diagnostics, ErrorCode, Span, Spanned};
use rill_parser::{Expr, Program, Stmt, VarType};

/// The semantic analyzer
pub struct Analyzer {
    /// Symbol table, fresh per run
    table: SymbolTable,
    /// Accumulated diagnostics
    diagnostics: Diagnostics,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Consumes and returns the diagnostics
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Checks the complete program, returning the overall verdict
    pub fn check_program(&mut self, program: &Program) -> bool {
        let mut result = true;
        for stmt in &program.statements {
            // Non-short-circuiting: later statements are still checked
            // after a failure.
            result = self.check_statement(stmt) & result;
        }
        result
    }

    /// Checks a single statement
    fn check_statement(&mut self, stmt: &Stmt) -> bool {
        match stmt {
            Stmt::VarDecl { ty, name, span } => self.check_declaration(*ty, name, *span),
            Stmt::Assign {
                name,
                name_span,
                value,
                ..
            } => self.check_assignment(name, *name_span, value),
            Stmt::Block { statements, .. } => self.check_block(statements),
            Stmt::If {
                condition, body, ..
            }
            | Stmt::While {
                condition, body, ..
            } => {
                let condition_ok = self.check_expr(condition);
                let body_ok = self.check_statement(body);
                condition_ok & body_ok
            }
            Stmt::RepeatUntil {
                body, condition, ..
            } => {
                // The block runs before the test; its scope closes at
                // the brace, so the condition sees only outer symbols.
                let body_ok = self.check_block(body);
                let condition_ok = self.check_expr(condition);
                body_ok & condition_ok
            }
            Stmt::Print { value, .. } => self.check_expr(value),
            Stmt::Factorial { arg, .. } => self.check_expr(arg),
            Stmt::Expr { expr, .. } => self.check_expr(expr),
        }
    }

    /// Checks a variable declaration
    fn check_declaration(&mut self, ty: VarType, name: &str, span: Span) -> bool {
        if let Some(existing) = self.table.lookup_current_scope(name) {
            let first_line = existing.line;
            self.diagnostics.push(
                Diagnostic::error(format!("variable '{}' already declared in this scope", name))
                    .with_code(ErrorCode::REDECLARED_VARIABLE)
                    .with_label(span, "redeclared here")
                    .with_note(format!("first declared at line {}", first_line)),
            );
            return false;
        }

        self.table.define(Symbol::new(name, ty, span.line()));
        true
    }

    /// Checks an assignment
    fn check_assignment(&mut self, name: &str, name_span: Span, value: &Expr) -> bool {
        let target_ty = match self.table.lookup(name) {
            Some(symbol) => symbol.ty,
            None => {
                self.diagnostics.push(
                    Diagnostic::error(format!("undeclared variable '{}'", name))
                        .with_code(ErrorCode::UNDECLARED_VARIABLE)
                        .with_label(name_span, "not declared before this assignment"),
                );
                return false;
            }
        };

        let value_ok = self.check_expr(value);

        // The target counts as initialized once a well-formed value
        // reaches it, even if the type rule below then rejects it.
        if value_ok {
            if let Some(symbol) = self.table.lookup_mut(name) {
                symbol.initialized = true;
            }
        }

        let target = TypeClass::of(target_ty);
        let value_class = self.expr_type(value);
        let types_ok = target.accepts(value_class);
        if !types_ok {
            self.diagnostics.push(
                Diagnostic::error(format!(
                    "type mismatch: cannot assign {} value to {} variable '{}'",
                    value_class, target, name
                ))
                .with_code(ErrorCode::TYPE_MISMATCH)
                .with_label(value.span(), format!("this is {}", value_class))
                .with_secondary_label(name_span, format!("'{}' is {}", name, target)),
            );
        }

        value_ok & types_ok
    }

    /// Checks a block, opening and closing its scope
    fn check_block(&mut self, statements: &[Stmt]) -> bool {
        self.table.push_scope();

        let mut result = true;
        for stmt in statements {
            result = self.check_statement(stmt) & result;
        }

        self.table.pop_scope();
        result
    }

    /// Checks an expression
    fn check_expr(&mut self, expr: &Expr) -> bool {
        match expr {
            Expr::Number { .. } | Expr::StringLit { .. } => true,
            Expr::Ident { name, span } => match self.table.lookup(name) {
                None => {
                    self.diagnostics.push(
                        Diagnostic::error(format!("undeclared variable '{}'", name))
                            .with_code(ErrorCode::UNDECLARED_VARIABLE)
                            .with_label(*span, "not found in any visible scope"),
                    );
                    false
                }
                Some(symbol) if !symbol.initialized => {
                    let line = symbol.line;
                    self.diagnostics.push(
                        Diagnostic::error(format!("variable '{}' may be used uninitialized", name))
                            .with_code(ErrorCode::UNINITIALIZED_VARIABLE)
                            .with_label(*span, "read before any assignment")
                            .with_note(format!("declared at line {}", line)),
                    );
                    false
                }
                Some(_) => true,
            },
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let operands_ok = self.check_expr(left) & self.check_expr(right);
                if !operands_ok {
                    return false;
                }
                match check_binary(*op, self.expr_type(left), self.expr_type(right)) {
                    OpCheck::Ok(_) => true,
                    OpCheck::Mismatch => {
                        self.diagnostics.push(
                            Diagnostic::error(format!(
                                "type mismatch: '{}' cannot combine numeric and string operands",
                                op
                            ))
                            .with_code(ErrorCode::TYPE_MISMATCH)
                            .with_label(*span, "operands belong to different type classes"),
                        );
                        false
                    }
                    OpCheck::InvalidOperation => {
                        self.diagnostics.push(
                            Diagnostic::error(format!(
                                "invalid operation: '{}' is not defined for strings",
                                op
                            ))
                            .with_code(ErrorCode::INVALID_OPERATION)
                            .with_label(*span, "only '+' concatenates strings"),
                        );
                        false
                    }
                }
            }
            Expr::Comparison {
                op,
                left,
                right,
                span,
            } => {
                let operands_ok = self.check_expr(left) & self.check_expr(right);
                if !operands_ok {
                    return false;
                }
                match check_comparison(self.expr_type(left), self.expr_type(right)) {
                    OpCheck::Ok(_) => true,
                    OpCheck::Mismatch => {
                        self.diagnostics.push(
                            Diagnostic::error(format!(
                                "type mismatch: '{}' cannot compare numeric and string operands",
                                op
                            ))
                            .with_code(ErrorCode::TYPE_MISMATCH)
                            .with_label(*span, "operands belong to different type classes"),
                        );
                        false
                    }
                    OpCheck::InvalidOperation => {
                        self.diagnostics.push(
                            Diagnostic::error(format!(
                                "invalid operation: '{}' is not defined for strings",
                                op
                            ))
                            .with_code(ErrorCode::INVALID_OPERATION)
                            .with_label(*span, "comparisons apply to numeric operands"),
                        );
                        false
                    }
                }
            }
            Expr::Condition { inner, .. } => self.check_expr(inner),
        }
    }

    /// Resolves the effective type class of an expression
    ///
    /// Identifiers resolve to their declared class (Numeric when the
    /// name is unknown - the undeclared error is reported elsewhere).
    /// A binary node is Text only when it concatenates two Text
    /// operands; everything else, comparisons and condition wrappers
    /// included, resolves Numeric.
    fn expr_type(&self, expr: &Expr) -> TypeClass {
        match expr {
            Expr::Number { .. } => TypeClass::Numeric,
            Expr::StringLit { .. } => TypeClass::Text,
            Expr::Ident { name, .. } => self
                .table
                .lookup(name)
                .map(|s| TypeClass::of(s.ty))
                .unwrap_or(TypeClass::Numeric),
            Expr::Binary {
                op, left, right, ..
            } => {
                if *op == rill_parser::BinOp::Add
                    && self.expr_type(left) == TypeClass::Text
                    && self.expr_type(right) == TypeClass::Text
                {
                    TypeClass::Text
                } else {
                    TypeClass::Numeric
                }
            }
            Expr::Comparison { .. } | Expr::Condition { .. } => TypeClass::Numeric,
        }
    }
}

/// Runs semantic analysis over a program
///
/// Returns the overall pass/fail verdict and every diagnostic the walk
/// produced. The verdict is false exactly when at least one check
/// failed.
pub fn analyze(program: &Program) -> (bool, Diagnostics) {
    let mut analyzer = Analyzer::new();
    let passed = analyzer.check_program(program);
    (passed, analyzer.take_diagnostics())
}
