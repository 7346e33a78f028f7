//! Diagnostic - Rust-style error message system
//!
//! Every stage of the front end reports problems through the same
//! structure: a severity level, an error code, a message, and labels
//! that point back into the source text.

use crate::span::Span;
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Fatal error - the run fails
    Error,
    /// Warning - the run still passes
    Warning,
    /// Note - additional information
    Note,
    /// Help - fix suggestion
    Help,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
            Level::Help => "help",
        }
    }

    /// ANSI code for coloring (when the terminal supports it)
    pub fn color_code(&self) -> &'static str {
        match self {
            Level::Error => "\x1b[1;31m",   // Bold Red
            Level::Warning => "\x1b[1;33m", // Bold Yellow
            Level::Note => "\x1b[1;36m",    // Bold Cyan
            Level::Help => "\x1b[1;32m",    // Bold Green
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A label pointing at a specific region of the code
#[derive(Debug, Clone)]
pub struct Label {
    /// Span of the region
    pub span: Span,
    /// Label message
    pub message: String,
    /// Whether this is the primary or a secondary label
    pub primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            primary: false,
        }
    }
}

/// Structured error code
///
/// The category letter names the stage that produced the error:
/// L = lexical, P = parse, S = semantic. The three taxonomies do not
/// overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    /// Category (L = Lexical, P = Parse, S = Semantic)
    pub category: char,
    /// Error number
    pub number: u16,
}

impl ErrorCode {
    pub const fn new(category: char, number: u16) -> Self {
        Self { category, number }
    }

    // Lexical errors
    pub const INVALID_CHAR: Self = Self::new('L', 1);
    pub const INVALID_NUMBER: Self = Self::new('L', 2);
    pub const CONSECUTIVE_OPERATORS: Self = Self::new('L', 3);
    pub const INVALID_IDENTIFIER: Self = Self::new('L', 4);
    pub const UNTERMINATED_STRING: Self = Self::new('L', 5);
    pub const UNKNOWN_ESCAPE: Self = Self::new('L', 6);

    // Parse errors
    pub const UNEXPECTED_TOKEN: Self = Self::new('P', 1);
    pub const MISSING_SEMICOLON: Self = Self::new('P', 2);
    pub const MISSING_IDENTIFIER: Self = Self::new('P', 3);
    pub const MISSING_EQUALS: Self = Self::new('P', 4);
    pub const MISSING_LPAREN: Self = Self::new('P', 5);
    pub const MISSING_RPAREN: Self = Self::new('P', 6);
    pub const MISSING_LBRACE: Self = Self::new('P', 7);
    pub const MISSING_RBRACE: Self = Self::new('P', 8);
    pub const MISSING_LBRACK: Self = Self::new('P', 9);
    pub const MISSING_RBRACK: Self = Self::new('P', 10);
    pub const MISSING_UNTIL: Self = Self::new('P', 11);
    pub const INVALID_EXPRESSION: Self = Self::new('P', 12);
    pub const INVALID_STATEMENT: Self = Self::new('P', 13);
    pub const INVALID_COMPARISON: Self = Self::new('P', 14);

    // Semantic errors
    pub const UNDECLARED_VARIABLE: Self = Self::new('S', 1);
    pub const REDECLARED_VARIABLE: Self = Self::new('S', 2);
    pub const TYPE_MISMATCH: Self = Self::new('S', 3);
    pub const UNINITIALIZED_VARIABLE: Self = Self::new('S', 4);
    pub const INVALID_OPERATION: Self = Self::new('S', 5);
    pub const UNKNOWN_STATEMENT: Self = Self::new('S', 6);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.category, self.number)
    }
}

/// A complete diagnostic
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level
    pub level: Level,
    /// Error code (optional)
    pub code: Option<ErrorCode>,
    /// Main message
    pub message: String,
    /// Labels pointing into the code
    pub labels: Vec<Label>,
    /// Additional notes
    pub notes: Vec<String>,
    /// Fix suggestions
    pub helps: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            helps: Vec::new(),
        }
    }

    /// Creates a new warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            helps: Vec::new(),
        }
    }

    /// Sets the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Adds a primary label
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Adds a secondary label
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Adds a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a fix suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.helps.push(help.into());
        self
    }

    /// The 1-based line of the primary label, if any
    pub fn line(&self) -> Option<u32> {
        self.labels.iter().find(|l| l.primary).map(|l| l.span.line())
    }
}

/// Stores source files for rendering diagnostics
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Vec<SourceFile>,
}

#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Offset of each line start (for fast lookup)
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Returns one line of source text (line is 1-indexed)
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let line_idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(line_idx)?;
        let end = self
            .line_starts
            .get(line_idx + 1)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.source.len());

        Some(&self.source[start..end])
    }
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns its ID
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        let id = self.files.len() as u32;
        self.files.push(SourceFile::new(name, source));
        id
    }

    pub fn get(&self, id: u32) -> Option<&SourceFile> {
        self.files.get(id as usize)
    }
}

/// Renders a diagnostic for display
pub struct DiagnosticRenderer<'a> {
    cache: &'a SourceCache,
    use_colors: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self {
            cache,
            use_colors: true,
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Renders the diagnostic as a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        let reset = if self.use_colors { "\x1b[0m" } else { "" };
        let color = if self.use_colors {
            diagnostic.level.color_code()
        } else {
            ""
        };
        let bold = if self.use_colors { "\x1b[1m" } else { "" };

        // Line 1: error[ES001]: message
        output.push_str(color);
        output.push_str(diagnostic.level.as_str());

        if let Some(code) = &diagnostic.code {
            output.push('[');
            output.push_str(&code.to_string());
            output.push(']');
        }

        output.push_str(reset);
        output.push_str(bold);
        output.push_str(": ");
        output.push_str(&diagnostic.message);
        output.push_str(reset);
        output.push('\n');

        // Labels with code snippets
        for label in &diagnostic.labels {
            if let Some(file) = self.cache.get(label.span.file_id) {
                let blue = if self.use_colors { "\x1b[1;34m" } else { "" };

                // --> file:line:column
                output.push_str(&format!(
                    " {}-->{} {}:{}:{}\n",
                    blue,
                    reset,
                    file.name,
                    label.span.start.line,
                    label.span.start.column
                ));

                if let Some(line_content) = file.get_line(label.span.start.line) {
                    let line_num = label.span.start.line;
                    let line_num_width = line_num.to_string().len();
                    let padding = " ".repeat(line_num_width);

                    // Empty gutter line
                    output.push_str(&format!(" {} {}|{}\n", padding, blue, reset));

                    // Line with code
                    output.push_str(&format!(
                        " {}{}{} |{} {}\n",
                        blue, line_num, reset, reset, line_content
                    ));

                    // Line with underline
                    let col_start = label.span.start.column as usize;
                    let underline_len = if label.span.start.line == label.span.end.line {
                        (label.span.end.column.saturating_sub(label.span.start.column)).max(1)
                            as usize
                    } else {
                        line_content.len().saturating_sub(col_start.saturating_sub(1)).max(1)
                    };

                    let spaces = " ".repeat(col_start.saturating_sub(1));
                    let underline_char = if label.primary { '^' } else { '-' };
                    let underline = underline_char.to_string().repeat(underline_len);

                    let label_color = if label.primary { color } else { blue };

                    output.push_str(&format!(
                        " {} {}|{} {}{}{} {}\n",
                        padding, blue, reset, spaces, label_color, underline, label.message
                    ));
                    output.push_str(reset);
                }
            }
        }

        // Notes
        for note in &diagnostic.notes {
            output.push_str(&format!("   = {}note{}: {}\n", bold, reset, note));
        }

        // Suggestions
        for help in &diagnostic.helps {
            let green = if self.use_colors { "\x1b[1;32m" } else { "" };
            output.push_str(&format!("   = {}help{}: {}\n", green, reset, help));
        }

        output
    }
}
