// CQL Syntax Errors
//
// Errors carry the position of the offending input and distinguish
// lexical failures from grammatical ones.

use std::fmt;

/// Which phase rejected the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    Lexical,
    Grammar,
}

/// Malformed CQL text
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub column: usize,
    /// What the parser expected, or the lexical problem description
    pub expected: String,
    /// The offending token or character; `<EOF>` at end of input
    pub found: String,
    /// Source text preceding a lexical failure
    pub context: String,
}

impl SyntaxError {
    pub fn lexical(
        line: usize,
        column: usize,
        description: impl Into<String>,
        found: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        SyntaxError {
            kind: SyntaxErrorKind::Lexical,
            line,
            column,
            expected: description.into(),
            found: found.into(),
            context: context.into(),
        }
    }

    pub fn grammar(
        line: usize,
        column: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        SyntaxError {
            kind: SyntaxErrorKind::Grammar,
            line,
            column,
            expected: expected.into(),
            found: found.into(),
            context: String::new(),
        }
    }

    pub fn is_lexical(&self) -> bool {
        self.kind == SyntaxErrorKind::Lexical
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SyntaxErrorKind::Lexical => write!(
                f,
                "Lexical error at line {}, column {}: {}. Encountered: {} after \"{}\"",
                self.line, self.column, self.expected, self.found, self.context
            ),
            SyntaxErrorKind::Grammar => write!(
                f,
                "Syntax error at line {}, column {}: expected {}, found {}",
                self.line, self.column, self.expected, self.found
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Result type for CQL parsing
pub type ParseResult<T> = Result<T, SyntaxError>;
