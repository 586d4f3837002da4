use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

/// A position in a grammar source file.
///
/// Rows and columns are zero-based internally and rendered one-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loc {
    pub file: String,
    pub row: usize,
    pub col: usize,
}

impl Loc {
    pub fn new(file: impl Into<String>, row: usize, col: usize) -> Self {
        Loc {
            file: file.into(),
            row,
            col,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row + 1, self.col + 1)
    }
}

/// An error tied to a source location.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{loc}: error: {message}")]
pub struct Diagnostic {
    pub loc: Loc,
    pub message: String,
}

impl Diagnostic {
    pub fn new(loc: Loc, message: impl Into<String>) -> Self {
        Diagnostic {
            loc,
            message: message.into(),
        }
    }
}

/// Custom error types for the grammar generator
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),

    /// Every diagnostic collected while ingesting a grammar source.
    #[error("{}", fmt_diagnostics(.0))]
    Source(Vec<Diagnostic>),

    #[error("symbol <{0}> is not defined")]
    UndefinedEntry(String),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

fn fmt_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let lines: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loc_displays_one_based() {
        let loc = Loc::new("grammar.bnf", 0, 4);
        assert_eq!(loc.to_string(), "grammar.bnf:1:5");
    }

    #[test]
    fn diagnostic_display() {
        let diagnostic = Diagnostic::new(Loc::new("g.bnf", 2, 0), "invalid token");
        assert_eq!(diagnostic.to_string(), "g.bnf:3:1: error: invalid token");
    }

    #[test]
    fn source_error_joins_diagnostics() {
        let err = GrammarError::Source(vec![
            Diagnostic::new(Loc::new("g.bnf", 0, 0), "first"),
            Diagnostic::new(Loc::new("g.bnf", 1, 0), "second"),
        ]);
        assert_eq!(
            err.to_string(),
            "g.bnf:1:1: error: first\ng.bnf:2:1: error: second"
        );
    }
}
