//! Error types for the prepass canonicalizer
//!
//! All fallible operations return `Result<T, Error>`.
//! Every error is fatal to the current `canonicalize` call; there is no
//! partial output.

use serde::Serialize;

/// Position in source text for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Span {
    /// Locate a byte offset in `text` as a 1-based line and column.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to
    /// the end of the text.
    pub fn locate(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let mut line = 1;
        let mut column = 1;
        for (i, ch) in text.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Span { line, column, offset }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A failed match of the whole input against a grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    /// Name of the grammar that rejected the input
    pub grammar: String,
    /// Furthest byte offset reached by any attempted alternative
    pub offset: usize,
    pub span: Span,
    /// Everything that would have been accepted at `offset`, sorted
    pub expected: Vec<String>,
    /// Source text starting at `offset`, truncated
    pub fragment: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Line {}, col {}: ", self.span.line, self.span.column)?;
        if self.expected.is_empty() {
            write!(f, "unexpected input")?;
        } else {
            write!(f, "expected {}", self.expected.join(" or "))?;
        }
        write!(f, " (grammar \"{}\", near {:?})", self.grammar, self.fragment)
    }
}

/// Prepass error types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Error {
    /// The input does not match the grammar
    #[error("Syntax error: {0}")]
    Syntax(ParseError),

    /// Internal invariant violated by an action or the matcher
    #[error("Usage error: {0}")]
    Usage(String),

    /// Two names bracketing a construct disagree
    #[error("Semantic mismatch at offset {offset}: ending name {found} does not match name {expected}")]
    SemanticMismatch {
        expected: String,
        found: String,
        offset: usize,
    },

    /// Grammar rejected at construction time
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The rewrite driver did not reach a fixed point in time
    #[error("No fixed point after {limit} passes")]
    PassLimit { limit: usize },
}

/// Result type alias for prepass operations
pub type Result<T> = std::result::Result<T, Error>;
