//! Tolerant JSON loading
//!
//! Hand-edited credential and input files often carry a byte order mark or
//! lines holding stray whitespace (non-breaking spaces, form feeds) that a
//! strict parser rejects. These helpers clean those up, then either return
//! the whole document or a classified error. Partial data is never returned.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

/// Category of a JSON loading failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    /// The document contains nothing but whitespace
    Empty,
    /// The document ended before a value was complete
    Truncated,
    /// The document is not well-formed JSON
    Syntax,
    /// Well-formed JSON with an unexpected shape
    Data,
    /// The file could not be read
    Io,
}

impl std::fmt::Display for JsonErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JsonErrorKind::Empty => "empty",
            JsonErrorKind::Truncated => "truncated",
            JsonErrorKind::Syntax => "malformed",
            JsonErrorKind::Data => "unexpected",
            JsonErrorKind::Io => "unreadable",
        };
        f.write_str(name)
    }
}

/// A classified JSON loading failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} JSON (line {line}, column {column}): {message}")]
pub struct JsonLoadError {
    pub kind: JsonErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl JsonLoadError {
    fn new(kind: JsonErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: 0,
            column: 0,
            message: message.into(),
        }
    }

    fn from_serde(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let kind = match err.classify() {
            Category::Eof => JsonErrorKind::Truncated,
            Category::Syntax => JsonErrorKind::Syntax,
            Category::Data => JsonErrorKind::Data,
            Category::Io => JsonErrorKind::Io,
        };
        Self {
            kind,
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Parse JSON text, tolerating a BOM and whitespace-only lines
///
/// Whitespace-only lines are emptied rather than removed so that reported
/// line numbers still match the original text.
pub fn parse_json_safely(text: &str) -> Result<Value, JsonLoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let cleaned: String = text
        .lines()
        .map(|line| if line.trim().is_empty() { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.trim().is_empty() {
        return Err(JsonLoadError::new(
            JsonErrorKind::Empty,
            "document contains no JSON value",
        ));
    }

    serde_json::from_str(&cleaned).map_err(|e| {
        let err = JsonLoadError::from_serde(e);
        error!(kind = %err.kind, line = err.line, column = err.column, "Unable to parse JSON: {}", err.message);
        err
    })
}

/// Read and parse a JSON file with [`parse_json_safely`]
pub fn load_json_file(path: &Path) -> Result<Value, JsonLoadError> {
    debug!("Loading JSON from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| {
        JsonLoadError::new(
            JsonErrorKind::Io,
            format!("failed to read {}: {}", path.display(), e),
        )
    })?;
    parse_json_safely(&contents)
}
