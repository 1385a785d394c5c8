//! Error types for the packslip-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the packslip library.
#[derive(Error, Debug)]
pub enum PackslipError {
    /// Document-level parse failure.
    #[error("parse error: {0}")]
    Session(#[from] SessionError),

    /// Supplier format could not be loaded or compiled.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading or compiling a [`FormatSpec`](crate::format::FormatSpec).
#[derive(Error, Debug)]
pub enum FormatError {
    /// A pattern in the spec is not a valid regular expression.
    #[error("invalid pattern for {field}: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// A pattern compiles but lacks a capture group the engine reads.
    #[error("pattern for {field} must define the named group `{group}`")]
    MissingGroup { field: String, group: String },

    /// The data-row layout cannot be interpreted.
    #[error("invalid data-row layout: {0}")]
    Layout(String),

    /// Decimal convention name not recognized.
    #[error("unknown decimal convention: {0}")]
    Convention(String),

    /// No built-in or configured format has this identifier.
    #[error("unknown format: {0}")]
    Unknown(String),

    /// The spec file is not valid JSON for a format spec.
    #[error("invalid format spec: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal, caller-visible parse failures.
///
/// Per-line problems never surface here; they end up in
/// [`ParseSessionResult::unmatched_lines`](crate::models::record::ParseSessionResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The document has no non-empty lines.
    #[error("document is empty")]
    EmptyDocument,

    /// A full pass produced no records at all.
    #[error("no line items recognized with format `{format}` ({line_count} lines scanned)")]
    NoRecognizedFormat {
        format: String,
        line_count: usize,
        /// First unmatched or noise lines, for a human to diagnose format drift.
        sample: Vec<String>,
    },
}

/// Soft, per-line reasons a line did not become a record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LineIssue {
    /// No classifier rule matched strongly enough.
    #[error("unrecognized line")]
    Unrecognized,

    /// Required fields were missing once context was applied.
    #[error("incomplete record: {0}")]
    IncompleteRecord(String),

    /// A token shaped like a number did not parse as one.
    #[error("malformed numeric token `{0}`")]
    MalformedNumeric(String),

    /// Size columns and declared size headers disagree.
    #[error("expected {expected} size columns, found {found}")]
    ColumnMismatch { expected: usize, found: usize },

    /// Header fragment dropped by the window bound or a style boundary.
    #[error("discarded name fragment")]
    DiscardedFragment,
}

/// Result type for the packslip library.
pub type Result<T> = std::result::Result<T, PackslipError>;
