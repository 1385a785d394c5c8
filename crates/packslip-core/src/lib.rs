//! Core library for supplier delivery documents.
//!
//! This crate provides:
//! - Table-driven supplier formats ([`FormatSpec`]), loadable from JSON
//! - Locale-aware amount parsing
//! - A single-pass line-item engine turning extracted document text into
//!   [`ProductLineRecord`]s, with every unused line accounted for

pub mod engine;
pub mod error;
pub mod format;
pub mod models;

pub use engine::{DocumentParser, LineItemParser, ParseSession};
pub use error::{FormatError, LineIssue, PackslipError, Result, SessionError};
pub use format::{builtin, builtin_ids, CompiledFormat, DecimalConvention, FormatSpec};
pub use models::config::{FormatsConfig, OutputConfig, PackslipConfig, SessionConfig};
pub use models::record::{
    DocumentHeader, ParseSessionResult, ProductLineRecord, RawLine, RecordRow, SessionTotals,
    UnmatchedLine,
};
