//! Line-item extraction engine.
//!
//! The pipeline for one document is classify, extract, fold into the
//! [`ParseContext`], then assemble records. [`ParseSession`] drives it.

pub mod accumulator;
pub mod assembler;
pub mod classifier;
pub mod extractor;
mod session;

pub use accumulator::{Accumulator, Fold, ParseContext};
pub use assembler::assemble;
pub use classifier::{classify, LineTag};
pub use extractor::{extract, Fields, PartialRecord, RowFields, StyleFields};
pub use session::{parse, parse_text, ParseSession};

use std::path::Path;

use crate::error::SessionError;
use crate::format::{self, CompiledFormat, FormatSpec};
use crate::models::config::{PackslipConfig, SessionConfig};
use crate::models::record::{ParseSessionResult, RawLine};

/// Result type for parse operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Trait for document parsers.
pub trait DocumentParser {
    /// Parse already-split document lines.
    fn parse_lines(&self, lines: &[RawLine]) -> Result<ParseSessionResult>;

    /// Parse raw document text.
    fn parse_text(&self, text: &str) -> Result<ParseSessionResult> {
        self.parse_lines(&RawLine::split(text))
    }
}

/// Parser bound to one compiled supplier format.
///
/// The format is compiled once and reused for every document; each call
/// runs its own [`ParseSession`].
#[derive(Debug, Clone)]
pub struct LineItemParser {
    format: CompiledFormat,
    session: SessionConfig,
}

impl LineItemParser {
    /// Create a parser with default session settings.
    pub fn new(format: CompiledFormat) -> Self {
        Self {
            format,
            session: SessionConfig::default(),
        }
    }

    /// Compile a spec and wrap it.
    pub fn from_spec(spec: &FormatSpec) -> crate::Result<Self> {
        Ok(Self::new(spec.compile()?))
    }

    /// Resolve a format by id (format directory first, then built-ins).
    pub fn for_format(id: &str, format_dir: Option<&Path>) -> crate::Result<Self> {
        Self::from_spec(&format::lookup(id, format_dir)?)
    }

    /// Resolve a format using the directory and session settings of a config.
    pub fn from_config(id: &str, config: &PackslipConfig) -> crate::Result<Self> {
        Ok(Self::for_format(id, config.formats.format_dir.as_deref())?
            .with_session_config(config.session.clone()))
    }

    /// Replace the session settings.
    pub fn with_session_config(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the line count from which an empty result is an error.
    pub fn with_min_lines_for_format_check(mut self, lines: usize) -> Self {
        self.session.min_lines_for_format_check = lines;
        self
    }

    /// Set how many lines are quoted when no format matches.
    pub fn with_diagnostic_sample(mut self, lines: usize) -> Self {
        self.session.diagnostic_sample = lines;
        self
    }

    /// The compiled format.
    pub fn format(&self) -> &CompiledFormat {
        &self.format
    }
}

impl DocumentParser for LineItemParser {
    fn parse_lines(&self, lines: &[RawLine]) -> Result<ParseSessionResult> {
        parse(lines, &self.format, &self.session)
    }
}

