//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PackslipError;

/// Main configuration for packslip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackslipConfig {
    /// Parse session configuration.
    pub session: SessionConfig,

    /// Output configuration.
    pub output: OutputConfig,

    /// Supplier format configuration.
    pub formats: FormatsConfig,
}

/// Parse session thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum number of lines before an empty result is reported as
    /// an unrecognized format rather than an empty success.
    pub min_lines_for_format_check: usize,

    /// Number of unmatched lines carried in fatal diagnostics.
    pub diagnostic_sample: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_lines_for_format_check: 1,
            diagnostic_sample: 5,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format name (json, csv, text).
    pub format: String,

    /// Include unmatched lines in JSON output.
    pub include_unmatched: bool,

    /// Pretty-print JSON.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            include_unmatched: true,
            pretty: false,
        }
    }
}

/// Supplier format selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsConfig {
    /// Format used when none is given on the command line.
    pub default_format: Option<String>,

    /// Directory with additional `<id>.json` format specs.
    pub format_dir: Option<PathBuf>,
}

impl PackslipConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PackslipError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PackslipError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of a user-supplied format spec, if a format directory is configured.
    pub fn format_path(&self, format_id: &str) -> Option<PathBuf> {
        self.formats
            .format_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", format_id)))
    }
}
