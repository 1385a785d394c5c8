//! Line-item records and parse results for supplier delivery documents.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LineIssue;

/// One trimmed, non-empty line of extracted document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// 0-based line position in the source text.
    pub number: usize,
    /// Trimmed line content.
    pub text: String,
}

impl RawLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Split raw document text into trimmed, non-empty lines.
    ///
    /// Line numbers refer to the original text, so blank lines leave gaps.
    pub fn split(text: &str) -> Vec<RawLine> {
        text.lines()
            .enumerate()
            .filter_map(|(number, line)| {
                let line = line.trim();
                (!line.is_empty()).then(|| RawLine::new(number, line))
            })
            .collect()
    }

    /// Build lines from already-split text, numbering them in order.
    pub fn from_lines<I, S>(lines: I) -> Vec<RawLine>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .enumerate()
            .filter_map(|(number, line)| {
                let line = line.as_ref().trim();
                (!line.is_empty()).then(|| RawLine::new(number, line))
            })
            .collect()
    }
}

/// A single product line extracted from a supplier document.
///
/// Every record satisfies [`ProductLineRecord::is_complete`]; partial matches
/// are rejected by the assembler instead of being filled with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLineRecord {
    /// Supplier style code or product barcode.
    pub style_or_barcode: String,

    /// Secondary supplier reference (e.g. the SKU next to a barcode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_code: Option<String>,

    /// Product name, possibly merged from several lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    /// Color name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Normalized size token.
    pub size: String,

    /// Ordered quantity.
    pub quantity: Decimal,

    /// Unit price.
    pub unit_price: Decimal,

    /// Line total (supplier value when present, else quantity * unit price).
    pub line_total: Decimal,

    /// Fabric/quality description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,

    /// Recommended retail price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<Decimal>,

    /// Source line number of the data row this record came from.
    pub line: usize,
}

impl ProductLineRecord {
    /// Check the record invariant shared by every emitted record.
    pub fn is_complete(&self) -> bool {
        !self.style_or_barcode.trim().is_empty()
            && !self.size.trim().is_empty()
            && self.quantity > Decimal::ZERO
            && self.unit_price >= Decimal::ZERO
            && self.line_total >= Decimal::ZERO
    }

    /// Flatten into a row for tabular export.
    pub fn to_row(&self) -> RecordRow {
        RecordRow {
            style_or_barcode: self.style_or_barcode.clone(),
            style_code: self.style_code.clone().unwrap_or_default(),
            product_name: self.product_name.clone().unwrap_or_default(),
            color: self.color.clone().unwrap_or_default(),
            size: self.size.clone(),
            quantity: self.quantity.normalize().to_string(),
            unit_price: format!("{:.2}", self.unit_price),
            line_total: format!("{:.2}", self.line_total),
        }
    }
}

/// Flat, string-only view of a record suitable for CSV writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    pub style_or_barcode: String,
    pub style_code: String,
    pub product_name: String,
    pub color: String,
    pub size: String,
    pub quantity: String,
    pub unit_price: String,
    pub line_total: String,
}

/// A line that did not produce a record, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedLine {
    /// The originating line.
    pub line: RawLine,
    /// Why it was rejected.
    pub issue: LineIssue,
}

/// Document header fields captured alongside the line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// Supplier invoice or delivery note number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Document date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,
}

impl DocumentHeader {
    pub fn is_empty(&self) -> bool {
        self.invoice_number.is_none() && self.invoice_date.is_none()
    }
}

/// Aggregates derived from the final record list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub record_count: usize,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

impl SessionTotals {
    /// Sum over a record list, or `None` if a sum overflows.
    pub fn from_records(records: &[ProductLineRecord]) -> Option<Self> {
        Self::default().with_records(records)
    }

    /// These totals extended by `records`, or `None` if a sum overflows.
    pub fn with_records(&self, records: &[ProductLineRecord]) -> Option<Self> {
        records.iter().try_fold(self.clone(), |totals, r| {
            Some(Self {
                record_count: totals.record_count + 1,
                total_quantity: totals.total_quantity.checked_add(r.quantity)?,
                total_value: totals.total_value.checked_add(r.line_total)?,
            })
        })
    }
}

/// Outcome of parsing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSessionResult {
    /// Identifier of the format used.
    pub format: String,

    /// Header fields found in the document.
    #[serde(default, skip_serializing_if = "DocumentHeader::is_empty")]
    pub header: DocumentHeader,

    /// Records in document order.
    pub records: Vec<ProductLineRecord>,

    /// Lines that could not be used, in document order.
    pub unmatched_lines: Vec<UnmatchedLine>,

    /// Heuristic fallbacks taken during the pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Number of lines classified as boilerplate.
    pub noise_lines: usize,

    /// Derived totals.
    pub totals: SessionTotals,
}

impl ParseSessionResult {
    /// Flatten all records for tabular export.
    pub fn rows(&self) -> Vec<RecordRow> {
        self.records.iter().map(ProductLineRecord::to_row).collect()
    }

    /// First `n` unmatched lines, formatted for display.
    pub fn unmatched_sample(&self, n: usize) -> Vec<String> {
        self.unmatched_lines
            .iter()
            .take(n)
            .map(|u| format!("line {}: {} ({})", u.line.number + 1, u.line.text, u.issue))
            .collect()
    }
}
