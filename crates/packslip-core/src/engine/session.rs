//! Parse session: drives the pipeline over a whole document.

use chrono::NaiveDate;
use tracing::{debug, info, trace, warn};

use crate::error::{LineIssue, SessionError};
use crate::format::CompiledFormat;
use crate::models::config::SessionConfig;
use crate::models::record::{
    DocumentHeader, ParseSessionResult, ProductLineRecord, RawLine, SessionTotals, UnmatchedLine,
};

use super::accumulator::{Accumulator, Fold, ParseContext};
use super::assembler::assemble;
use super::classifier::{classify, LineTag};
use super::extractor::{extract, Fields, RowFields};

/// Single-pass state over one document.
///
/// A session is created per document and consumed by [`ParseSession::finish`],
/// so context never leaks between documents.
pub struct ParseSession<'f> {
    format: &'f CompiledFormat,
    accumulator: Accumulator,
    context: ParseContext,
    header: DocumentHeader,
    records: Vec<ProductLineRecord>,
    /// Running totals over `records`.
    totals: SessionTotals,
    unmatched: Vec<UnmatchedLine>,
    warnings: Vec<String>,
    noise: Vec<RawLine>,
    noise_lines: usize,
    line_count: usize,
    /// Index of the first record of the active style.
    style_start: usize,
}

impl<'f> ParseSession<'f> {
    pub fn new(format: &'f CompiledFormat) -> Self {
        Self {
            format,
            accumulator: Accumulator::new(format),
            context: ParseContext::new(),
            header: DocumentHeader::default(),
            records: Vec::new(),
            totals: SessionTotals::default(),
            unmatched: Vec::new(),
            warnings: Vec::new(),
            noise: Vec::new(),
            noise_lines: 0,
            line_count: 0,
            style_start: 0,
        }
    }

    /// Feed the next line in document order. Blank lines are ignored.
    pub fn feed(&mut self, line: &RawLine) {
        let text = line.text.trim();
        if text.is_empty() {
            return;
        }
        self.line_count += 1;

        self.capture_header(text);

        let tag = classify(text, self.format);
        trace!("Line {}: {}", line.number + 1, tag.kind());

        if tag == LineTag::Noise {
            self.noise_lines += 1;
            self.noise.push(line.clone());
            return;
        }

        let fields = match extract(&tag, &self.context, self.format) {
            Ok(fields) => fields,
            Err(issue) => {
                self.reject(line, issue);
                return;
            }
        };

        if matches!(fields, Fields::Style(_)) {
            self.reconcile_style();
        }

        match self.accumulator.fold(&fields, line, &mut self.context) {
            Fold::Discarded(lines) => {
                for discarded in lines {
                    self.reject(&discarded, LineIssue::DiscardedFragment);
                }
            }
            Fold::Unrecognized(unused) => self.reject(&unused, LineIssue::Unrecognized),
            Fold::Flushed(name) => {
                trace!("Line {}: merged name fragments \"{}\"", line.number + 1, name)
            }
            Fold::Applied | Fold::Pending => {}
        }

        if let Fields::Rows(rows) = fields {
            self.emit(line, rows);
        }
    }

    /// Assemble every record of a data row, keeping the row only if all of
    /// them are valid and the document totals still fit.
    fn emit(&mut self, line: &RawLine, rows: RowFields) {
        if let Some(warning) = rows.warning {
            warn!("Line {}: {}", line.number + 1, warning);
            self.warnings.push(format!("line {}: {}", line.number + 1, warning));
        }

        let assembled = rows
            .partials
            .iter()
            .map(|partial| assemble(partial, &self.context, line.number))
            .collect::<Result<Vec<_>, _>>();
        let records = match assembled {
            Ok(records) => records,
            Err(issue) => return self.reject(line, issue),
        };

        let Some(totals) = self.totals.with_records(&records) else {
            return self.reject(
                line,
                LineIssue::IncompleteRecord("amounts overflow the document totals".to_string()),
            );
        };

        if let (Some(declared), Some(row)) =
            (rows.declared_total, SessionTotals::from_records(&records))
        {
            if row.total_value != declared {
                debug!(
                    "Line {}: row total {} but records sum to {}",
                    line.number + 1,
                    declared,
                    row.total_value
                );
            }
        }

        self.totals = totals;
        self.records.extend(records);
    }

    fn reject(&mut self, line: &RawLine, issue: LineIssue) {
        debug!("Line {} unmatched: {}", line.number + 1, issue);
        self.unmatched.push(UnmatchedLine {
            line: line.clone(),
            issue,
        });
    }

    /// Compare the supplier style total with the records emitted for it.
    fn reconcile_style(&mut self) {
        let records = &self.records[self.style_start..];
        if let (Some(declared), Some(style)) =
            (self.context.declared_total, SessionTotals::from_records(records))
        {
            if style.record_count > 0 && style.total_value != declared {
                debug!(
                    "Style {}: declared total {} but records sum to {}",
                    self.context.current_style_code.as_deref().unwrap_or("?"),
                    declared,
                    style.total_value
                );
            }
        }
        self.style_start = self.records.len();
    }

    fn capture_header(&mut self, text: &str) {
        if self.header.invoice_number.is_none() {
            if let Some(number) = self
                .format
                .invoice_number
                .as_ref()
                .and_then(|re| re.captures(text))
                .and_then(|caps| caps.name("number"))
            {
                self.header.invoice_number = Some(number.as_str().trim().to_string());
            }
        }

        if self.header.invoice_date.is_none() {
            if let Some(date) = self
                .format
                .invoice_date
                .as_ref()
                .and_then(|re| re.captures(text))
                .and_then(|caps| caps.name("date"))
            {
                self.header.invoice_date =
                    parse_date(date.as_str(), &self.format.spec().header.date_formats);
            }
        }
    }

    /// Close the session and build the result.
    pub fn finish(mut self, config: &SessionConfig) -> Result<ParseSessionResult, SessionError> {
        self.reconcile_style();

        for pending in std::mem::take(&mut self.context.pending_name_fragments) {
            self.reject(&pending, LineIssue::DiscardedFragment);
        }
        self.unmatched.sort_by_key(|u| u.line.number);

        if self.line_count == 0 {
            return Err(SessionError::EmptyDocument);
        }

        if self.records.is_empty() && self.line_count >= config.min_lines_for_format_check {
            return Err(SessionError::NoRecognizedFormat {
                format: self.format.id().to_string(),
                line_count: self.line_count,
                sample: self.diagnostic_sample(config.diagnostic_sample),
            });
        }

        Ok(ParseSessionResult {
            format: self.format.id().to_string(),
            header: self.header,
            records: self.records,
            unmatched_lines: self.unmatched,
            warnings: self.warnings,
            noise_lines: self.noise_lines,
            totals: self.totals,
        })
    }

    /// First lines that were either unmatched or noise, in document order.
    fn diagnostic_sample(&self, n: usize) -> Vec<String> {
        let mut lines: Vec<&RawLine> = self
            .unmatched
            .iter()
            .map(|u| &u.line)
            .chain(self.noise.iter())
            .collect();
        lines.sort_by_key(|l| l.number);
        lines.dedup_by_key(|l| l.number);
        lines
            .into_iter()
            .take(n)
            .map(|l| format!("line {}: {}", l.number + 1, l.text))
            .collect()
    }
}

fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value.trim(), f).ok())
}

/// Parse a document's lines with one format.
pub fn parse(
    lines: &[RawLine],
    format: &CompiledFormat,
    config: &SessionConfig,
) -> Result<ParseSessionResult, SessionError> {
    info!("Parsing {} lines with format {}", lines.len(), format.id());

    let mut session = ParseSession::new(format);
    for line in lines {
        session.feed(line);
    }
    let result = session.finish(config);

    match &result {
        Ok(r) => info!(
            "Extracted {} records ({} unmatched, {} noise)",
            r.records.len(),
            r.unmatched_lines.len(),
            r.noise_lines
        ),
        Err(e) => warn!("Parse failed: {}", e),
    }

    result
}

/// Split raw text into lines and parse it.
pub fn parse_text(
    text: &str,
    format: &CompiledFormat,
    config: &SessionConfig,
) -> Result<ParseSessionResult, SessionError> {
    parse(&RawLine::split(text), format, config)
}
