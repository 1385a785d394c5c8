//! Declarative supplier format specifications.
//!
//! A [`FormatSpec`] describes one supplier's textual layout: which lines are
//! boilerplate, how style/color/size markers look, and how the numeric
//! columns of a data row are laid out. Specs are plain data (loadable from
//! JSON) and are compiled once into a [`CompiledFormat`] that the engine
//! reads without mutation.

pub mod amounts;
mod builtin;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FormatError;

pub use builtin::{builtin, builtin_ids, builtin_specs};

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;

/// How a supplier writes decimal numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalConvention {
    /// `1.234,56`
    Comma,
    /// `1,234.56`
    Period,
    /// Whichever separator comes last is the decimal point.
    #[default]
    Auto,
}

impl std::str::FromStr for DecimalConvention {
    type Err = FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comma" | "," => Ok(Self::Comma),
            "period" | "dot" | "." => Ok(Self::Period),
            "auto" => Ok(Self::Auto),
            _ => Err(FormatError::Convention(s.to_string())),
        }
    }
}

/// Meaning of one trailing numeric column in a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Ordered quantity (row total when sizes are laid out as columns).
    Quantity,
    /// Price per unit.
    UnitPrice,
    /// Total value of the row.
    LineTotal,
    /// Value before discount.
    Subtotal,
    /// Discount percentage or amount.
    Discount,
    /// Number of assortments ordered.
    AssortmentCount,
    /// Running total carried across rows.
    AccumulatedTotal,
    /// Column present but not used.
    Skip,
}

/// One trailing column of a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub role: ColumnRole,
    /// Optional columns may be missing; they must come last.
    #[serde(default)]
    pub optional: bool,
}

impl ColumnSpec {
    pub fn required(role: ColumnRole) -> Self {
        Self { role, optional: false }
    }

    pub fn optional(role: ColumnRole) -> Self {
        Self { role, optional: true }
    }
}

/// What to do when size columns and size headers disagree in count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Pair what lines up, ignore the rest, and record a warning.
    #[default]
    BestEffort,
    /// Reject the row.
    Drop,
}

/// Where multi-line product names sit relative to the style marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentPlacement {
    /// Name lines follow the style marker and end at the data row.
    #[default]
    Trailing,
    /// Name lines precede the style marker they belong to.
    Leading,
}

/// Layout of numeric data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRowSpec {
    /// Required row prefix, stripped before tokenizing. May capture `size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Minimum numeric tokens for a line to count as a data row.
    pub min_numbers: usize,

    /// Leading numbers are per-size quantities matching the size headers.
    #[serde(default)]
    pub size_columns: bool,

    /// Trailing summary columns, left to right.
    pub columns: Vec<ColumnSpec>,

    /// Column-count mismatch handling for size layouts.
    #[serde(default)]
    pub mismatch: MismatchPolicy,
}

impl DataRowSpec {
    /// Number of columns that are always present.
    pub fn required_columns(&self) -> usize {
        self.columns.iter().filter(|c| !c.optional).count()
    }
}

/// Keyword lines that enrich the current style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    /// Style name, optionally with a declared style total.
    Name,
    /// Fabric or quality.
    Quality,
    /// Recommended retail price.
    RetailPrice,
}

/// Pattern for a [`DetailField`]. Captures `value` and optionally `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPattern {
    pub field: DetailField,
    pub pattern: String,
}

/// Patterns for document header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderPatterns {
    /// Captures `number`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Captures `date`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,

    /// chrono formats tried in order on the captured date.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub date_formats: Vec<String>,
}

/// Declarative description of one supplier's document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Short identifier used on the command line.
    pub id: String,

    /// Human-readable supplier name.
    pub name: String,

    /// Decimal separator convention.
    #[serde(default)]
    pub decimal: DecimalConvention,

    /// Boilerplate lines; these win over every other rule.
    #[serde(default)]
    pub noise: Vec<String>,

    /// Style or barcode marker. Captures `code`, optionally `name` and `price`.
    pub style: String,

    /// Single size declaration. Captures `size`, optionally `reference`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_marker: Option<String>,

    /// Size column layout. Captures `sizes` (whitespace separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_header: Option<String>,

    /// Color marker. Captures `color`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Detail markers.
    #[serde(default)]
    pub details: Vec<DetailPattern>,

    /// Data-row layout.
    pub data_row: DataRowSpec,

    /// Supplier size tokens mapped to normalized sizes.
    #[serde(default)]
    pub size_vocabulary: BTreeMap<String, String>,

    /// Maximum pending name fragments; 0 disables multi-line names.
    #[serde(default)]
    pub max_fragments: usize,

    /// Where name fragments sit relative to the style marker.
    #[serde(default)]
    pub fragment_placement: FragmentPlacement,

    /// Document header patterns.
    #[serde(default)]
    pub header: HeaderPatterns,
}

impl FormatSpec {
    /// Parse a spec from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a spec from a JSON file.
    pub fn from_file(path: &Path) -> std::result::Result<Self, crate::PackslipError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Serialize the spec as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compile every pattern once and validate the layout.
    pub fn compile(&self) -> Result<CompiledFormat> {
        CompiledFormat::new(self.clone())
    }
}

/// A [`FormatSpec`] with all patterns compiled. Immutable and shareable.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    spec: FormatSpec,
    pub(crate) noise: Vec<Regex>,
    pub(crate) style: Regex,
    pub(crate) size_marker: Option<Regex>,
    pub(crate) size_header: Option<Regex>,
    pub(crate) color: Option<Regex>,
    pub(crate) details: Vec<(DetailField, Regex)>,
    pub(crate) row_prefix: Option<Regex>,
    pub(crate) invoice_number: Option<Regex>,
    pub(crate) invoice_date: Option<Regex>,
    vocabulary: HashMap<String, String>,
}

impl CompiledFormat {
    fn new(spec: FormatSpec) -> Result<Self> {
        validate_layout(&spec.data_row)?;

        let noise = spec
            .noise
            .iter()
            .enumerate()
            .map(|(i, p)| compile(&format!("noise[{}]", i), p, &[]))
            .collect::<Result<Vec<_>>>()?;

        let style = compile("style", &spec.style, &["code"])?;
        let size_marker = compile_opt("size_marker", &spec.size_marker, &["size"])?;
        let size_header = compile_opt("size_header", &spec.size_header, &["sizes"])?;
        let color = compile_opt("color", &spec.color, &["color"])?;

        let details = spec
            .details
            .iter()
            .map(|d| {
                compile(&format!("details.{:?}", d.field), &d.pattern, &["value"])
                    .map(|re| (d.field, re))
            })
            .collect::<Result<Vec<_>>>()?;

        let row_prefix = compile_opt("data_row.prefix", &spec.data_row.prefix, &[])?;
        let invoice_number =
            compile_opt("header.invoice_number", &spec.header.invoice_number, &["number"])?;
        let invoice_date =
            compile_opt("header.invoice_date", &spec.header.invoice_date, &["date"])?;

        let vocabulary = spec
            .size_vocabulary
            .iter()
            .map(|(from, to)| (vocabulary_key(from), to.clone()))
            .collect();

        debug!(
            "Compiled format {} ({} noise patterns, {} detail patterns)",
            spec.id,
            noise.len(),
            details.len()
        );

        Ok(Self {
            spec,
            noise,
            style,
            size_marker,
            size_header,
            color,
            details,
            row_prefix,
            invoice_number,
            invoice_date,
            vocabulary,
        })
    }

    /// The source spec.
    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    /// Format identifier.
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// Decimal convention.
    pub fn decimal(&self) -> DecimalConvention {
        self.spec.decimal
    }

    /// Data-row layout.
    pub fn data_row(&self) -> &DataRowSpec {
        &self.spec.data_row
    }

    /// Check a line against the noise allow-list.
    pub fn is_noise(&self, line: &str) -> bool {
        self.noise.iter().any(|re| re.is_match(line))
    }

    /// Map a supplier size token through the vocabulary; unknown tokens pass through.
    pub fn normalize_size(&self, token: &str) -> String {
        let token = token.trim();
        self.vocabulary
            .get(&vocabulary_key(token))
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }
}

fn vocabulary_key(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn compile(field: &str, pattern: &str, groups: &[&str]) -> Result<Regex> {
    let re = Regex::new(pattern).map_err(|source| FormatError::Pattern {
        field: field.to_string(),
        source,
    })?;

    for group in groups {
        if !re.capture_names().flatten().any(|name| name == *group) {
            return Err(FormatError::MissingGroup {
                field: field.to_string(),
                group: group.to_string(),
            });
        }
    }

    Ok(re)
}

fn compile_opt(field: &str, pattern: &Option<String>, groups: &[&str]) -> Result<Option<Regex>> {
    pattern
        .as_deref()
        .map(|p| compile(field, p, groups))
        .transpose()
}

fn validate_layout(layout: &DataRowSpec) -> Result<()> {
    if layout.columns.is_empty() {
        return Err(FormatError::Layout("no columns declared".to_string()));
    }

    if let Some(pos) = layout.columns.iter().position(|c| c.optional) {
        if layout.columns[pos..].iter().any(|c| !c.optional) {
            return Err(FormatError::Layout(
                "optional columns must come last".to_string(),
            ));
        }
    }

    if !layout.size_columns && layout.min_numbers < layout.required_columns() {
        return Err(FormatError::Layout(format!(
            "min_numbers ({}) is below the {} required columns",
            layout.min_numbers,
            layout.required_columns()
        )));
    }

    let has = |role| layout.columns.iter().any(|c| c.role == role);
    if !layout.size_columns && !has(ColumnRole::Quantity) {
        return Err(FormatError::Layout(
            "rows without size columns need a quantity column".to_string(),
        ));
    }

    Ok(())
}

/// Resolve a format by id: configured directory first, then built-ins.
pub fn lookup(
    id: &str,
    format_dir: Option<&Path>,
) -> std::result::Result<FormatSpec, crate::PackslipError> {
    if let Some(dir) = format_dir {
        let path = dir.join(format!("{}.json", id));
        if path.exists() {
            debug!("Loading format {} from {}", id, path.display());
            return FormatSpec::from_file(&path);
        }
    }

    builtin(id)
        .cloned()
        .ok_or_else(|| FormatError::Unknown(id.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> FormatSpec {
        FormatSpec {
            id: "test".to_string(),
            name: "Test".to_string(),
            decimal: DecimalConvention::Comma,
            noise: vec![r"(?i)^page \d+".to_string()],
            style: r"^Style (?P<code>\w+)$".to_string(),
            size_marker: None,
            size_header: None,
            color: None,
            details: Vec::new(),
            data_row: DataRowSpec {
                prefix: None,
                min_numbers: 2,
                size_columns: false,
                columns: vec![
                    ColumnSpec::required(ColumnRole::Quantity),
                    ColumnSpec::required(ColumnRole::UnitPrice),
                ],
                mismatch: MismatchPolicy::default(),
            },
            size_vocabulary: BTreeMap::from([("2 jaar".to_string(), "2Y".to_string())]),
            max_fragments: 0,
            fragment_placement: FragmentPlacement::default(),
            header: HeaderPatterns::default(),
        }
    }

    #[test]
    fn test_decimal_convention_names() {
        assert_eq!("comma".parse::<DecimalConvention>().unwrap(), DecimalConvention::Comma);
        assert_eq!(" Period ".parse::<DecimalConvention>().unwrap(), DecimalConvention::Period);
        assert_eq!(".".parse::<DecimalConvention>().unwrap(), DecimalConvention::Period);
        assert_eq!("auto".parse::<DecimalConvention>().unwrap(), DecimalConvention::Auto);
        assert!(matches!(
            "roman".parse::<DecimalConvention>(),
            Err(FormatError::Convention(_))
        ));
    }

    #[test]
    fn test_compile_minimal() {
        let format = minimal().compile().unwrap();
        assert_eq!(format.id(), "test");
        assert!(format.is_noise("Page 3"));
        assert!(!format.is_noise("Style ABC"));
    }

    #[test]
    fn test_missing_group_rejected() {
        let mut spec = minimal();
        spec.style = r"^Style (\w+)$".to_string();

        let err = spec.compile().unwrap_err();
        assert!(matches!(err, FormatError::MissingGroup { ref group, .. } if group == "code"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let mut spec = minimal();
        spec.noise.push("(unclosed".to_string());

        assert!(matches!(spec.compile(), Err(FormatError::Pattern { .. })));
    }

    #[test]
    fn test_optional_columns_must_trail() {
        let mut spec = minimal();
        spec.data_row.columns = vec![
            ColumnSpec::optional(ColumnRole::Skip),
            ColumnSpec::required(ColumnRole::Quantity),
        ];

        assert!(matches!(spec.compile(), Err(FormatError::Layout(_))));
    }

    #[test]
    fn test_size_vocabulary() {
        let format = minimal().compile().unwrap();
        assert_eq!(format.normalize_size("2  JAAR"), "2Y");
        assert_eq!(format.normalize_size("XL"), "XL");
    }

    #[test]
    fn test_json_round_trip_keeps_defaults() {
        let json = r#"{
            "id": "mini",
            "name": "Mini",
            "style": "^(?P<code>\\d{13})$",
            "data_row": {
                "min_numbers": 2,
                "columns": [{"role": "quantity"}, {"role": "unit_price"}]
            }
        }"#;

        let spec = FormatSpec::from_json(json).unwrap();
        assert_eq!(spec.decimal, DecimalConvention::Auto);
        assert_eq!(spec.max_fragments, 0);
        assert_eq!(spec.data_row.mismatch, MismatchPolicy::BestEffort);
        assert!(spec.compile().is_ok());
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("no-such-supplier", None).is_err());
        assert!(lookup("floss", None).is_ok());
    }
}
