//! Field extraction from classified lines.
//!
//! Turns a [`LineTag`] into typed values. Numbers are parsed with the
//! format's decimal convention, size tokens are normalized, and the
//! numeric columns of a data row are mapped to their roles.

use rust_decimal::Decimal;

use crate::error::LineIssue;
use crate::format::amounts::parse_amount;
use crate::format::{
    ColumnRole, ColumnSpec, CompiledFormat, DataRowSpec, DetailField, MismatchPolicy,
};

use super::accumulator::ParseContext;
use super::classifier::LineTag;

/// Typed fields of one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Fields {
    /// Boilerplate, nothing to apply.
    Nothing,
    Fragment(String),
    Style(StyleFields),
    Color(String),
    Sizes {
        sizes: Vec<String>,
        reference: Option<String>,
        layout: bool,
    },
    Detail {
        field: DetailField,
        value: String,
        amount: Option<Decimal>,
    },
    Rows(RowFields),
}

/// Values carried by a style marker.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleFields {
    pub code: String,
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// One would-be record from a data row, before context is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub size: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
}

/// Everything a data row yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFields {
    /// One entry per size with a positive quantity (or exactly one entry).
    pub partials: Vec<PartialRecord>,
    /// Row-level quantity printed by the supplier, if any.
    pub declared_quantity: Option<Decimal>,
    /// Row-level total printed by the supplier, if any.
    pub declared_total: Option<Decimal>,
    /// Set when a heuristic fallback was taken.
    pub warning: Option<String>,
}

/// Extract typed fields from a classified line.
pub fn extract(
    tag: &LineTag<'_>,
    ctx: &ParseContext,
    format: &CompiledFormat,
) -> Result<Fields, LineIssue> {
    let convention = format.decimal();
    let amount = |token: &str| {
        parse_amount(token, convention)
            .ok_or_else(|| LineIssue::MalformedNumeric(token.to_string()))
    };

    match tag {
        LineTag::Noise => Ok(Fields::Nothing),

        LineTag::HeaderFragment(text) => Ok(Fields::Fragment(text.to_string())),

        LineTag::StyleMarker { code, name, price } => Ok(Fields::Style(StyleFields {
            code: code.trim().to_string(),
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            unit_price: price.map(amount).transpose()?,
        })),

        LineTag::ColorMarker { color } => Ok(Fields::Color(color.to_string())),

        LineTag::SizeMarker {
            sizes,
            reference,
            layout,
        } => Ok(Fields::Sizes {
            sizes: sizes.iter().map(|s| format.normalize_size(s)).collect(),
            reference: reference.map(str::to_string),
            layout: *layout,
        }),

        LineTag::DetailMarker {
            field,
            value,
            amount: raw,
        } => Ok(Fields::Detail {
            field: *field,
            value: value.to_string(),
            amount: raw.map(amount).transpose()?,
        }),

        LineTag::DataRow { tokens, size } => {
            let numbers = tokens
                .iter()
                .map(|t| amount(t))
                .collect::<Result<Vec<_>, _>>()?;

            let layout = format.data_row();
            let rows = if layout.size_columns {
                size_column_row(&numbers, &ctx.size_headers, layout)?
            } else {
                single_row(&numbers, size.map(|s| format.normalize_size(s)), layout)?
            };
            Ok(Fields::Rows(rows))
        }
    }
}

/// Role-mapped summary values at the end of a row.
#[derive(Debug, Default)]
struct Summary {
    quantity: Option<Decimal>,
    unit_price: Option<Decimal>,
    line_total: Option<Decimal>,
}

fn summarize(columns: &[ColumnSpec], values: &[Decimal]) -> Summary {
    let mut summary = Summary::default();
    for (column, value) in columns.iter().zip(values) {
        match column.role {
            ColumnRole::Quantity => summary.quantity = Some(*value),
            ColumnRole::UnitPrice => summary.unit_price = Some(*value),
            ColumnRole::LineTotal => summary.line_total = Some(*value),
            _ => {}
        }
    }
    summary
}

/// Row with one quantity column per declared size followed by summary columns.
fn size_column_row(
    numbers: &[Decimal],
    headers: &[String],
    layout: &DataRowSpec,
) -> Result<RowFields, LineIssue> {
    if headers.is_empty() {
        return Err(LineIssue::IncompleteRecord(
            "size columns found before any size header".to_string(),
        ));
    }

    let n = numbers.len();
    let h = headers.len();
    let full = layout.columns.len();
    let required = layout.required_columns();

    // Extra size columns keep every summary column; missing ones drop the optional tail.
    let trailing = if n >= h + full {
        full
    } else if n > required {
        required
    } else {
        return Err(LineIssue::ColumnMismatch {
            expected: h,
            found: 0,
        });
    };

    let leading = &numbers[..n - trailing];
    let mut warning = None;
    if leading.len() != h {
        if layout.mismatch == MismatchPolicy::Drop {
            return Err(LineIssue::ColumnMismatch {
                expected: h,
                found: leading.len(),
            });
        }
        warning = Some(format!(
            "{} size columns for {} size headers, paired the first {}",
            leading.len(),
            h,
            leading.len().min(h)
        ));
    }

    let summary = summarize(&layout.columns[..trailing], &numbers[n - trailing..]);

    // A printed quantity that disagrees with the size columns usually means
    // an extra size column was taken for a summary column.
    if warning.is_none() {
        if let Some(declared) = summary.quantity {
            let paired = leading
                .iter()
                .try_fold(Decimal::ZERO, |sum, q| sum.checked_add(*q));
            warning = match paired {
                Some(sum) if sum == declared => None,
                Some(sum) => Some(format!(
                    "size columns sum to {} but the row quantity is {}",
                    sum, declared
                )),
                None => Some(format!("size columns overflow the row quantity {}", declared)),
            };
        }
    }

    let partials: Vec<PartialRecord> = headers
        .iter()
        .zip(leading)
        .filter(|(_, quantity)| **quantity > Decimal::ZERO)
        .map(|(size, quantity)| PartialRecord {
            size: Some(size.clone()),
            quantity: Some(*quantity),
            unit_price: summary.unit_price,
            line_total: None,
        })
        .collect();

    if partials.is_empty() {
        return Err(LineIssue::IncompleteRecord(
            "no size has a positive quantity".to_string(),
        ));
    }

    Ok(RowFields {
        partials,
        declared_quantity: summary.quantity,
        declared_total: summary.line_total,
        warning,
    })
}

/// Row describing a single record; the last columns map to the declared roles.
fn single_row(
    numbers: &[Decimal],
    size: Option<String>,
    layout: &DataRowSpec,
) -> Result<RowFields, LineIssue> {
    let n = numbers.len();
    let full = layout.columns.len();
    let required = layout.required_columns();

    let take = if n >= full {
        full
    } else if n >= required {
        required
    } else {
        return Err(LineIssue::IncompleteRecord(format!(
            "expected at least {} numbers, found {}",
            required, n
        )));
    };

    let warning = (n > take).then(|| format!("ignored {} leading numbers", n - take));
    let summary = summarize(&layout.columns[..take], &numbers[n - take..]);

    Ok(RowFields {
        partials: vec![PartialRecord {
            size,
            quantity: summary.quantity,
            unit_price: summary.unit_price,
            line_total: summary.line_total,
        }],
        declared_quantity: summary.quantity,
        declared_total: summary.line_total,
        warning,
    })
}
