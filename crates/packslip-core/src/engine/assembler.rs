//! Record assembly: partial row values plus context into a complete record.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::LineIssue;
use crate::models::record::ProductLineRecord;

use super::accumulator::ParseContext;
use super::extractor::PartialRecord;

/// Combine a partial record with the active context.
///
/// Missing required fields reject the record; nothing is defaulted. The
/// unit price falls back to the style price, then to `line_total / quantity`.
/// A supplier line total is kept as printed even when it differs from
/// `quantity * unit_price` (discounts, rounding). Amounts whose product or
/// quotient does not fit a [`Decimal`] reject the record.
pub fn assemble(
    partial: &PartialRecord,
    ctx: &ParseContext,
    line: usize,
) -> Result<ProductLineRecord, LineIssue> {
    let incomplete = |reason: &str| LineIssue::IncompleteRecord(reason.to_string());

    let style = ctx
        .current_style_code
        .clone()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| incomplete("no active style"))?;

    let size = partial
        .size
        .clone()
        .or_else(|| ctx.current_size.clone())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| incomplete("no size for row"))?;

    let quantity = partial
        .quantity
        .filter(|q| *q > Decimal::ZERO)
        .ok_or_else(|| incomplete("quantity is missing or not positive"))?;

    let unit_price = match partial.unit_price.or(ctx.current_unit_price) {
        Some(price) => price,
        None => partial
            .line_total
            .ok_or_else(|| incomplete("no unit price"))?
            .checked_div(quantity)
            .ok_or_else(|| incomplete("unit price out of range"))?
            .round_dp(2),
    };

    if unit_price < Decimal::ZERO {
        return Err(incomplete("negative unit price"));
    }

    let computed = quantity.checked_mul(unit_price);
    let line_total = match partial.line_total {
        Some(total) => {
            if computed != Some(total) {
                debug!(
                    "Line {}: supplier total {} differs from {} x {}",
                    line + 1,
                    total,
                    quantity,
                    unit_price
                );
            }
            total
        }
        None => computed.ok_or_else(|| incomplete("line total out of range"))?,
    };

    if line_total < Decimal::ZERO {
        return Err(incomplete("negative line total"));
    }

    Ok(ProductLineRecord {
        style_or_barcode: style,
        style_code: ctx.current_reference.clone(),
        product_name: ctx.current_style_name.clone(),
        color: ctx.current_color.clone(),
        size,
        quantity,
        unit_price,
        line_total,
        quality: ctx.quality.clone(),
        retail_price: ctx.retail_price,
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn styled() -> ParseContext {
        ParseContext {
            current_style_code: Some("F10854".to_string()),
            current_style_name: Some("Fresa Onesie".to_string()),
            current_color: Some("Blue Violet".to_string()),
            current_unit_price: Some(dec("16.40")),
            ..ParseContext::default()
        }
    }

    #[test]
    fn test_style_price_fills_unit_price() {
        let partial = PartialRecord {
            size: Some("2Y".to_string()),
            quantity: Some(dec("2")),
            ..PartialRecord::default()
        };

        let record = assemble(&partial, &styled(), 7).unwrap();
        assert_eq!(record.unit_price, dec("16.40"));
        assert_eq!(record.line_total, dec("32.80"));
        assert_eq!(record.color.as_deref(), Some("Blue Violet"));
        assert_eq!(record.line, 7);
        assert!(record.is_complete());
    }

    #[test]
    fn test_unit_price_derived_from_total() {
        let ctx = ParseContext {
            current_unit_price: None,
            ..styled()
        };
        let partial = PartialRecord {
            size: Some("M".to_string()),
            quantity: Some(dec("3")),
            line_total: Some(dec("45.00")),
            ..PartialRecord::default()
        };

        let record = assemble(&partial, &ctx, 0).unwrap();
        assert_eq!(record.unit_price, dec("15.00"));
        assert_eq!(record.line_total, dec("45.00"));
    }

    #[test]
    fn test_supplier_total_is_kept() {
        let partial = PartialRecord {
            size: Some("M".to_string()),
            quantity: Some(dec("2")),
            unit_price: Some(dec("10.00")),
            line_total: Some(dec("18.00")),
        };

        let record = assemble(&partial, &styled(), 0).unwrap();
        assert_eq!(record.line_total, dec("18.00"));
    }

    #[test]
    fn test_size_from_context() {
        let ctx = ParseContext {
            current_size: Some("S".to_string()),
            current_reference: Some("WKN00256".to_string()),
            ..styled()
        };
        let partial = PartialRecord {
            quantity: Some(dec("1")),
            unit_price: Some(dec("60")),
            ..PartialRecord::default()
        };

        let record = assemble(&partial, &ctx, 0).unwrap();
        assert_eq!(record.size, "S");
        assert_eq!(record.style_code.as_deref(), Some("WKN00256"));
    }

    #[test]
    fn test_rejections() {
        let partial = PartialRecord {
            size: Some("2Y".to_string()),
            quantity: Some(dec("1")),
            ..PartialRecord::default()
        };
        assert!(matches!(
            assemble(&partial, &ParseContext::default(), 0),
            Err(LineIssue::IncompleteRecord(_))
        ));

        let no_size = PartialRecord {
            size: None,
            ..partial.clone()
        };
        assert!(assemble(&no_size, &styled(), 0).is_err());

        let zero = PartialRecord {
            quantity: Some(Decimal::ZERO),
            ..partial.clone()
        };
        assert!(assemble(&zero, &styled(), 0).is_err());

        let no_price = ParseContext {
            current_unit_price: None,
            ..styled()
        };
        assert!(assemble(&partial, &no_price, 0).is_err());
    }

    #[test]
    fn test_out_of_range_amounts_reject() {
        let huge = dec("99999999999999999999");
        let partial = PartialRecord {
            size: Some("2Y".to_string()),
            quantity: Some(huge),
            unit_price: Some(huge),
            line_total: None,
        };
        assert_eq!(
            assemble(&partial, &styled(), 0),
            Err(LineIssue::IncompleteRecord("line total out of range".to_string()))
        );

        // A printed total is kept even when the product cannot be computed.
        let printed = PartialRecord {
            line_total: Some(dec("10.00")),
            ..partial
        };
        assert_eq!(assemble(&printed, &styled(), 0).unwrap().line_total, dec("10.00"));

        let tiny = PartialRecord {
            size: Some("2Y".to_string()),
            quantity: Some(dec("0.0000000001")),
            unit_price: None,
            line_total: Some(dec("79228162514264337593543950335")),
        };
        let no_price = ParseContext {
            current_unit_price: None,
            ..styled()
        };
        assert_eq!(
            assemble(&tiny, &no_price, 0),
            Err(LineIssue::IncompleteRecord("unit price out of range".to_string()))
        );
    }
}
