//! Built-in supplier formats.
//!
//! These are ordinary [`FormatSpec`] values; anything here can also be
//! written as a JSON file and loaded at runtime.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use super::{
    ColumnRole, ColumnSpec, DataRowSpec, DecimalConvention, DetailField, DetailPattern,
    FormatSpec, FragmentPlacement, HeaderPatterns, MismatchPolicy,
};

lazy_static! {
    static ref BUILTIN: Vec<FormatSpec> = vec![floss(), ean_sku(), kids_nl()];
}

/// Look up a built-in format by id.
pub fn builtin(id: &str) -> Option<&'static FormatSpec> {
    BUILTIN.iter().find(|spec| spec.id.eq_ignore_ascii_case(id))
}

/// Identifiers of all built-in formats.
pub fn builtin_ids() -> Vec<&'static str> {
    BUILTIN.iter().map(|spec| spec.id.as_str()).collect()
}

/// All built-in formats.
pub fn builtin_specs() -> &'static [FormatSpec] {
    &BUILTIN
}

fn strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

fn vocabulary(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Style / colour / assortment layout.
///
/// ```text
/// Style no: F10854 Price: 16,40 EUR
/// Style name: Fresa Onesie Total: 49,20 EUR
/// Quality: 100% Cotton
/// RRP: 41,00 EUR
/// Assortments 2Y 3Y 4Y Qty Assort. Total Acc.
/// Color: Blue Violet
/// total 1 1 1 3 3 49,20 49,20
/// ```
fn floss() -> FormatSpec {
    FormatSpec {
        id: "floss".to_string(),
        name: "Flöss (style/colour assortments)".to_string(),
        decimal: DecimalConvention::Comma,
        noise: strings(&[
            r"(?i)^page\s+\d+(\s*(of|/)\s*\d+)?$",
            r"(?i)^invoice\s*(#|no\.?|number)",
            r"(?i)^bank\s+details",
            r"(?i)^(iban|bic|swift)\b",
            r"(?i)^sub\s*total\b",
            r"(?i)^total\s*(amount|invoice|excl|incl|eur)\b",
            r"(?i)^total\s*:?\s*[\d.,]+\s*(eur|€)?$",
            r"(?i)^(vat|moms)\b",
            r"(?i)^(invoice\s+)?date\s*:",
        ]),
        style: r"(?i)^style\s*no\.?:?\s*(?P<code>[A-Z0-9][A-Z0-9-]*)(?:\s+price:\s*(?P<price>[\d.,]+)(?:\s*(?:EUR|€))?)?\s*$"
            .to_string(),
        size_marker: None,
        size_header: Some(r"(?i)^assortments?\s+(?P<sizes>.+?)\s+qty\b".to_string()),
        color: Some(r"(?i)^colou?r:\s*(?P<color>.+)$".to_string()),
        details: vec![
            DetailPattern {
                field: DetailField::Name,
                pattern: r"(?i)^style\s*name:\s*(?P<value>.+?)(?:\s+total:\s*(?P<amount>[\d.,]+)(?:\s*(?:EUR|€))?)?\s*$"
                    .to_string(),
            },
            DetailPattern {
                field: DetailField::Quality,
                pattern: r"(?i)^quality:\s*(?P<value>.+)$".to_string(),
            },
            DetailPattern {
                field: DetailField::RetailPrice,
                pattern: r"(?i)^rrp:\s*(?P<value>(?P<amount>[\d.,]+)(?:\s*(?:EUR|€))?)\s*$".to_string(),
            },
        ],
        data_row: DataRowSpec {
            prefix: Some(r"(?i)^total\s+".to_string()),
            min_numbers: 4,
            size_columns: true,
            columns: vec![
                ColumnSpec::required(ColumnRole::Quantity),
                ColumnSpec::required(ColumnRole::AssortmentCount),
                ColumnSpec::required(ColumnRole::LineTotal),
                ColumnSpec::optional(ColumnRole::AccumulatedTotal),
            ],
            mismatch: MismatchPolicy::BestEffort,
        },
        size_vocabulary: vocabulary(&[("2-3y", "2Y-3Y"), ("4-5y", "4Y-5Y"), ("6-7y", "6Y-7Y")]),
        max_fragments: 0,
        fragment_placement: FragmentPlacement::Trailing,
        header: HeaderPatterns {
            invoice_number: Some(r"(?i)^invoice\s*(?:#|no\.?|number)\s*:?\s*(?P<number>[A-Z0-9][A-Z0-9/-]*)".to_string()),
            invoice_date: Some(r"(?i)^(?:invoice\s+)?date\s*:\s*(?P<date>\d{1,2}[./-]\d{1,2}[./-]\d{2,4})".to_string()),
            date_formats: strings(&["%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%y"]),
        },
    }
}

/// Barcode, wrapped product name, `SKU,SIZE`, then a price row.
///
/// ```text
/// 8435512929389
/// OMNIA SOL ECRU TESSA
/// KNITTED SWEATER
/// WKN00256,S
/// 60,00€ 1 60,00€ 0% 60,00€
/// ```
fn ean_sku() -> FormatSpec {
    FormatSpec {
        id: "ean-sku".to_string(),
        name: "EAN barcode with SKU/size line".to_string(),
        decimal: DecimalConvention::Comma,
        noise: strings(&[
            r"(?i)^(page|p[áa]gina|p[áa]g\.)\s*\d+",
            r"(?i)^(invoice|factura)\b",
            r"(?i)bank\s+details",
            r"(?i)^(iban|swift|bic)\b",
            r"(?i)^(sub)?total\b",
            r"(?i)^(base\s+imponible|iva|vat)\b",
            r"(?i)^(ean|barcode)\b.*\b(qty|uds|price|precio)\b",
            r"(?i)^(date|fecha)\b",
        ]),
        style: r"^(?P<code>\d{13})$".to_string(),
        size_marker: Some(
            r"^(?P<reference>[A-Z]{2,}\d{3,}[A-Z0-9]*)\s*,\s*(?P<size>[A-Z0-9/.\-]+)$".to_string(),
        ),
        size_header: None,
        color: None,
        details: Vec::new(),
        data_row: DataRowSpec {
            prefix: None,
            min_numbers: 5,
            size_columns: false,
            columns: vec![
                ColumnSpec::required(ColumnRole::UnitPrice),
                ColumnSpec::required(ColumnRole::Quantity),
                ColumnSpec::required(ColumnRole::Subtotal),
                ColumnSpec::required(ColumnRole::Discount),
                ColumnSpec::required(ColumnRole::LineTotal),
            ],
            mismatch: MismatchPolicy::BestEffort,
        },
        size_vocabulary: vocabulary(&[("U", "ONE SIZE"), ("TU", "ONE SIZE")]),
        max_fragments: 3,
        fragment_placement: FragmentPlacement::Trailing,
        header: HeaderPatterns {
            invoice_number: Some(
                r"(?i)^(?:invoice|factura)\s*(?:no\.?|n[ºo°]\.?|#|number)\s*:?\s*(?P<number>[A-Z0-9][A-Z0-9/-]*)".to_string(),
            ),
            invoice_date: Some(
                r"(?i)^(?:invoice\s+date|fecha(?:\s+factura)?|date)\s*:?\s*(?P<date>\d{1,2}[./-]\d{1,2}[./-]\d{2,4})".to_string(),
            ),
            date_formats: strings(&["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"]),
        },
    }
}

/// Dutch children's-wear layout with the size leading each row.
///
/// ```text
/// Artikel: 24-118 Gebreide trui € 18,95
/// met kraag
/// Kleur: Oker
/// 2 jaar 2 18,95 37,90
/// 3 jaar 1 18,95 18,95
/// ```
fn kids_nl() -> FormatSpec {
    FormatSpec {
        id: "kids-nl".to_string(),
        name: "Dutch article/colour layout".to_string(),
        decimal: DecimalConvention::Comma,
        noise: strings(&[
            r"(?i)^pagina\s+\d+",
            r"(?i)^factuur",
            r"(?i)^(sub)?totaal\b",
            r"(?i)^btw\b",
            r"(?i)^(iban|bic)\b",
            r"(?i)^maat\s+aantal\b",
            r"(?i)^leverdatum\b",
        ]),
        style: r"(?i)^artikel(?:nr\.?)?:?\s*(?P<code>\d{2}-\d{3,4}[A-Z]?)\s+(?P<name>.+?)(?:\s+(?:€\s*)?(?P<price>\d+,\d{2}))?$"
            .to_string(),
        size_marker: None,
        size_header: None,
        color: Some(r"(?i)^kleur:\s*(?P<color>.+)$".to_string()),
        details: vec![
            DetailPattern {
                field: DetailField::Quality,
                pattern: r"(?i)^(?:kwaliteit|materiaal):\s*(?P<value>.+)$".to_string(),
            },
            DetailPattern {
                field: DetailField::RetailPrice,
                pattern: r"(?i)^adviesprijs:\s*(?P<value>(?:€\s*)?(?P<amount>\d+,\d{2}))$".to_string(),
            },
        ],
        data_row: DataRowSpec {
            prefix: Some(
                r"(?i)^(?P<size>\d{1,2}\s*(?:jaar|jr|mnd|maanden)|XXS|XS|S|M|L|XL|XXL)\s+".to_string(),
            ),
            min_numbers: 2,
            size_columns: false,
            columns: vec![
                ColumnSpec::required(ColumnRole::Quantity),
                ColumnSpec::required(ColumnRole::UnitPrice),
                ColumnSpec::optional(ColumnRole::LineTotal),
            ],
            mismatch: MismatchPolicy::BestEffort,
        },
        size_vocabulary: vocabulary(&[
            ("6 mnd", "6M"),
            ("9 mnd", "9M"),
            ("12 mnd", "12M"),
            ("18 mnd", "18M"),
            ("2 jaar", "2Y"),
            ("3 jaar", "3Y"),
            ("4 jaar", "4Y"),
            ("5 jaar", "5Y"),
            ("6 jaar", "6Y"),
            ("8 jaar", "8Y"),
            ("10 jaar", "10Y"),
            ("12 jaar", "12Y"),
            ("2 jr", "2Y"),
            ("3 jr", "3Y"),
            ("4 jr", "4Y"),
        ]),
        max_fragments: 2,
        fragment_placement: FragmentPlacement::Trailing,
        header: HeaderPatterns {
            invoice_number: Some(r"(?i)^factuurnummer\s*:?\s*(?P<number>[A-Z0-9][A-Z0-9/-]*)".to_string()),
            invoice_date: Some(r"(?i)^factuurdatum\s*:?\s*(?P<date>\d{1,2}-\d{1,2}-\d{4})".to_string()),
            date_formats: strings(&["%d-%m-%Y"]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_compile() {
        for spec in builtin_specs() {
            assert!(spec.compile().is_ok(), "format {} failed to compile", spec.id);
        }
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin_ids(), vec!["floss", "ean-sku", "kids-nl"]);
        assert!(builtin("FLOSS").is_some());
        assert!(builtin("unknown").is_none());
    }

    #[test]
    fn test_builtins_survive_json() {
        for spec in builtin_specs() {
            let json = spec.to_json().unwrap();
            let parsed = FormatSpec::from_json(&json).unwrap();
            assert_eq!(&parsed, spec);
        }
    }
}
