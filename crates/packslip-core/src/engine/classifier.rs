//! Line classification.
//!
//! Tags one trimmed line using the compiled patterns of a supplier format.
//! Classification is pure: it borrows the line and never parses numbers,
//! so a numeric-looking token that later fails to parse is reported by
//! the extractor.

use crate::format::amounts::{is_numeric_token, strip_units};
use crate::format::{CompiledFormat, DetailField};

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTag<'a> {
    /// Header, footer, page marker or other boilerplate.
    Noise,

    /// Start of a new product (style code or barcode).
    StyleMarker {
        code: &'a str,
        name: Option<&'a str>,
        price: Option<&'a str>,
    },

    /// Color for the following rows.
    ColorMarker { color: &'a str },

    /// A single size declaration, or the size column layout when `layout` is set.
    SizeMarker {
        sizes: Vec<&'a str>,
        reference: Option<&'a str>,
        layout: bool,
    },

    /// Keyword line enriching the current style.
    DetailMarker {
        field: DetailField,
        value: &'a str,
        amount: Option<&'a str>,
    },

    /// Numeric row; `size` is set when the row prefix carries one.
    DataRow {
        tokens: Vec<&'a str>,
        size: Option<&'a str>,
    },

    /// Free text, possibly part of a multi-line product name.
    HeaderFragment(&'a str),
}

impl LineTag<'_> {
    /// Short name of the tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LineTag::Noise => "noise",
            LineTag::StyleMarker { .. } => "style",
            LineTag::ColorMarker { .. } => "color",
            LineTag::SizeMarker { .. } => "size",
            LineTag::DetailMarker { .. } => "detail",
            LineTag::DataRow { .. } => "data",
            LineTag::HeaderFragment(_) => "fragment",
        }
    }
}

/// Classify one trimmed line.
///
/// Noise patterns are checked first, so a footer total that also looks
/// like a data row is never turned into a record.
pub fn classify<'a>(line: &'a str, format: &CompiledFormat) -> LineTag<'a> {
    if format.is_noise(line) {
        return LineTag::Noise;
    }

    if let Some(caps) = format.style.captures(line) {
        if let Some(code) = caps.name("code") {
            return LineTag::StyleMarker {
                code: code.as_str(),
                name: caps.name("name").map(|m| m.as_str()),
                price: caps.name("price").map(|m| m.as_str()),
            };
        }
    }

    if let Some(caps) = format.size_marker.as_ref().and_then(|re| re.captures(line)) {
        if let Some(size) = caps.name("size") {
            return LineTag::SizeMarker {
                sizes: vec![size.as_str()],
                reference: caps.name("reference").map(|m| m.as_str()),
                layout: false,
            };
        }
    }

    if let Some(caps) = format.size_header.as_ref().and_then(|re| re.captures(line)) {
        if let Some(sizes) = caps.name("sizes") {
            return LineTag::SizeMarker {
                sizes: sizes.as_str().split_whitespace().collect(),
                reference: None,
                layout: true,
            };
        }
    }

    if let Some(caps) = format.color.as_ref().and_then(|re| re.captures(line)) {
        if let Some(color) = caps.name("color") {
            return LineTag::ColorMarker {
                color: color.as_str().trim(),
            };
        }
    }

    for (field, re) in &format.details {
        if let Some(caps) = re.captures(line) {
            if let Some(value) = caps.name("value") {
                return LineTag::DetailMarker {
                    field: *field,
                    value: value.as_str().trim(),
                    amount: caps.name("amount").map(|m| m.as_str()),
                };
            }
        }
    }

    if let Some(tag) = data_row(line, format) {
        return tag;
    }

    LineTag::HeaderFragment(line)
}

/// Recognize a numeric data row.
///
/// Tokens are whitespace separated; glyph-only tokens ("€", "EUR") are
/// dropped and every other token must have numeric shape.
fn data_row<'a>(line: &'a str, format: &CompiledFormat) -> Option<LineTag<'a>> {
    let (rest, size) = match &format.row_prefix {
        Some(re) => {
            let caps = re.captures(line)?;
            let whole = caps.get(0)?;
            if whole.start() != 0 {
                return None;
            }
            (&line[whole.end()..], caps.name("size").map(|m| m.as_str()))
        }
        None => (line, None),
    };

    let mut tokens = Vec::new();
    for token in rest.split_whitespace() {
        // Glyph-only tokens ("€", "EUR") are dropped.
        if strip_units(token).is_empty() {
            continue;
        }
        if !is_numeric_token(token) {
            return None;
        }
        tokens.push(token);
    }

    (tokens.len() >= format.data_row().min_numbers)
        .then_some(LineTag::DataRow { tokens, size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::builtin;
    use pretty_assertions::assert_eq;

    fn format(id: &str) -> CompiledFormat {
        builtin(id).unwrap().compile().unwrap()
    }

    #[test]
    fn test_floss_lines() {
        let f = format("floss");

        assert_eq!(
            classify("Style no: F10854 Price: 16,40 EUR", &f),
            LineTag::StyleMarker {
                code: "F10854",
                name: None,
                price: Some("16,40"),
            }
        );
        assert_eq!(
            classify("Style name: Fresa Onesie Total: 49,20 EUR", &f),
            LineTag::DetailMarker {
                field: DetailField::Name,
                value: "Fresa Onesie",
                amount: Some("49,20"),
            }
        );
        assert_eq!(
            classify("Assortments 2Y 3Y 4Y Qty Assort. Total Acc.", &f),
            LineTag::SizeMarker {
                sizes: vec!["2Y", "3Y", "4Y"],
                reference: None,
                layout: true,
            }
        );
        assert_eq!(
            classify("Color: Blue Violet", &f),
            LineTag::ColorMarker { color: "Blue Violet" }
        );
        assert_eq!(
            classify("total 1 1 1 3 3 49,20 49,20", &f),
            LineTag::DataRow {
                tokens: vec!["1", "1", "1", "3", "3", "49,20", "49,20"],
                size: None,
            }
        );
    }

    #[test]
    fn test_noise_wins_over_data_shape() {
        let f = format("floss");
        assert_eq!(classify("TOTAL 147,60 EUR", &f), LineTag::Noise);
        assert_eq!(classify("Subtotal 1 2 3 4", &f), LineTag::Noise);
        assert_eq!(classify("Page 2 of 3", &f), LineTag::Noise);
    }

    #[test]
    fn test_ean_sku_lines() {
        let f = format("ean-sku");

        assert_eq!(
            classify("8435512929389", &f),
            LineTag::StyleMarker {
                code: "8435512929389",
                name: None,
                price: None,
            }
        );
        assert_eq!(
            classify("OMNIA SOL ECRU TESSA", &f),
            LineTag::HeaderFragment("OMNIA SOL ECRU TESSA")
        );
        assert_eq!(
            classify("WKN00256,S", &f),
            LineTag::SizeMarker {
                sizes: vec!["S"],
                reference: Some("WKN00256"),
                layout: false,
            }
        );
        assert_eq!(
            classify("60,00€ 1 60,00€ 0% 60,00€", &f),
            LineTag::DataRow {
                tokens: vec!["60,00€", "1", "60,00€", "0%", "60,00€"],
                size: None,
            }
        );
    }

    #[test]
    fn test_data_row_threshold() {
        let f = format("ean-sku");
        // Too few numbers to be a price row.
        assert_eq!(classify("12 34", &f), LineTag::HeaderFragment("12 34"));
        // Glyph-only tokens do not count and do not break the row.
        assert!(matches!(
            classify("60,00 € 1 60,00 € 0 % 60,00 €", &f),
            LineTag::DataRow { ref tokens, .. } if tokens.len() == 5
        ));
    }

    #[test]
    fn test_prefixed_size_row() {
        let f = format("kids-nl");
        assert_eq!(
            classify("2 jaar 2 18,95 37,90", &f),
            LineTag::DataRow {
                tokens: vec!["2", "18,95", "37,90"],
                size: Some("2 jaar"),
            }
        );
        assert_eq!(classify("met kraag", &f), LineTag::HeaderFragment("met kraag"));
    }
}
