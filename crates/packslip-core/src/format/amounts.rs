//! Locale-aware parsing of prices and quantities.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::DecimalConvention;

lazy_static! {
    /// Shape of a numeric token once currency glyphs are stripped.
    static ref NUMERIC_TOKEN: Regex = Regex::new(r"^[-+]?\d[\d.,]*$").unwrap();
}

/// Glyphs removed from both ends of a numeric token.
const UNIT_GLYPHS: &[char] = &['€', '$', '£', '%'];

/// Currency codes that may be glued to an amount ("16,40EUR") or stand alone.
const CURRENCY_CODES: &[&str] = &[
    "EUR", "USD", "GBP", "PLN", "CHF", "SEK", "DKK", "NOK", "zł", "ZŁ",
];

/// Strip currency glyphs, currency codes and percent signs from a token.
///
/// A token made only of such glyphs becomes empty.
pub fn strip_units(token: &str) -> &str {
    let mut t = trim_glyphs(token);

    for code in CURRENCY_CODES {
        if let Some(head) = t.get(..code.len()) {
            if head.eq_ignore_ascii_case(code) {
                t = trim_glyphs(&t[code.len()..]);
            }
        }
        if t.len() >= code.len() {
            let split = t.len() - code.len();
            if let Some(tail) = t.get(split..) {
                if tail.eq_ignore_ascii_case(code) {
                    t = trim_glyphs(&t[..split]);
                }
            }
        }
    }

    t
}

fn trim_glyphs(s: &str) -> &str {
    s.trim_matches(|c: char| UNIT_GLYPHS.contains(&c) || c.is_whitespace())
}

/// Check whether a token looks like a number after unit stripping.
pub fn is_numeric_token(token: &str) -> bool {
    NUMERIC_TOKEN.is_match(strip_units(token))
}

/// Parse an amount written with the given decimal convention.
///
/// Under [`DecimalConvention::Comma`], `65,40`, `65.40` and `65,40 €` all
/// parse to 65.40 and `1.234,56` parses to 1234.56. A lone separator
/// followed by exactly three digits is read as a thousands separator.
/// Returns `None` for anything that is not a well-formed number.
pub fn parse_amount(s: &str, convention: DecimalConvention) -> Option<Decimal> {
    let cleaned: String = strip_units(s)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}' && *c != '\'')
        .collect();

    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if !digits.starts_with(|c: char| c.is_ascii_digit())
        || !digits.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let (decimal, group) = match convention {
        DecimalConvention::Comma => (',', '.'),
        DecimalConvention::Period => ('.', ','),
        DecimalConvention::Auto => match (digits.rfind(','), digits.rfind('.')) {
            (Some(c), Some(d)) if c > d => (',', '.'),
            (Some(_), None) => (',', '.'),
            _ => ('.', ','),
        },
    };

    let normalized = normalize(digits, decimal, group)?;
    let value = Decimal::from_str(&normalized).ok()?;

    Some(if negative { -value } else { value })
}

fn normalize(digits: &str, decimal: char, group: char) -> Option<String> {
    if let Some((int_part, frac)) = digits.split_once(decimal) {
        if frac.is_empty() || frac.contains([decimal, group]) {
            return None;
        }
        let int_part = strip_groups(int_part, group)?;
        return Some(format!("{}.{}", int_part, frac));
    }

    if let Some((head, tail)) = digits.split_once(group) {
        // One separator not followed by a full thousands group is a decimal point.
        if !tail.contains(group) && tail.len() != 3 {
            return Some(format!("{}.{}", head, tail));
        }
        return strip_groups(digits, group);
    }

    Some(digits.to_string())
}

/// Remove thousands separators, rejecting malformed groupings like `1.2.3`.
fn strip_groups(int_part: &str, group: char) -> Option<String> {
    if int_part.is_empty() {
        return Some("0".to_string());
    }

    let mut groups = int_part.split(group);
    let first = groups.next()?;
    if first.is_empty() {
        return None;
    }

    let mut out = first.to_string();
    for g in groups {
        if g.len() != 3 || first.len() > 3 {
            return None;
        }
        out.push_str(g);
    }
    Some(out)
}

/// Format an amount with two decimals in the given convention (1.234,56 or 1,234.56).
pub fn format_amount(amount: Decimal, convention: DecimalConvention) -> String {
    let (decimal, group) = match convention {
        DecimalConvention::Comma => (',', '.'),
        DecimalConvention::Period | DecimalConvention::Auto => ('.', ','),
    };

    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((&s, "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted.push('-');
    }
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(group);
        }
        formatted.push(*c);
    }

    format!("{}{}{}", formatted, decimal, decimal_part)
}
