//! Conversion of raw table-cell text into numbers.
//!
//! Site markup mixes currency symbols, thousands separators, unicode minus
//! signs, accounting-style parenthesized negatives, percent signs and
//! placeholder tokens. Every function here is pure and returns `None` rather
//! than failing when the text carries no usable number.

use std::sync::OnceLock;

use regex::Regex;

/// Tokens the site uses for "no value".
const MISSING_TOKENS: &[&str] = &["", "-", "--", "—", "n/a", "na", "nan", "null", "none", "..."];

/// Leading characters stripped before parsing.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

/// A numeric cell and whether it was tagged as a percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericCell {
    pub value: f64,
    pub is_percent: bool,
}

/// Parses a cell such as `"$1,234.50"`, `"(3.2)"`, `"−1.5%"` or `"+0.25"`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if MISSING_TOKENS
        .iter()
        .any(|t| text.eq_ignore_ascii_case(t))
    {
        return None;
    }

    let mut negative = false;
    let mut body = text;
    if body.starts_with('(') && body.ends_with(')') && body.len() > 2 {
        negative = true;
        body = &body[1..body.len() - 1];
    }

    let mut cleaned = String::with_capacity(body.len());
    for ch in body.chars() {
        match ch {
            '\u{2212}' | '\u{2013}' | '\u{2014}' | '-' => cleaned.push('-'),
            '0'..='9' | '.' => cleaned.push(ch),
            ',' | '+' | '%' | '\u{a0}' => {}
            c if c.is_whitespace() => {}
            c if CURRENCY_SYMBOLS.contains(&c) => {}
            _ => return None,
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value.abs() } else { value })
}

/// True when the cell text carries a percent sign.
pub fn is_percent(raw: &str) -> bool {
    raw.contains('%')
}

/// Parses a cell and records whether it is percent-tagged.
pub fn classify(raw: &str) -> Option<NumericCell> {
    parse_number(raw).map(|value| NumericCell {
        value,
        is_percent: is_percent(raw),
    })
}

fn leading_number_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^\s*\(?[-+\u{2212}\u{2013}]?\s*[$€£¥]?",
            r"\s*\d[\d,]*(?:\.\d+)?\s*%?\s*\)?",
        ))
        .ok()
    })
    .as_ref()
}

fn previous_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\S\s*\(([-\d.]+)\)|vs\.?\s*([-\d.]+)|previous[:\s]*([-\d.]+)").ok()
    })
    .as_ref()
}

/// Parses the leading number of a macro indicator cell, ignoring unit
/// suffixes such as `%`, `bps`, `bn` or `trillion` and any trailing
/// annotation like `"(1.4)"`.
pub fn parse_indicator_value(raw: &str) -> Option<f64> {
    let m = leading_number_re()?.find(raw)?;
    let token = m.as_str().trim();
    // "(1.4" without the closing paren is an annotation, not a negative.
    if token.starts_with('(') && !token.ends_with(')') {
        return None;
    }
    parse_number(token)
}

/// Extracts a previous-period value from text like `"1.5 (1.4)"`,
/// `"2.0 vs 1.8"` or `"Previous: 3.1"`.
pub fn parse_previous(raw: &str) -> Option<f64> {
    let caps = previous_re()?.captures(raw)?;
    (1..=3)
        .filter_map(|i| caps.get(i))
        .find_map(|m| parse_number(m.as_str()))
}

/// Unit label implied by a value cell's text.
pub fn infer_unit(raw: &str) -> &'static str {
    let lower = raw.to_lowercase();
    if ["billion", "trillion", "bln", "bn"]
        .iter()
        .any(|k| lower.contains(k))
    {
        "billions"
    } else if lower.contains("yoy") || lower.contains("year") {
        "% YoY"
    } else if lower.contains("bps") || lower.contains("basis points") {
        "bps"
    } else {
        "%"
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_and_thousands() {
        assert_eq!(parse_number("$1,234.50"), Some(1234.50));
        assert_eq!(parse_number("€ 98.1"), Some(98.1));
        assert_eq!(parse_number("£1,000"), Some(1000.0));
    }

    #[test]
    fn parenthesized_negative() {
        assert_eq!(parse_number("(3.2)"), Some(-3.2));
        assert_eq!(parse_number("(0.45%)"), Some(-0.45));
    }

    #[test]
    fn unicode_minus_variants() {
        assert_eq!(parse_number("\u{2212}1.5%"), Some(-1.5));
        assert_eq!(parse_number("\u{2013}0.7"), Some(-0.7));
        assert_eq!(parse_number("-2"), Some(-2.0));
    }

    #[test]
    fn explicit_plus() {
        assert_eq!(parse_number("+0.25"), Some(0.25));
        assert_eq!(parse_number("+1.10%"), Some(1.10));
    }

    #[test]
    fn missing_tokens() {
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("  "), None);
        assert_eq!(parse_number("—"), None);
    }

    #[test]
    fn text_is_not_a_number() {
        assert_eq!(parse_number("EURUSD"), None);
        assert_eq!(parse_number("12 Jan"), None);
        assert_eq!(parse_number("1.2.3"), None);
    }

    #[test]
    fn classify_tags_percent() {
        assert_eq!(
            classify("0.25%"),
            Some(NumericCell {
                value: 0.25,
                is_percent: true
            })
        );
        assert_eq!(
            classify("1.0845"),
            Some(NumericCell {
                value: 1.0845,
                is_percent: false
            })
        );
        assert_eq!(classify("Euro"), None);
    }

    #[test]
    fn indicator_values_strip_units() {
        assert_eq!(parse_indicator_value("3.1%"), Some(3.1));
        assert_eq!(parse_indicator_value("25 bps"), Some(25.0));
        assert_eq!(parse_indicator_value("1,234.5 bn"), Some(1234.5));
        assert_eq!(parse_indicator_value("2.1 trillion"), Some(2.1));
        assert_eq!(parse_indicator_value("1.5 (1.4)"), Some(1.5));
        assert_eq!(parse_indicator_value("(0.3)"), Some(-0.3));
        assert_eq!(parse_indicator_value("\u{2212}0.2% YoY"), Some(-0.2));
        assert_eq!(parse_indicator_value("n/a"), None);
    }

    #[test]
    fn previous_value_forms() {
        assert_eq!(parse_previous("1.5 (1.4)"), Some(1.4));
        assert_eq!(parse_previous("2.0 vs 1.8"), Some(1.8));
        assert_eq!(parse_previous("Previous: 3.1"), Some(3.1));
        assert_eq!(parse_previous("2.4"), None);
    }

    #[test]
    fn units_from_text() {
        assert_eq!(infer_unit("1.2 bn"), "billions");
        assert_eq!(infer_unit("3% YoY"), "% YoY");
        assert_eq!(infer_unit("25 bps"), "bps");
        assert_eq!(infer_unit("4.1"), "%");
    }

    #[test]
    fn whitespace_collapse() {
        assert_eq!(collapse_whitespace("  Euro \n  Dollar\t"), "Euro Dollar");
    }
}
