use std::sync::OnceLock;

use regex::Regex;

use crate::error::TradingEconError;
use crate::models::{MacroIndicator, MarketInstrument, NewsArticle};

pub const MAX_SYMBOL_LENGTH: usize = 50;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_INDICATOR_NAME_LENGTH: usize = 100;
pub const MAX_UNIT_LENGTH: usize = 20;
pub const MAX_SOURCE_LENGTH: usize = 100;
pub const MAX_PERIOD_LENGTH: usize = 50;
pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 500;
pub const MAX_SUMMARY_LENGTH: usize = 2000;
pub const MAX_URL_LENGTH: usize = 1000;
pub const MAX_CATEGORY_LENGTH: usize = 50;

/// Largest accepted gap between a quoted percent change and the one implied
/// by `change / previous_close`.
pub const PCT_CONSISTENCY_TOLERANCE: f64 = 0.01;

const ELLIPSIS: &str = "...";

fn url_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://[\w.-]+(?:\.[\w-]+)+(?::\d+)?(?:/\S*)?$").ok())
        .as_ref()
}

fn invalid(msg: String) -> TradingEconError {
    TradingEconError::InvalidInput(msg)
}

/// Strip control characters, collapse whitespace, and trim.
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), TradingEconError> {
    let len = value.chars().count();
    if len < min {
        return Err(invalid(format!(
            "{} must be at least {} characters, got {}",
            field, min, len
        )));
    }
    if len > max {
        return Err(invalid(format!(
            "{} exceeds maximum length of {} characters",
            field, max
        )));
    }
    Ok(())
}

fn check_optional_len(
    field: &str,
    value: &mut Option<String>,
    max: usize,
) -> Result<(), TradingEconError> {
    if let Some(text) = value.take() {
        let cleaned = sanitize_text(&text);
        if cleaned.is_empty() {
            return Ok(());
        }
        check_len(field, &cleaned, 0, max)?;
        *value = Some(cleaned);
    }
    Ok(())
}

fn check_finite(field: &str, value: Option<f64>) -> Result<(), TradingEconError> {
    match value {
        Some(v) if !v.is_finite() => Err(invalid(format!("{} is not a finite number", field))),
        _ => Ok(()),
    }
}

/// Validate and normalize a market symbol: 1-50 characters of
/// `[A-Za-z0-9-./]`, returned uppercase.
pub fn validate_symbol(input: &str) -> Result<String, TradingEconError> {
    let trimmed = input.trim();
    check_len("symbol", trimmed, 1, MAX_SYMBOL_LENGTH)?;
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/')))
    {
        return Err(invalid(format!(
            "Invalid symbol format: '{}' (unexpected character '{}')",
            trimmed, bad
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Checks that a quoted percent change agrees with `change / previous_close`.
pub fn check_pct_consistency(
    change: f64,
    pct_change: f64,
    previous_close: f64,
) -> Result<(), TradingEconError> {
    if previous_close == 0.0 {
        return Ok(());
    }
    let implied = change / previous_close * 100.0;
    let gap = (pct_change - implied).abs();
    if gap > PCT_CONSISTENCY_TOLERANCE + 1e-9 {
        return Err(invalid(format!(
            "pct_change {:.4} disagrees with change/previous_close ({:.4})",
            pct_change, implied
        )));
    }
    Ok(())
}

/// Enforce instrument invariants, normalizing symbol and name.
pub fn validate_instrument(
    mut inst: MarketInstrument,
) -> Result<MarketInstrument, TradingEconError> {
    inst.symbol = validate_symbol(&inst.symbol)?;
    inst.name = sanitize_text(&inst.name);
    check_len("name", &inst.name, 1, MAX_NAME_LENGTH)?;

    if !inst.value.is_finite() {
        return Err(invalid(format!("value for {} is not finite", inst.symbol)));
    }
    for (field, value) in [
        ("change", inst.change),
        ("pct_change", inst.pct_change),
        ("bid", inst.bid),
        ("ask", inst.ask),
        ("high", inst.high),
        ("low", inst.low),
        ("open", inst.open),
        ("previous_close", inst.previous_close),
    ] {
        check_finite(field, value)?;
    }

    if let Some(pct) = inst.pct_change {
        if !(-100.0..=100.0).contains(&pct) {
            return Err(invalid(format!(
                "pct_change {} for {} is outside [-100, 100]",
                pct, inst.symbol
            )));
        }
    }

    if let (Some(change), Some(pct), Some(prev)) =
        (inst.change, inst.pct_change, inst.previous_close)
    {
        check_pct_consistency(change, pct, prev)?;
    }

    Ok(inst)
}

/// Enforce macro indicator invariants.
pub fn validate_indicator(mut ind: MacroIndicator) -> Result<MacroIndicator, TradingEconError> {
    ind.indicator_name = sanitize_text(&ind.indicator_name);
    check_len(
        "indicator_name",
        &ind.indicator_name,
        1,
        MAX_INDICATOR_NAME_LENGTH,
    )?;
    ind.unit = sanitize_text(&ind.unit);
    if ind.unit.is_empty() {
        ind.unit = "%".to_string();
    }
    check_len("unit", &ind.unit, 1, MAX_UNIT_LENGTH)?;
    check_optional_len("source", &mut ind.source, MAX_SOURCE_LENGTH)?;
    check_optional_len("period", &mut ind.period, MAX_PERIOD_LENGTH)?;
    check_finite("value", ind.value)?;
    check_finite("previous", ind.previous)?;
    check_finite("forecast", ind.forecast)?;
    Ok(ind)
}

/// Truncate `text` to at most `max` characters, ending in `...` when cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Validate an absolute http(s) URL no longer than 1000 characters.
pub fn validate_url(input: &str) -> Result<String, TradingEconError> {
    let trimmed = input.trim();
    check_len("url", trimmed, 1, MAX_URL_LENGTH)?;
    let matches = url_re().is_some_and(|re| re.is_match(trimmed));
    if !matches {
        return Err(invalid(format!("Invalid URL format: {}", trimmed)));
    }
    Ok(trimmed.to_string())
}

/// Enforce article invariants. Over-long summaries are truncated, not rejected.
pub fn validate_article(mut article: NewsArticle) -> Result<NewsArticle, TradingEconError> {
    article.title = sanitize_text(&article.title);
    check_len("title", &article.title, MIN_TITLE_LENGTH, MAX_TITLE_LENGTH)?;
    article.url = validate_url(&article.url)?;

    article.summary = article
        .summary
        .map(|s| sanitize_text(&s))
        .filter(|s| !s.is_empty())
        .map(|s| truncate_with_ellipsis(&s, MAX_SUMMARY_LENGTH));

    check_optional_len("source", &mut article.source, MAX_SOURCE_LENGTH)?;
    check_optional_len("category", &mut article.category, MAX_CATEGORY_LENGTH)?;
    Ok(article)
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
