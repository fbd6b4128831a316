//! Macro indicator extraction for the 13 tracked countries.
//!
//! Each country runs its own chain: a table whose `th` cells name the
//! country, then the table nearest a text node naming the country, then a
//! class-keyword table tagged with the country. Tables laid out as a
//! country matrix (countries down the first column) are never used by the
//! per-country chain. When no country finds anything, the page is read as
//! one matrix: first row holds indicator names, later rows hold countries.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};

use super::{
    class_contains, element_text, in_excluded_subtree, nearest_ancestor, row_cells, selector,
    table_data_rows, table_header, DiscardReason, Extraction, RowLocator, RowOutcome,
    StrategyChain,
};
use crate::aliases::{self, IndicatorAliases};
use crate::models::{ActualVsForecast, CountryCode, Frequency, MacroIndicator};
use crate::numeric::{infer_unit, parse_indicator_value, parse_number, parse_previous};
use crate::validation::validate_indicator;

/// Indicators per country. Extraction always fills all 13 keys.
pub type MacroData = BTreeMap<CountryCode, Vec<MacroIndicator>>;

const CLASS_SELECTORS: &[&str] = &[
    ".macro-table",
    ".indicators-table",
    ".country-indicators",
    ".macro-data",
    "[class*=\"macro\"]",
    "[class*=\"indicators\"]",
];

/// Separators used when a single cell holds both name and value.
const INLINE_SEPARATORS: &[&str] = &["......", "\u{2014}", "--", "\u{2192}", "|", "\t"];

const SECTION_KEYWORDS: &[&str] = &["country", "nation", "region"];

/// True when free text names `country`. Full names match anywhere; short
/// codes only when they are the whole text.
fn text_names_country(text: &str, country: CountryCode) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }
    country.names().iter().any(|name| {
        if name.len() <= 3 {
            lower == *name
        } else {
            lower.contains(name)
        }
    })
}

/// True when an element's `data-country`, id or class tokens name `country`.
fn tagged_with_country(el: ElementRef<'_>, country: CountryCode) -> bool {
    let value = el.value();
    if value.attr("data-country").is_some_and(|c| {
        c.trim().eq_ignore_ascii_case(country.as_str()) || text_names_country(c, country)
    }) {
        return true;
    }
    value
        .id()
        .into_iter()
        .chain(value.classes())
        .flat_map(|attr| attr.split(|c: char| c == '-' || c == '_'))
        .any(|token| text_names_country(token, country))
}

/// Rows that belong directly to `table`, header included.
fn direct_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Some(tr) = selector("tr") else {
        return Vec::new();
    };
    table
        .select(&tr)
        .filter(|row| nearest_ancestor(*row, &["table"]).map(|t| t.id()) == Some(table.id()))
        .collect()
}

/// A table whose body rows mostly start with a country name.
pub fn is_country_matrix(table: ElementRef<'_>) -> bool {
    let rows = direct_rows(table);
    let labels: Vec<String> = rows
        .iter()
        .skip(1)
        .filter_map(|row| row_cells(*row).first().map(|c| element_text(*c)))
        .filter(|t| !t.is_empty())
        .collect();
    let countries = labels
        .iter()
        .filter(|l| CountryCode::from_label(l).is_some())
        .count();
    countries > 0 && countries * 2 > labels.len()
}

/// Data rows of a located container. Rows of nested country matrices are skipped.
fn container_rows(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    if el.value().name() == "table" {
        return table_data_rows(el);
    }
    let Some(tr) = selector("tr") else {
        return Vec::new();
    };
    el.select(&tr)
        .filter(|row| row_cells(*row).iter().any(|c| c.value().name() == "td"))
        .filter(|row| !nearest_ancestor(*row, &["table"]).is_some_and(is_country_matrix))
        .collect()
}

fn usable_table(table: ElementRef<'_>) -> bool {
    !in_excluded_subtree(table) && !is_country_matrix(table)
}

/// First table with a `th` naming the country.
pub struct HeaderMatchLocator {
    pub country: CountryCode,
}

impl RowLocator for HeaderMatchLocator {
    fn name(&self) -> &str {
        "header-match"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let (Some(table_sel), Some(th)) = (selector("table"), selector("th")) else {
            return Vec::new();
        };
        doc.select(&table_sel)
            .filter(|t| usable_table(*t))
            .find(|t| {
                t.select(&th)
                    .any(|cell| text_names_country(&element_text(cell), self.country))
            })
            .map(table_data_rows)
            .unwrap_or_default()
    }
}

/// Table enclosing, or following, the first text node that names the country.
pub struct TextProximityLocator {
    pub country: CountryCode,
}

impl TextProximityLocator {
    fn table_near<'a>(&self, parent: ElementRef<'a>) -> Option<ElementRef<'a>> {
        if let Some(table) = nearest_ancestor(parent, &["table"]) {
            return usable_table(table).then_some(table);
        }
        parent
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sib| sib.value().name() == "table")
            .filter(|t| usable_table(*t))
    }
}

impl RowLocator for TextProximityLocator {
    fn name(&self) -> &str {
        "text-proximity"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        for node in doc.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            if !text_names_country(text, self.country) {
                continue;
            }
            let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            if in_excluded_subtree(parent) {
                continue;
            }
            if let Some(table) = self.table_near(parent) {
                let rows = table_data_rows(table);
                if !rows.is_empty() {
                    return rows;
                }
            }
        }
        Vec::new()
    }
}

/// Class-keyword macro containers carrying the country in `data-country`,
/// id or class.
pub struct ClassKeywordLocator {
    pub country: CountryCode,
}

impl RowLocator for ClassKeywordLocator {
    fn name(&self) -> &str {
        "class-keyword"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        for css in CLASS_SELECTORS {
            let Some(sel) = selector(css) else {
                continue;
            };
            let found = doc.select(&sel).find(|el| {
                !in_excluded_subtree(*el)
                    && !(el.value().name() == "table" && is_country_matrix(*el))
                    && tagged_with_country(*el, self.country)
            });
            if let Some(el) = found {
                let rows = container_rows(el);
                if !rows.is_empty() {
                    return rows;
                }
            }
        }
        Vec::new()
    }
}

/// Body rows of country-matrix tables whose first cell names a country.
pub struct CountryMatrixLocator;

impl RowLocator for CountryMatrixLocator {
    fn name(&self) -> &str {
        "country-matrix"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(sel) = selector("table") else {
            return Vec::new();
        };
        doc.select(&sel)
            .filter(|t| !in_excluded_subtree(*t))
            .flat_map(|table| direct_rows(table).into_iter().skip(1))
            .filter(|row| {
                row_cells(*row)
                    .first()
                    .is_some_and(|c| CountryCode::from_label(&element_text(*c)).is_some())
            })
            .collect()
    }
}

/// The per-country chain, in precedence order.
pub fn country_chain(country: CountryCode) -> StrategyChain {
    StrategyChain::new(format!("macro:{}", country))
        .then(HeaderMatchLocator { country })
        .then(TextProximityLocator { country })
        .then(ClassKeywordLocator { country })
}

/// Reporting frequency implied by an indicator name.
pub fn frequency_for(name: &str) -> Frequency {
    let lower = name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["gdp", "quarterly", "q1", "q2", "q3", "q4"]) {
        Frequency::Quarterly
    } else if has(&["annual", "yearly", "yoy"]) {
        Frequency::Yearly
    } else if has(&["weekly"]) {
        Frequency::Weekly
    } else if has(&["daily", "today"]) {
        Frequency::Daily
    } else {
        Frequency::Monthly
    }
}

/// Columns of a per-country table located by header label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct IndicatorColumns {
    value: Option<usize>,
    previous: Option<usize>,
    forecast: Option<usize>,
    unit: Option<usize>,
    period: Option<usize>,
}

impl IndicatorColumns {
    fn from_labels(labels: &[String]) -> Self {
        let mut cols = Self::default();
        for (i, label) in labels.iter().enumerate().skip(1) {
            let label = label.trim();
            if label.contains("forecast") || label.contains("consensus") {
                cols.forecast.get_or_insert(i);
            } else if label.contains("prev") {
                cols.previous.get_or_insert(i);
            } else if label == "last" || label == "actual" || label == "value" {
                cols.value.get_or_insert(i);
            } else if label == "unit" {
                cols.unit.get_or_insert(i);
            } else if label.contains("reference") || label.contains("period") {
                cols.period.get_or_insert(i);
            }
        }
        cols
    }

    fn for_row(row: ElementRef<'_>, width: usize) -> Self {
        nearest_ancestor(row, &["table"])
            .and_then(table_header)
            .filter(|labels| labels.len() == width)
            .map(|labels| Self::from_labels(&labels))
            .unwrap_or_default()
    }
}

/// Name and value text of a row, splitting a lone cell on an inline separator.
fn name_and_value(texts: &[String]) -> Option<(String, String)> {
    match texts {
        [] => None,
        [only] => INLINE_SEPARATORS
            .iter()
            .find(|sep| only.contains(**sep))
            .and_then(|sep| {
                let mut parts = only.split(*sep).map(str::trim).filter(|p| !p.is_empty());
                let name = parts.next()?;
                let value = parts.last()?;
                Some((name.to_string(), value.to_string()))
            }),
        [name, value, ..] => Some((name.clone(), value.clone())),
    }
}

/// Turns one per-country table row into an indicator.
pub fn extract_indicator(
    row: ElementRef<'_>,
    country: CountryCode,
    aliases: &IndicatorAliases,
) -> RowOutcome<MacroIndicator> {
    let texts: Vec<String> = row_cells(row).into_iter().map(element_text).collect();
    let Some((raw_name, single_value)) = name_and_value(&texts) else {
        return RowOutcome::Discarded(DiscardReason::InsufficientCells {
            found: texts.len(),
            needed: 2,
        });
    };
    if raw_name.is_empty() {
        return RowOutcome::Discarded(DiscardReason::MissingField("indicator_name"));
    }

    let cols = if texts.len() >= 2 {
        IndicatorColumns::for_row(row, texts.len())
    } else {
        IndicatorColumns::default()
    };
    let cell = |col: Option<usize>| col.and_then(|i| texts.get(i)).filter(|t| !t.is_empty());

    let value_text = cell(cols.value).cloned().unwrap_or(single_value);
    if value_text.is_empty() {
        return RowOutcome::Discarded(DiscardReason::MissingField("value"));
    }

    let name = aliases.canonicalize(&raw_name);
    let mut ind = MacroIndicator::new(country, name);
    ind.frequency = frequency_for(&ind.indicator_name);
    ind.value = parse_indicator_value(&value_text);
    ind.previous = cell(cols.previous)
        .and_then(|t| parse_number(t).or_else(|| parse_indicator_value(t)))
        .or_else(|| parse_previous(&value_text));
    ind.forecast = cell(cols.forecast).and_then(|t| parse_indicator_value(t));
    ind.unit = cell(cols.unit)
        .cloned()
        .unwrap_or_else(|| infer_unit(&value_text).to_string());
    ind.period = cell(cols.period).cloned();
    if let (Some(actual), Some(forecast)) = (ind.value, ind.forecast) {
        ind.actual = Some(ActualVsForecast::classify(actual, forecast));
    }

    match validate_indicator(ind) {
        Ok(ind) => RowOutcome::Accepted(ind),
        Err(e) => RowOutcome::Discarded(DiscardReason::Rejected(e.to_string())),
    }
}

/// Indicator names from the first row of a matrix table, country column dropped.
fn matrix_header(table: ElementRef<'_>) -> Vec<String> {
    direct_rows(table)
        .first()
        .map(|row| {
            row_cells(*row)
                .into_iter()
                .skip(1)
                .map(element_text)
                .collect()
        })
        .unwrap_or_default()
}

/// One indicator per numeric cell of a matrix country row.
pub fn extract_matrix_row(
    row: ElementRef<'_>,
    aliases: &IndicatorAliases,
) -> Vec<RowOutcome<MacroIndicator>> {
    let texts: Vec<String> = row_cells(row).into_iter().map(element_text).collect();
    if texts.len() < 2 {
        return vec![RowOutcome::Discarded(DiscardReason::InsufficientCells {
            found: texts.len(),
            needed: 2,
        })];
    }
    let Some(country) = CountryCode::from_label(&texts[0]) else {
        return vec![RowOutcome::Discarded(DiscardReason::MissingField("country"))];
    };
    let names = nearest_ancestor(row, &["table"])
        .map(matrix_header)
        .unwrap_or_default();

    texts[1..]
        .iter()
        .zip(names.iter())
        .filter(|(_, name)| !name.is_empty())
        .filter_map(|(text, name)| {
            let value = parse_indicator_value(text)?;
            let mut ind = MacroIndicator::new(country, aliases.canonicalize(name));
            ind.frequency = frequency_for(&ind.indicator_name);
            ind.value = Some(value);
            ind.unit = infer_unit(text).to_string();
            Some(match validate_indicator(ind) {
                Ok(ind) => RowOutcome::Accepted(ind),
                Err(e) => RowOutcome::Discarded(DiscardReason::Rejected(e.to_string())),
            })
        })
        .collect()
}

fn empty_macro_data() -> MacroData {
    CountryCode::ALL.iter().map(|c| (*c, Vec::new())).collect()
}

/// Extracts indicators for every tracked country.
///
/// The returned map always has all 13 keys; countries with nothing found
/// map to an empty list.
pub fn extract_macro(html: &str) -> MacroData {
    let doc = Html::parse_document(html);
    let aliases = aliases::embedded();
    let mut data = empty_macro_data();

    for country in CountryCode::ALL {
        let chain = country_chain(country);
        let Some((strategy, rows)) = chain.locate(&doc) else {
            continue;
        };
        let outcomes = rows
            .into_iter()
            .map(|row| extract_indicator(row, country, aliases));
        let extraction = Extraction::collect(chain.label(), Some(strategy), outcomes);
        data.insert(country, extraction.records);
    }

    if data.values().all(Vec::is_empty) {
        let locator = CountryMatrixLocator;
        let rows = locator.locate(&doc);
        if !rows.is_empty() {
            tracing::debug!("macro: falling back to country matrix ({} rows)", rows.len());
        }
        let outcomes = rows
            .into_iter()
            .flat_map(|row| extract_matrix_row(row, aliases));
        let extraction = Extraction::collect("macro:matrix", Some(locator.name()), outcomes);
        for ind in extraction.records {
            data.entry(ind.country).or_default().push(ind);
        }
    }

    data
}

/// Extracts pages where each country has its own section (`div`, `section`
/// or `article` classed `country`, `nation` or `region`) titled by a heading.
///
/// Only countries with at least one parsed value are present. Rows whose
/// value does not parse are skipped.
pub fn extract_country_sections(html: &str) -> MacroData {
    let doc = Html::parse_document(html);
    let aliases = aliases::embedded();
    let mut data = MacroData::new();

    let (Some(section_sel), Some(title_sel)) = (
        selector("div, section, article"),
        selector("h2, h3, h4, .title, .header"),
    ) else {
        return data;
    };

    let sections: Vec<ElementRef<'_>> = doc
        .select(&section_sel)
        .filter(|el| class_contains(*el, SECTION_KEYWORDS) && !in_excluded_subtree(*el))
        .collect();

    for section in &sections {
        let wraps_other_section = sections.iter().any(|other| {
            other.id() != section.id() && other.ancestors().any(|a| a.id() == section.id())
        });
        if wraps_other_section {
            continue;
        }
        let Some(title) = section.select(&title_sel).next().map(element_text) else {
            continue;
        };
        let Some(country) = CountryCode::from_label(&title) else {
            tracing::debug!("macro: section title {:?} names no tracked country", title);
            continue;
        };

        let outcomes = container_rows(*section)
            .into_iter()
            .map(|row| extract_indicator(row, country, aliases))
            .filter(|outcome| !matches!(outcome, RowOutcome::Accepted(ind) if ind.value.is_none()));
        let extraction = Extraction::collect(&format!("macro:section:{}", country), None, outcomes);
        if !extraction.records.is_empty() {
            data.entry(country).or_default().extend(extraction.records);
        }
    }
    data
}

fn first_value_matching(data: &MacroData, keywords: &[&str]) -> BTreeMap<CountryCode, Option<f64>> {
    data.iter()
        .map(|(country, indicators)| {
            let value = indicators
                .iter()
                .find(|ind| {
                    let name = ind.indicator_name.to_lowercase();
                    keywords.iter().any(|k| name.contains(k))
                })
                .and_then(|ind| ind.value);
            (*country, value)
        })
        .collect()
}

/// GDP reading per country, `None` where no GDP indicator was found.
pub fn gdp_by_country(data: &MacroData) -> BTreeMap<CountryCode, Option<f64>> {
    first_value_matching(data, &["gdp"])
}

pub fn inflation_by_country(data: &MacroData) -> BTreeMap<CountryCode, Option<f64>> {
    first_value_matching(data, &["inflation", "cpi"])
}

pub fn unemployment_by_country(data: &MacroData) -> BTreeMap<CountryCode, Option<f64>> {
    first_value_matching(data, &["unemployment", "jobless"])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[MacroIndicator]) -> Vec<&str> {
        list.iter().map(|i| i.indicator_name.as_str()).collect()
    }

    #[test]
    fn matrix_fallback_reads_header_names() {
        let html = r#"<table>
            <tr><th></th><th>GDP Growth</th><th>Inflation Rate</th></tr>
            <tr><td>United States</td><td>2.4</td><td>3.1</td></tr>
        </table>"#;
        let data = extract_macro(html);
        assert_eq!(data.len(), 13);
        let us = &data[&CountryCode::US];
        assert_eq!(names(us), vec!["GDP Growth", "Inflation Rate"]);
        assert_eq!(us[0].value, Some(2.4));
        assert_eq!(us[0].frequency, Frequency::Quarterly);
        assert_eq!(us[1].value, Some(3.1));
        assert_eq!(us[1].frequency, Frequency::Monthly);
        assert!(data[&CountryCode::UK].is_empty());
    }

    #[test]
    fn matrix_skips_blank_cells_and_unknown_rows() {
        let html = r#"<table>
            <tr><th>Country</th><th>GDP Growth</th><th>Unemployment Rate</th></tr>
            <tr><td>Japan</td><td>0.9</td><td>-</td></tr>
            <tr><td>Atlantis</td><td>9.9</td><td>1.0</td></tr>
            <tr><td>Germany</td><td>-0.2%</td><td>5.9%</td></tr>
        </table>"#;
        let data = extract_macro(html);
        assert_eq!(names(&data[&CountryCode::JP]), vec!["GDP Growth"]);
        assert_eq!(data[&CountryCode::DE][0].value, Some(-0.2));
        assert_eq!(data[&CountryCode::DE][1].value, Some(5.9));
    }

    #[test]
    fn header_match_table_with_extra_columns() {
        let html = r#"<table class="country-table">
            <thead><tr><th>Japan</th><th>Last</th><th>Previous</th><th>Forecast</th><th>Reference</th></tr></thead>
            <tbody>
              <tr><td>CPI Inflation</td><td>2.8%</td><td>2.6</td><td>2.5</td><td>Mar 2025</td></tr>
              <tr><td>Jobless Rate</td><td>2.4%</td><td>2.5</td><td>2.4</td><td>Mar 2025</td></tr>
            </tbody></table>"#;
        let data = extract_macro(html);
        let jp = &data[&CountryCode::JP];
        assert_eq!(names(jp), vec!["Inflation Rate", "Unemployment Rate"]);
        assert_eq!(jp[0].value, Some(2.8));
        assert_eq!(jp[0].previous, Some(2.6));
        assert_eq!(jp[0].forecast, Some(2.5));
        assert_eq!(jp[0].actual, Some(ActualVsForecast::Better));
        assert_eq!(jp[0].period.as_deref(), Some("Mar 2025"));
        assert_eq!(jp[1].actual, Some(ActualVsForecast::Inline));
        assert!(data[&CountryCode::US].is_empty());
    }

    #[test]
    fn proximity_table_after_heading() {
        let html = r#"<div>
            <h2>Canada</h2>
            <table>
              <tr><td>GDP YoY</td><td>1.5 (1.4)</td></tr>
              <tr><td>Trade Balance</td><td>-2.3 CAD billion</td></tr>
            </table>
        </div>"#;
        let data = extract_macro(html);
        let ca = &data[&CountryCode::CA];
        assert_eq!(names(ca), vec!["GDP Growth", "Trade Balance"]);
        assert_eq!(ca[0].previous, Some(1.4));
        assert_eq!(ca[1].value, Some(-2.3));
        assert_eq!(ca[1].unit, "billions");
    }

    #[test]
    fn class_keyword_table_needs_country_tag() {
        let html = r#"
            <table class="macro-table" data-country="BR">
              <tr><td>Interest Rate</td><td>10.75%</td></tr>
            </table>
            <table class="macro-table">
              <tr><td>Interest Rate</td><td>99%</td></tr>
            </table>"#;
        let data = extract_macro(html);
        assert_eq!(data[&CountryCode::BR].len(), 1);
        assert_eq!(data[&CountryCode::BR][0].value, Some(10.75));
        let others: usize = data
            .iter()
            .filter(|(c, _)| **c != CountryCode::BR)
            .map(|(_, v)| v.len())
            .sum();
        assert_eq!(others, 0);
    }

    #[test]
    fn single_cell_rows_split_on_separator() {
        let html = r#"<h3>India</h3><table>
            <tr><td>Manufacturing PMI ...... 58.1</td></tr>
            <tr><td>Retail Sales | 4.2%</td></tr>
            <tr><td>No separator here</td></tr>
        </table>"#;
        let data = extract_macro(html);
        let india = &data[&CountryCode::IN];
        assert_eq!(names(india), vec!["Manufacturing PMI", "Retail Sales"]);
        assert_eq!(india[0].value, Some(58.1));
    }

    #[test]
    fn matrix_table_not_used_per_country() {
        let html = r#"<table>
            <tr><th>Country</th><th>GDP Growth</th></tr>
            <tr><th>United States</th><td>2.4</td></tr>
            <tr><th>France</th><td>1.1</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        assert!(country_chain(CountryCode::US).locate(&doc).is_none());
        let data = extract_macro(html);
        assert_eq!(data[&CountryCode::US].len(), 1);
        assert_eq!(data[&CountryCode::FR][0].value, Some(1.1));
    }

    #[test]
    fn short_codes_need_whole_text() {
        assert!(text_names_country("US", CountryCode::US));
        assert!(!text_names_country("Contact us today", CountryCode::US));
        assert!(text_names_country("Economy of the United States", CountryCode::US));
        assert!(!text_names_country("Russia", CountryCode::US));
    }

    #[test]
    fn frequency_keywords() {
        assert_eq!(frequency_for("GDP Growth"), Frequency::Quarterly);
        assert_eq!(frequency_for("Exports Q3"), Frequency::Quarterly);
        assert_eq!(frequency_for("Annual Inflation"), Frequency::Yearly);
        assert_eq!(frequency_for("Weekly Jobless Claims"), Frequency::Weekly);
        assert_eq!(frequency_for("Interest Rate Today"), Frequency::Daily);
        assert_eq!(frequency_for("Retail Sales"), Frequency::Monthly);
    }

    #[test]
    fn empty_and_malformed_html_keep_all_keys() {
        for html in ["", "<<<>>>", "<table><tr><td>", "<p>nothing here</p>"] {
            let data = extract_macro(html);
            assert_eq!(data.len(), 13);
            assert!(data.values().all(Vec::is_empty));
        }
    }

    #[test]
    fn country_sections_by_title() {
        let html = r#"<div class="countries-wrapper">
            <section class="country-block"><h3>Spain</h3><table>
              <tr><td>Unemployment Rate</td><td>11.4%</td></tr>
              <tr><td>Outlook</td><td>stable</td></tr>
            </table></section>
            <section class="country-block"><h3>Atlantis</h3><table>
              <tr><td>GDP</td><td>1.0</td></tr>
            </table></section>
            <section class="country-block"><h3>Italy</h3><table>
              <tr><td>GDP Growth Rate</td><td>0.6</td></tr>
            </table></section>
        </div>"#;
        let data = extract_country_sections(html);
        assert_eq!(data.len(), 2);
        assert_eq!(names(&data[&CountryCode::ES]), vec!["Unemployment Rate"]);
        assert_eq!(data[&CountryCode::IT][0].indicator_name, "GDP Growth");
    }

    #[test]
    fn lookup_helpers() {
        let mut data = empty_macro_data();
        let mut gdp = MacroIndicator::new(CountryCode::US, "GDP Growth");
        gdp.value = Some(2.4);
        let mut cpi = MacroIndicator::new(CountryCode::US, "CPI");
        cpi.value = Some(3.1);
        let mut jobless = MacroIndicator::new(CountryCode::UK, "Jobless Rate");
        jobless.value = Some(4.4);
        data.insert(CountryCode::US, vec![gdp, cpi]);
        data.insert(CountryCode::UK, vec![jobless]);

        let gdp = gdp_by_country(&data);
        assert_eq!(gdp.len(), 13);
        assert_eq!(gdp[&CountryCode::US], Some(2.4));
        assert_eq!(gdp[&CountryCode::UK], None);
        assert_eq!(inflation_by_country(&data)[&CountryCode::US], Some(3.1));
        assert_eq!(unemployment_by_country(&data)[&CountryCode::UK], Some(4.4));
    }
}
