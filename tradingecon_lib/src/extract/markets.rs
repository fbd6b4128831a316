//! Market panel extraction (forex, indices, commodities, bonds, crypto,
//! stocks, ETFs, derivatives).
//!
//! Every category runs the same four-step chain, parameterized by a
//! [`MarketProfile`]: panel id, table class keyword, fixed selector list,
//! then a scan of every table row for a known symbol in the first cell.

use std::ops::Range;

use scraper::{ElementRef, Html};

use super::{
    class_contains, element_text, in_excluded_subtree, nearest_ancestor, row_cells, selector,
    table_data_rows, table_header, DiscardReason, Extraction, RowLocator, RowOutcome,
    StrategyChain,
};
use crate::models::{MarketCategory, MarketInstrument};
use crate::numeric::{classify, NumericCell};
use crate::validation::validate_instrument;

/// How a symbol-whitelist scan compares a row's first cell with the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolMatch {
    /// Normalized first cell must equal a listed symbol.
    Exact,
    /// Also accepts month-coded contracts of listed roots (`ESM25`) and
    /// cells containing a listed symbol of three or more characters.
    Contract,
}

/// Where the instrument's symbol comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStyle {
    /// Column 0 holds the symbol, column 1 the name.
    Column,
    /// Column 0 holds a currency pair such as `EUR/USD`.
    Pair,
    /// Column 0 holds a name; the symbol is derived from it.
    Derived,
}

/// Per-category extraction parameters.
#[derive(Debug, Clone)]
pub struct MarketProfile {
    pub category: MarketCategory,
    pub panel_ids: &'static [&'static str],
    pub class_keywords: &'static [&'static str],
    pub fallback_selectors: &'static str,
    pub whitelist: &'static [&'static str],
    pub symbol_match: SymbolMatch,
    pub symbol_style: SymbolStyle,
    /// Columns searched, in order, for the instrument's value.
    pub value_cols: Range<usize>,
    /// Whether a percent-tagged cell may be the value (bond yields).
    pub percent_value: bool,
    /// Largest plausible absolute percent change.
    pub pct_bound: f64,
    /// Change cells at or above this magnitude are ignored.
    pub change_limit: Option<f64>,
    pub max_symbol_len: usize,
    /// Appended to the symbol when the row has no usable name.
    pub name_suffix: Option<&'static str>,
}

pub const ETF_SYMBOLS: &[&str] = &[
    "SPY", "QQQ", "IWM", "VTI", "VOO", "IVV", "DIA", "EEM", "EFA", "VWO", "AGG", "BND", "TLT",
    "SHY", "IEI", "LQD", "VCIT", "VCSH", "HYG", "JNK", "GLD", "SLV", "USO", "UNG", "DBA", "DBC",
    "GSG", "CRB", "PDBC",
];

pub const DERIVATIVE_SYMBOLS: &[&str] = &[
    "VIX", "VXST", "VXN", "VXO", "ES", "NQ", "YM", "RTY", "CL", "NG", "GC", "SI", "HG", "ZC",
    "ZS", "ZM", "ZL", "ZB", "ZN", "ZF", "ZT", "ED", "EU", "BP", "CD", "JY", "SF", "AD", "NZD",
    "ESM25", "NQM25", "YMH25", "CLM25", "NGM25", "GCM25", "SPX", "SPY", "QQQ", "IWM",
];

/// Futures roots whose month-coded contracts collapse to the root symbol.
pub const FUTURES_ROOTS: &[&str] = &["ES", "NQ", "YM", "RTY", "CL", "NG", "GC", "SI", "HG"];

const FOREX_SYMBOLS: &[&str] = &[
    "EURUSD", "GBPUSD", "USDJPY", "USDCHF", "AUDUSD", "USDCAD", "NZDUSD", "EURGBP", "EURJPY",
    "GBPJPY", "USDCNY", "USDINR", "USDBRL", "DXY",
];

const INDEX_SYMBOLS: &[&str] = &[
    "US500", "US30", "US100", "SPX", "S&P500", "DOWJONES", "NASDAQ", "NASDAQ100", "DAX",
    "FTSE100", "CAC40", "NIKKEI225", "HANGSENG", "SHANGHAI", "STOXX50", "IBEX35", "FTSEMIB",
    "TSX", "ASX200", "BOVESPA", "SENSEX",
];

const COMMODITY_SYMBOLS: &[&str] = &[
    "GOLD", "SILVER", "CRUDEOIL", "BRENT", "NATURALGAS", "COPPER", "PLATINUM", "PALLADIUM",
    "WHEAT", "CORN", "SOYBEANS", "COFFEE", "SUGAR", "COTTON",
];

const BOND_SYMBOLS: &[&str] = &[
    "US10Y", "US2Y", "US30Y", "UK10Y", "GB10Y", "DE10Y", "JP10Y", "FR10Y", "IT10Y", "ES10Y",
    "CA10Y", "AU10Y", "CN10Y", "IN10Y", "BR10Y",
];

const CRYPTO_SYMBOLS: &[&str] = &[
    "BITCOIN", "BTC", "ETHEREUM", "ETH", "SOLANA", "SOL", "XRP", "BNB", "CARDANO", "ADA",
    "DOGECOIN", "DOGE",
];

const STOCK_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "GOOG", "AMZN", "NVDA", "META", "TSLA", "BRK.B", "JPM", "V",
];

impl MarketProfile {
    pub fn for_category(category: MarketCategory) -> Self {
        let base = Self {
            category,
            panel_ids: &[],
            class_keywords: &[],
            fallback_selectors: "",
            whitelist: &[],
            symbol_match: SymbolMatch::Exact,
            symbol_style: SymbolStyle::Derived,
            value_cols: 1..4,
            percent_value: false,
            pct_bound: 100.0,
            change_limit: None,
            max_symbol_len: 20,
            name_suffix: None,
        };
        match category {
            MarketCategory::Forex => Self {
                panel_ids: &["forex", "currencies"],
                class_keywords: &["forex", "currenc"],
                fallback_selectors: ".forex-row, .fx-row, .currency-item",
                whitelist: FOREX_SYMBOLS,
                symbol_style: SymbolStyle::Pair,
                value_cols: 1..3,
                ..base
            },
            MarketCategory::Indices => Self {
                panel_ids: &["indices", "indexes", "stock-indexes"],
                class_keywords: &["indices", "indexes"],
                fallback_selectors: ".index-row, .index-item, .indices-item",
                whitelist: INDEX_SYMBOLS,
                pct_bound: 10.0,
                ..base
            },
            MarketCategory::Commodities => Self {
                panel_ids: &["commodities"],
                class_keywords: &["commodit"],
                fallback_selectors: ".commodity-row, .commodity-item",
                whitelist: COMMODITY_SYMBOLS,
                ..base
            },
            MarketCategory::Bonds => Self {
                panel_ids: &["bonds", "government-bonds"],
                class_keywords: &["bond", "yield"],
                fallback_selectors: ".bond-row, .bonds-item, .yield-row",
                whitelist: BOND_SYMBOLS,
                value_cols: 1..3,
                percent_value: true,
                ..base
            },
            MarketCategory::Crypto => Self {
                panel_ids: &["crypto", "cryptocurrencies"],
                class_keywords: &["crypto", "coin"],
                fallback_selectors: ".crypto-row, .crypto-item, .coin-row",
                whitelist: CRYPTO_SYMBOLS,
                value_cols: 1..3,
                ..base
            },
            MarketCategory::Stocks => Self {
                panel_ids: &["stocks", "shares"],
                class_keywords: &["stock", "equit"],
                fallback_selectors: ".stock-row, .stock-item, .equity-item",
                whitelist: STOCK_SYMBOLS,
                symbol_style: SymbolStyle::Column,
                value_cols: 2..4,
                ..base
            },
            MarketCategory::Etfs => Self {
                panel_ids: &["etf", "etfs", "exchange-traded-funds"],
                class_keywords: &["etf"],
                fallback_selectors: ".etf-table tbody tr, #etfs tbody tr",
                whitelist: ETF_SYMBOLS,
                symbol_style: SymbolStyle::Column,
                value_cols: 2..4,
                change_limit: Some(50.0),
                max_symbol_len: 10,
                name_suffix: Some("ETF"),
                ..base
            },
            MarketCategory::Derivatives => Self {
                panel_ids: &["futures", "derivatives", "options"],
                class_keywords: &["future", "derivative", "option", "vix", "index-future"],
                fallback_selectors:
                    ".futures-table tbody tr, #futures tbody tr, .derivatives-table tbody tr",
                whitelist: DERIVATIVE_SYMBOLS,
                symbol_match: SymbolMatch::Contract,
                symbol_style: SymbolStyle::Column,
                value_cols: 2..4,
                change_limit: Some(1000.0),
                max_symbol_len: 12,
                name_suffix: Some("Futures"),
                ..base
            },
        }
    }

    /// The four-strategy row chain for this category.
    pub fn chain(&self) -> StrategyChain {
        StrategyChain::new(self.category.as_str())
            .then(PanelIdLocator {
                ids: self.panel_ids,
            })
            .then(TableClassLocator {
                keywords: self.class_keywords,
            })
            .then(SelectorLocator {
                css: self.fallback_selectors,
            })
            .then(SymbolWhitelistLocator {
                symbols: self.whitelist,
                matching: self.symbol_match,
            })
    }

    fn min_cells(&self) -> usize {
        self.value_cols.start + 1
    }
}

/// Rows inside the first element whose id is one of `ids`.
pub struct PanelIdLocator {
    pub ids: &'static [&'static str],
}

impl RowLocator for PanelIdLocator {
    fn name(&self) -> &str {
        "panel-id"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        for id in self.ids {
            let Some(sel) = selector(&format!("#{}", id)) else {
                continue;
            };
            let Some(panel) = doc.select(&sel).next() else {
                continue;
            };
            let rows = panel_rows(panel);
            if !rows.is_empty() {
                return rows;
            }
        }
        Vec::new()
    }
}

/// Rows of every table whose class contains one of `keywords`.
pub struct TableClassLocator {
    pub keywords: &'static [&'static str],
}

impl RowLocator for TableClassLocator {
    fn name(&self) -> &str {
        "table-class"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(sel) = selector("table") else {
            return Vec::new();
        };
        doc.select(&sel)
            .filter(|t| !in_excluded_subtree(*t) && class_contains(*t, self.keywords))
            .flat_map(table_data_rows)
            .collect()
    }
}

/// Rows matching a fixed selector list.
pub struct SelectorLocator {
    pub css: &'static str,
}

impl RowLocator for SelectorLocator {
    fn name(&self) -> &str {
        "selector"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        if self.css.is_empty() {
            return Vec::new();
        }
        let Some(sel) = selector(self.css) else {
            return Vec::new();
        };
        doc.select(&sel)
            .filter(|row| !in_excluded_subtree(*row))
            .collect()
    }
}

/// Any table row whose first cell names a known symbol.
pub struct SymbolWhitelistLocator {
    pub symbols: &'static [&'static str],
    pub matching: SymbolMatch,
}

impl RowLocator for SymbolWhitelistLocator {
    fn name(&self) -> &str {
        "symbol-whitelist"
    }

    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let Some(sel) = selector("table tr") else {
            return Vec::new();
        };
        doc.select(&sel)
            .filter(|row| !in_excluded_subtree(*row))
            .filter(|row| {
                row_cells(*row)
                    .first()
                    .is_some_and(|cell| {
                        let label = normalize_label(&element_text(*cell));
                        symbol_listed(&label, self.symbols, self.matching)
                    })
            })
            .collect()
    }
}

fn panel_rows(panel: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let rows: Vec<_> = match selector("tr") {
        Some(tr) => panel
            .select(&tr)
            .filter(|row| row_cells(*row).iter().any(|c| c.value().name() == "td"))
            .collect(),
        None => Vec::new(),
    };
    if !rows.is_empty() {
        return rows;
    }
    match selector(".row, .data-row") {
        Some(sel) => panel.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Uppercase with spaces and slashes removed, for whitelist comparison.
fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect::<String>()
        .to_uppercase()
}

fn symbol_listed(label: &str, symbols: &[&str], matching: SymbolMatch) -> bool {
    if label.is_empty() {
        return false;
    }
    if symbols.contains(&label) {
        return true;
    }
    match matching {
        SymbolMatch::Exact => false,
        SymbolMatch::Contract => {
            strip_month_code(label) != label
                || symbols
                    .iter()
                    .any(|s| s.len() >= 3 && label.contains(s))
        }
    }
}

/// `ESM25` -> `ES` for known futures roots; other symbols are unchanged.
pub fn strip_month_code(symbol: &str) -> &str {
    for root in FUTURES_ROOTS {
        if let Some(rest) = symbol.strip_prefix(root) {
            let mut chars = rest.chars();
            let month_ok = chars.next().is_some_and(|c| "FGHJKMNQUVXZ".contains(c));
            let digits: String = chars.collect();
            let year_ok = (1..=2).contains(&digits.len())
                && digits.chars().all(|c| c.is_ascii_digit());
            if month_ok && year_ok {
                return root;
            }
        }
    }
    symbol
}

/// Uppercase symbol built from free text: everything after a `:` exchange
/// suffix is dropped, then only `[A-Z0-9-./]` is kept.
pub fn derive_symbol(text: &str, max_len: usize) -> String {
    let head = text.split(':').next().unwrap_or("");
    head.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/'))
        .take(max_len)
        .collect()
}

/// Columns of a numeric row assigned to value, change and percent change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAssignment {
    pub value: f64,
    pub value_col: usize,
    pub change: Option<f64>,
    pub pct_change: Option<f64>,
}

/// Assigns numeric cells to fields.
///
/// - value: first numeric cell within `value_cols` (percent-tagged cells
///   only when `percent_value`).
/// - pct_change: among percent-tagged cells other than the value whose
///   magnitude is within `pct_bound`, the one closest to the row end.
/// - change: first untagged numeric cell after the value, other than the
///   pct cell, below `change_limit`.
///
/// `reserved` columns (header-labelled optional fields) are never used for
/// change or pct_change.
pub fn assign_fields(
    cells: &[Option<NumericCell>],
    reserved: &[bool],
    profile: &MarketProfile,
) -> Option<FieldAssignment> {
    let is_reserved = |i: usize| reserved.get(i).copied().unwrap_or(false);

    let (value_col, value) = profile
        .value_cols
        .clone()
        .filter(|i| *i < cells.len())
        .find_map(|i| match cells[i] {
            Some(c) if !c.is_percent || profile.percent_value => Some((i, c.value)),
            _ => None,
        })?;

    let pct = cells
        .iter()
        .enumerate()
        .rev()
        .filter(|(i, _)| *i != value_col && !is_reserved(*i))
        .find_map(|(i, c)| match c {
            Some(c) if c.is_percent && c.value.abs() <= profile.pct_bound => Some((i, c.value)),
            _ => None,
        });

    let change = cells
        .iter()
        .enumerate()
        .skip(value_col + 1)
        .filter(|(i, _)| Some(*i) != pct.map(|p| p.0) && !is_reserved(*i))
        .find_map(|(_, c)| match c {
            Some(c)
                if !c.is_percent
                    && profile.change_limit.map_or(true, |lim| c.value.abs() < lim) =>
            {
                Some(c.value)
            }
            _ => None,
        });

    Some(FieldAssignment {
        value,
        value_col,
        change,
        pct_change: pct.map(|p| p.1),
    })
}

/// Optional fields located by table header labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HeaderColumns {
    bid: Option<usize>,
    ask: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    open: Option<usize>,
    previous_close: Option<usize>,
}

impl HeaderColumns {
    fn from_labels(labels: &[String]) -> Self {
        let mut cols = Self::default();
        for (i, label) in labels.iter().enumerate() {
            let label = label.trim();
            if label.contains("prev") {
                cols.previous_close.get_or_insert(i);
            } else if label == "bid" {
                cols.bid.get_or_insert(i);
            } else if label == "ask" || label == "offer" {
                cols.ask.get_or_insert(i);
            } else if label.contains("high") {
                cols.high.get_or_insert(i);
            } else if label.contains("low") {
                cols.low.get_or_insert(i);
            } else if label == "open" {
                cols.open.get_or_insert(i);
            }
        }
        cols
    }

    fn reserved(&self, width: usize) -> Vec<bool> {
        let mut out = vec![false; width];
        for i in [
            self.bid,
            self.ask,
            self.high,
            self.low,
            self.open,
            self.previous_close,
        ]
        .into_iter()
        .flatten()
        {
            if i < width {
                out[i] = true;
            }
        }
        out
    }
}

fn header_columns(row: ElementRef<'_>, width: usize) -> HeaderColumns {
    if row.value().name() != "tr" {
        return HeaderColumns::default();
    }
    nearest_ancestor(row, &["table"])
        .and_then(table_header)
        .filter(|labels| labels.len() == width)
        .map(|labels| HeaderColumns::from_labels(&labels))
        .unwrap_or_default()
}

/// Symbol and display name for a row.
fn identify(
    row: ElementRef<'_>,
    cells: &[ElementRef<'_>],
    texts: &[String],
    profile: &MarketProfile,
) -> Result<(String, String), DiscardReason> {
    let first = texts.first().map(String::as_str).unwrap_or("");
    let anchor_text = selector("a")
        .and_then(|a| cells.first().and_then(|c| c.select(&a).next()))
        .map(element_text)
        .filter(|t| !t.is_empty());
    let data_symbol = row
        .value()
        .attr("data-symbol")
        .map(|s| derive_symbol(s, profile.max_symbol_len))
        .filter(|s| !s.is_empty());

    let (symbol, name) = match profile.symbol_style {
        SymbolStyle::Column => {
            let raw = data_symbol
                .or(anchor_text)
                .unwrap_or_else(|| first.to_string());
            let raw = raw.trim().to_uppercase();
            let symbol = strip_month_code(&raw).to_string();
            let name = texts
                .get(1)
                .filter(|n| {
                    !n.is_empty()
                        && !n.eq_ignore_ascii_case(&symbol)
                        && !n.eq_ignore_ascii_case(&raw)
                })
                .cloned()
                .unwrap_or_else(|| match profile.name_suffix {
                    Some(suffix) => format!("{} {}", symbol, suffix),
                    None => symbol.clone(),
                });
            (symbol, name)
        }
        SymbolStyle::Pair => {
            let symbol = data_symbol.unwrap_or_else(|| normalize_label(first));
            (symbol, first.to_string())
        }
        SymbolStyle::Derived => {
            let name = anchor_text.unwrap_or_else(|| first.to_string());
            let symbol =
                data_symbol.unwrap_or_else(|| derive_symbol(&name, profile.max_symbol_len));
            (symbol, name)
        }
    };

    if symbol.is_empty() {
        return Err(DiscardReason::MissingField("symbol"));
    }
    if symbol.chars().count() > profile.max_symbol_len {
        return Err(DiscardReason::Rejected(format!(
            "symbol '{}' longer than {}",
            symbol, profile.max_symbol_len
        )));
    }
    Ok((symbol, name))
}

/// Turns one located row into an instrument.
pub fn extract_instrument(
    row: ElementRef<'_>,
    profile: &MarketProfile,
) -> RowOutcome<MarketInstrument> {
    let cells = row_cells(row);
    if cells.len() < profile.min_cells() {
        return RowOutcome::Discarded(DiscardReason::InsufficientCells {
            found: cells.len(),
            needed: profile.min_cells(),
        });
    }
    let texts: Vec<String> = cells.iter().map(|c| element_text(*c)).collect();

    let (symbol, name) = match identify(row, &cells, &texts, profile) {
        Ok(id) => id,
        Err(reason) => return RowOutcome::Discarded(reason),
    };

    let numeric: Vec<Option<NumericCell>> = texts.iter().map(|t| classify(t)).collect();
    let header = header_columns(row, cells.len());
    let reserved = header.reserved(cells.len());

    let Some(fields) = assign_fields(&numeric, &reserved, profile) else {
        return RowOutcome::Discarded(DiscardReason::MissingField("value"));
    };

    let at = |col: Option<usize>| {
        col.and_then(|i| numeric.get(i).copied().flatten())
            .map(|c| c.value)
    };

    let mut inst = MarketInstrument::new(symbol, name, fields.value, profile.category);
    inst.change = fields.change;
    inst.pct_change = fields.pct_change;
    inst.bid = at(header.bid);
    inst.ask = at(header.ask);
    inst.high = at(header.high);
    inst.low = at(header.low);
    inst.open = at(header.open);
    inst.previous_close = at(header.previous_close);

    match validate_instrument(inst) {
        Ok(inst) => RowOutcome::Accepted(inst),
        Err(e) => RowOutcome::Discarded(DiscardReason::Rejected(e.to_string())),
    }
}

/// Extracts every instrument of `category` from a page.
pub fn extract_markets(html: &str, category: MarketCategory) -> Extraction<MarketInstrument> {
    let profile = MarketProfile::for_category(category);
    let doc = Html::parse_document(html);
    let chain = profile.chain();
    let Some((strategy, rows)) = chain.locate(&doc) else {
        return Extraction::default();
    };
    let outcomes = rows.into_iter().map(|row| extract_instrument(row, &profile));
    Extraction::collect(category.as_str(), Some(strategy), outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(value: f64, is_percent: bool) -> Option<NumericCell> {
        Some(NumericCell { value, is_percent })
    }

    #[test]
    fn assign_value_change_pct() {
        let profile = MarketProfile::for_category(MarketCategory::Forex);
        let cells = vec![None, cell(1.0845, false), cell(0.0012, false), cell(0.11, true)];
        let f = assign_fields(&cells, &[], &profile).unwrap();
        assert_eq!(f.value, 1.0845);
        assert_eq!(f.change, Some(0.0012));
        assert_eq!(f.pct_change, Some(0.11));
    }

    #[test]
    fn pct_prefers_cell_closest_to_end() {
        let profile = MarketProfile::for_category(MarketCategory::Commodities);
        let cells = vec![
            None,
            cell(2010.5, false),
            cell(1.2, true),
            cell(12.4, false),
            cell(0.6, true),
        ];
        let f = assign_fields(&cells, &[], &profile).unwrap();
        assert_eq!(f.pct_change, Some(0.6));
        assert_eq!(f.change, Some(12.4));
    }

    #[test]
    fn index_pct_plausibility_bound() {
        let profile = MarketProfile::for_category(MarketCategory::Indices);
        let cells = vec![None, cell(5000.0, false), cell(0.8, true), cell(25.0, true)];
        let f = assign_fields(&cells, &[], &profile).unwrap();
        assert_eq!(f.pct_change, Some(0.8));
    }

    #[test]
    fn derivative_change_limit() {
        let profile = MarketProfile::for_category(MarketCategory::Derivatives);
        let cells = vec![None, None, cell(5200.0, false), cell(1500.0, false), cell(12.5, false)];
        let f = assign_fields(&cells, &[], &profile).unwrap();
        assert_eq!(f.value, 5200.0);
        assert_eq!(f.change, Some(12.5));
    }

    #[test]
    fn percent_value_only_for_bonds() {
        let cells = vec![None, cell(4.25, true), cell(0.03, false)];
        let bonds = MarketProfile::for_category(MarketCategory::Bonds);
        assert_eq!(assign_fields(&cells, &[], &bonds).unwrap().value, 4.25);
        let forex = MarketProfile::for_category(MarketCategory::Forex);
        assert_eq!(assign_fields(&cells, &[], &forex).unwrap().value, 0.03);
    }

    #[test]
    fn no_numeric_value_is_none() {
        let profile = MarketProfile::for_category(MarketCategory::Crypto);
        assert!(assign_fields(&[None, None, None], &[], &profile).is_none());
    }

    #[test]
    fn reserved_columns_skipped() {
        let profile = MarketProfile::for_category(MarketCategory::Commodities);
        let cells = vec![None, cell(100.0, false), cell(101.0, false), cell(0.5, false)];
        let reserved = vec![false, false, true, false];
        let f = assign_fields(&cells, &reserved, &profile).unwrap();
        assert_eq!(f.change, Some(0.5));
    }

    #[test]
    fn month_codes_collapse_for_known_roots() {
        assert_eq!(strip_month_code("ESM25"), "ES");
        assert_eq!(strip_month_code("CLZ4"), "CL");
        assert_eq!(strip_month_code("VIX"), "VIX");
        assert_eq!(strip_month_code("ESPN"), "ESPN");
    }

    #[test]
    fn derived_symbols_are_charset_clean() {
        assert_eq!(derive_symbol("Crude Oil", 20), "CRUDEOIL");
        assert_eq!(derive_symbol("S&P 500", 20), "SP500");
        assert_eq!(derive_symbol("XAUUSD:CUR", 20), "XAUUSD");
        assert_eq!(derive_symbol("United States 10Y", 8), "UNITEDST");
    }

    #[test]
    fn contract_matching() {
        assert!(symbol_listed("ESM25", DERIVATIVE_SYMBOLS, SymbolMatch::Contract));
        assert!(symbol_listed("VIXW", DERIVATIVE_SYMBOLS, SymbolMatch::Contract));
        assert!(!symbol_listed("FUTURES", DERIVATIVE_SYMBOLS, SymbolMatch::Contract));
        assert!(!symbol_listed("ESM25", ETF_SYMBOLS, SymbolMatch::Exact));
    }

    #[test]
    fn chain_order_is_fixed() {
        let chain = MarketProfile::for_category(MarketCategory::Etfs).chain();
        assert_eq!(
            chain.strategy_names(),
            vec!["panel-id", "table-class", "selector", "symbol-whitelist"]
        );
    }

    #[test]
    fn forex_panel_by_id() {
        let html = r#"<div id="forex"><table><tbody>
            <tr><td>EUR/USD</td><td>1.0845</td><td>0.0012</td><td>0.11%</td></tr>
            <tr><td>GBP/USD</td><td>1.2650</td><td>&minus;0.0030</td><td>(0.24%)</td></tr>
        </tbody></table></div>"#;
        let ex = extract_markets(html, MarketCategory::Forex);
        assert_eq!(ex.strategy.as_deref(), Some("panel-id"));
        assert_eq!(ex.records.len(), 2);
        assert_eq!(ex.records[0].symbol, "EURUSD");
        assert_eq!(ex.records[0].name, "EUR/USD");
        assert_eq!(ex.records[1].change, Some(-0.003));
        assert_eq!(ex.records[1].pct_change, Some(-0.24));
    }

    #[test]
    fn etf_whitelist_fallback() {
        let html = r#"<table><tbody>
            <tr><td><a href="/etf/spy">SPY</a></td><td>SPDR S&amp;P 500 ETF Trust</td><td>478.50</td><td>2.35</td><td>0.49%</td></tr>
            <tr><td>XYZ</td><td>Not an ETF</td><td>1.00</td><td>0.1</td><td>1%</td></tr>
        </tbody></table>"#;
        let ex = extract_markets(html, MarketCategory::Etfs);
        assert_eq!(ex.strategy.as_deref(), Some("symbol-whitelist"));
        assert_eq!(ex.records.len(), 1);
        let spy = &ex.records[0];
        assert_eq!(spy.symbol, "SPY");
        assert_eq!(spy.name, "SPDR S&P 500 ETF Trust");
        assert_eq!(spy.value, 478.50);
        assert_eq!(spy.change, Some(2.35));
        assert_eq!(spy.pct_change, Some(0.49));
    }

    #[test]
    fn etf_name_falls_back_to_symbol() {
        let html = r#"<table class="etf-list"><tbody>
            <tr><td>QQQ</td><td></td><td>405.20</td><td>5.80</td><td>1.45%</td></tr>
        </tbody></table>"#;
        let ex = extract_markets(html, MarketCategory::Etfs);
        assert_eq!(ex.strategy.as_deref(), Some("table-class"));
        assert_eq!(ex.records[0].name, "QQQ ETF");
    }

    #[test]
    fn derivative_month_code_and_default_name() {
        let html = r#"<table class="futures-table"><tbody>
            <tr><td>ESM25</td><td>ESM25</td><td>5,210.25</td><td>+12.50</td><td>0.24%</td></tr>
        </tbody></table>"#;
        let ex = extract_markets(html, MarketCategory::Derivatives);
        let es = &ex.records[0];
        assert_eq!(es.symbol, "ES");
        assert_eq!(es.name, "ES Futures");
        assert_eq!(es.value, 5210.25);
        assert_eq!(es.change, Some(12.5));
    }

    #[test]
    fn header_fills_optional_fields_and_triggers_consistency() {
        let html = r#"<table class="commodity-table">
            <thead><tr><th>Name</th><th>Price</th><th>Change</th><th>%</th><th>Prev Close</th><th>High</th></tr></thead>
            <tbody>
              <tr><td>Gold</td><td>100.25</td><td>0.25</td><td>0.25%</td><td>100.00</td><td>101</td></tr>
              <tr><td>Silver</td><td>100.25</td><td>0.25</td><td>0.30%</td><td>100.00</td><td>101</td></tr>
            </tbody></table>"#;
        let ex = extract_markets(html, MarketCategory::Commodities);
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.discarded, 1);
        let gold = &ex.records[0];
        assert_eq!(gold.symbol, "GOLD");
        assert_eq!(gold.previous_close, Some(100.0));
        assert_eq!(gold.high, Some(101.0));
    }

    #[test]
    fn short_rows_discarded() {
        let html = r#"<div id="crypto"><table><tr><td>Bitcoin</td></tr></table></div>"#;
        let ex = extract_markets(html, MarketCategory::Crypto);
        assert!(ex.records.is_empty());
        assert_eq!(ex.discarded, 1);
    }

    #[test]
    fn empty_and_malformed_html_yield_nothing() {
        for html in ["", "<<<>>>", "<table><tr><td>", "\u{0}\u{1}garbage"] {
            for category in MarketCategory::ALL {
                assert!(extract_markets(html, category).records.is_empty());
            }
        }
    }
}
