//! Cascading HTML extraction.
//!
//! Each data domain owns a [`StrategyChain`]: an ordered list of
//! [`RowLocator`]s tried until one returns at least one element. Results
//! from different strategies are never merged. The located elements are
//! then turned into records by the domain's field extractor, producing one
//! [`RowOutcome`] per element.

pub mod macro_indicators;
pub mod markets;
pub mod news;

use std::fmt;

use scraper::{ElementRef, Html, Selector};

use crate::numeric::collapse_whitespace;

/// Tags whose subtrees never contribute rows or text.
pub const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

/// One way of finding candidate row elements in a document.
pub trait RowLocator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns candidate elements in document order. Empty means "try the next strategy".
    fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>>;
}

/// Ordered fallback list of row locators.
pub struct StrategyChain {
    label: String,
    strategies: Vec<Box<dyn RowLocator>>,
}

impl StrategyChain {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy; earlier strategies take precedence.
    pub fn then(mut self, strategy: impl RowLocator + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs strategies in order and returns the first non-empty result
    /// along with the name of the strategy that produced it.
    pub fn locate<'a>(&self, doc: &'a Html) -> Option<(&str, Vec<ElementRef<'a>>)> {
        for strategy in &self.strategies {
            let rows = strategy.locate(doc);
            if !rows.is_empty() {
                tracing::debug!(
                    "{}: strategy '{}' matched {} elements",
                    self.label,
                    strategy.name(),
                    rows.len()
                );
                return Some((strategy.name(), rows));
            }
        }
        tracing::debug!("{}: no strategy matched", self.label);
        None
    }
}

/// Why a located row produced no record.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    InsufficientCells { found: usize, needed: usize },
    MissingField(&'static str),
    Rejected(String),
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientCells { found, needed } => {
                write!(f, "row has {} cells, need {}", found, needed)
            }
            Self::MissingField(field) => write!(f, "missing {}", field),
            Self::Rejected(msg) => write!(f, "rejected: {}", msg),
        }
    }
}

/// Per-row extraction result.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Accepted(T),
    Discarded(DiscardReason),
}

impl<T> RowOutcome<T> {
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(v) => Some(v),
            Self::Discarded(_) => None,
        }
    }
}

/// Records extracted from one document plus bookkeeping for logs.
#[derive(Debug, Clone)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub discarded: usize,
    pub strategy: Option<String>,
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            discarded: 0,
            strategy: None,
        }
    }
}

impl<T> Extraction<T> {
    /// Folds row outcomes into an extraction, logging each discard at debug level.
    pub fn collect(
        label: &str,
        strategy: Option<&str>,
        outcomes: impl IntoIterator<Item = RowOutcome<T>>,
    ) -> Self {
        let mut out = Self {
            strategy: strategy.map(str::to_string),
            ..Self::default()
        };
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                RowOutcome::Accepted(record) => out.records.push(record),
                RowOutcome::Discarded(reason) => {
                    tracing::debug!("{}: row {} discarded ({})", label, i, reason);
                    out.discarded += 1;
                }
            }
        }
        out
    }
}

/// Parses a CSS selector, logging and returning `None` if it is invalid.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::error!("Invalid selector {:?}: {}", css, e);
            None
        }
    }
}

/// Whitespace-collapsed text of an element, skipping excluded subtrees.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for node in el.descendants() {
        if let Some(text) = node.value().as_text() {
            let inside_excluded = node
                .ancestors()
                .take_while(|a| a.id() != el.id())
                .filter_map(ElementRef::wrap)
                .any(|a| EXCLUDED_TAGS.contains(&a.value().name()));
            if !inside_excluded {
                parts.push(&**text);
            }
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// True when `el` or any ancestor is an excluded tag.
pub fn in_excluded_subtree(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|a| EXCLUDED_TAGS.contains(&a.value().name()))
}

/// True when any class on `el` contains one of `keywords` (case-insensitive).
pub fn class_contains(el: ElementRef<'_>, keywords: &[&str]) -> bool {
    el.value().classes().any(|class| {
        let lower = class.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    })
}

/// Cells of a row: direct `td`/`th` children of a `tr`, or `.cell`/`.col`
/// descendants of a div-based row.
pub fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    if row.value().name() == "tr" {
        return row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .collect();
    }
    match selector(".cell, .col, td, th") {
        Some(sel) => row.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Text of each direct cell of a row.
pub fn row_cell_texts(row: ElementRef<'_>) -> Vec<String> {
    row_cells(row).into_iter().map(element_text).collect()
}

/// Nearest ancestor with one of the given tag names.
pub fn nearest_ancestor<'a>(el: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| tags.contains(&a.value().name()))
}

/// Data rows of a table: rows with at least one `td`, excluding rows of
/// nested tables.
pub fn table_data_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Some(tr) = selector("tr") else {
        return Vec::new();
    };
    table
        .select(&tr)
        .filter(|row| nearest_ancestor(*row, &["table"]).map(|t| t.id()) == Some(table.id()))
        .filter(|row| row_cells(*row).iter().any(|c| c.value().name() == "td"))
        .collect()
}

/// Header labels of a table: the first row of `thead`, else the first row
/// made only of `th` cells. Labels are lowercase.
pub fn table_header(table: ElementRef<'_>) -> Option<Vec<String>> {
    let tr = selector("tr")?;
    let rows: Vec<_> = table
        .select(&tr)
        .filter(|row| nearest_ancestor(*row, &["table"]).map(|t| t.id()) == Some(table.id()))
        .collect();

    let in_thead = rows
        .iter()
        .find(|row| nearest_ancestor(**row, &["thead"]).is_some());
    let header_row = in_thead.or_else(|| {
        rows.iter().find(|row| {
            let cells = row_cells(**row);
            !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th")
        })
    })?;

    Some(
        row_cells(*header_row)
            .into_iter()
            .map(|c| element_text(c).to_lowercase())
            .collect(),
    )
}
