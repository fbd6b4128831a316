//! The document produced by one collection run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TradingEconError;
use crate::extract::macro_indicators::MacroData;
use crate::models::{CountryCode, MacroIndicator, MarketCategory, MarketInstrument, NewsArticle};

pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error list entry recorded when the run is cut short.
pub const INTERRUPTED: &str = "interrupted";

/// News split into the three buckets of the output document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsFeed {
    pub market_headlines: Vec<NewsArticle>,
    pub earnings_announcements: Vec<NewsArticle>,
    pub dividend_news: Vec<NewsArticle>,
}

impl NewsFeed {
    pub fn len(&self) -> usize {
        self.market_headlines.len() + self.earnings_announcements.len() + self.dividend_news.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A category that could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryError {
    pub category: String,
    pub message: String,
}

impl CategoryError {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub scraped_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub base_url: String,
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub rate_limit_delay_secs: f64,
    pub http_timeout_secs: f64,
    pub pipeline_version: String,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub retries: u64,
    pub robots_blocked: u64,
}

/// Everything collected in one run, including partial results and errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub forex: Vec<MarketInstrument>,
    pub indices: Vec<MarketInstrument>,
    pub commodities: Vec<MarketInstrument>,
    pub bonds: Vec<MarketInstrument>,
    pub crypto: Vec<MarketInstrument>,
    pub stocks: Vec<MarketInstrument>,
    pub etfs: Vec<MarketInstrument>,
    pub derivatives: Vec<MarketInstrument>,
    pub macro_data: BTreeMap<CountryCode, Vec<MacroIndicator>>,
    pub news: NewsFeed,
    pub errors: Vec<CategoryError>,
    pub metadata: RunMetadata,
}

impl CollectionReport {
    /// An empty report with every macro country present.
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            forex: Vec::new(),
            indices: Vec::new(),
            commodities: Vec::new(),
            bonds: Vec::new(),
            crypto: Vec::new(),
            stocks: Vec::new(),
            etfs: Vec::new(),
            derivatives: Vec::new(),
            macro_data: CountryCode::ALL.iter().map(|c| (*c, Vec::new())).collect(),
            news: NewsFeed::default(),
            errors: Vec::new(),
            metadata,
        }
    }

    pub fn market(&self, category: MarketCategory) -> &[MarketInstrument] {
        match category {
            MarketCategory::Forex => &self.forex,
            MarketCategory::Indices => &self.indices,
            MarketCategory::Commodities => &self.commodities,
            MarketCategory::Bonds => &self.bonds,
            MarketCategory::Crypto => &self.crypto,
            MarketCategory::Stocks => &self.stocks,
            MarketCategory::Etfs => &self.etfs,
            MarketCategory::Derivatives => &self.derivatives,
        }
    }

    pub fn market_mut(&mut self, category: MarketCategory) -> &mut Vec<MarketInstrument> {
        match category {
            MarketCategory::Forex => &mut self.forex,
            MarketCategory::Indices => &mut self.indices,
            MarketCategory::Commodities => &mut self.commodities,
            MarketCategory::Bonds => &mut self.bonds,
            MarketCategory::Crypto => &mut self.crypto,
            MarketCategory::Stocks => &mut self.stocks,
            MarketCategory::Etfs => &mut self.etfs,
            MarketCategory::Derivatives => &mut self.derivatives,
        }
    }

    /// Replaces the macro map, keeping all 13 country keys.
    pub fn set_macro(&mut self, data: MacroData) {
        for country in CountryCode::ALL {
            self.macro_data.entry(country).or_default();
        }
        for (country, indicators) in data {
            self.macro_data.insert(country, indicators);
        }
    }

    pub fn record_error(&mut self, category: impl Into<String>, message: impl Into<String>) {
        self.errors.push(CategoryError::new(category, message));
    }

    pub fn total_items(&self) -> usize {
        let markets: usize = MarketCategory::ALL.iter().map(|c| self.market(*c).len()).sum();
        let macro_count: usize = self.macro_data.values().map(Vec::len).sum();
        markets + macro_count + self.news.len()
    }

    /// Record counts per category, in output order.
    pub fn summary(&self) -> Vec<(String, usize)> {
        let mut rows: Vec<(String, usize)> = MarketCategory::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), self.market(*c).len()))
            .collect();
        rows.push((
            "macro".to_string(),
            self.macro_data.values().map(Vec::len).sum(),
        ));
        rows.push(("market_headlines".to_string(), self.news.market_headlines.len()));
        rows.push((
            "earnings_announcements".to_string(),
            self.news.earnings_announcements.len(),
        ));
        rows.push(("dividend_news".to_string(), self.news.dividend_news.len()));
        rows
    }

    /// The report as pretty-printed JSON, the form written to disk.
    pub fn to_json(&self) -> Result<String, TradingEconError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
