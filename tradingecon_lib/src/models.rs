//! Typed records produced by the extraction pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Market panels crawled from the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketCategory {
    Forex,
    Indices,
    Commodities,
    Bonds,
    Crypto,
    Stocks,
    Etfs,
    Derivatives,
}

impl MarketCategory {
    pub const ALL: [MarketCategory; 8] = [
        Self::Forex,
        Self::Indices,
        Self::Commodities,
        Self::Bonds,
        Self::Crypto,
        Self::Stocks,
        Self::Etfs,
        Self::Derivatives,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forex => "forex",
            Self::Indices => "indices",
            Self::Commodities => "commodities",
            Self::Bonds => "bonds",
            Self::Crypto => "crypto",
            Self::Stocks => "stocks",
            Self::Etfs => "etfs",
            Self::Derivatives => "derivatives",
        }
    }

    /// Site path for this category's panel page.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Forex => "/forex",
            Self::Indices => "/indices",
            Self::Commodities => "/commodities",
            Self::Bonds => "/bonds",
            Self::Crypto => "/crypto",
            Self::Stocks => "/stocks",
            Self::Etfs => "/etfs",
            Self::Derivatives => "/derivatives",
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown market category '{}'", s))
    }
}

/// Countries covered by the macro pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CountryCode {
    US,
    UK,
    EU,
    JP,
    CN,
    DE,
    FR,
    IT,
    ES,
    CA,
    AU,
    BR,
    IN,
}

impl CountryCode {
    pub const ALL: [CountryCode; 13] = [
        Self::US,
        Self::UK,
        Self::EU,
        Self::JP,
        Self::CN,
        Self::DE,
        Self::FR,
        Self::IT,
        Self::ES,
        Self::CA,
        Self::AU,
        Self::BR,
        Self::IN,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::US => "US",
            Self::UK => "UK",
            Self::EU => "EU",
            Self::JP => "JP",
            Self::CN => "CN",
            Self::DE => "DE",
            Self::FR => "FR",
            Self::IT => "IT",
            Self::ES => "ES",
            Self::CA => "CA",
            Self::AU => "AU",
            Self::BR => "BR",
            Self::IN => "IN",
        }
    }

    /// Lowercase names the site uses for this country, most specific first.
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            Self::US => &["united states", "usa", "america", "us"],
            Self::UK => &["united kingdom", "great britain", "britain", "uk"],
            Self::EU => &["european union", "euro area", "eurozone", "eu"],
            Self::JP => &["japan"],
            Self::CN => &["china"],
            Self::DE => &["germany"],
            Self::FR => &["france"],
            Self::IT => &["italy"],
            Self::ES => &["spain"],
            Self::CA => &["canada"],
            Self::AU => &["australia"],
            Self::BR => &["brazil"],
            Self::IN => &["india"],
        }
    }

    /// Display name used when searching headers, e.g. `"United States"`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::US => "United States",
            Self::UK => "United Kingdom",
            Self::EU => "Euro Area",
            Self::JP => "Japan",
            Self::CN => "China",
            Self::DE => "Germany",
            Self::FR => "France",
            Self::IT => "Italy",
            Self::ES => "Spain",
            Self::CA => "Canada",
            Self::AU => "Australia",
            Self::BR => "Brazil",
            Self::IN => "India",
        }
    }

    /// Resolves free text (a row label or heading) to a country.
    ///
    /// Full names match as substrings; short codes such as `"us"` or `"uk"`
    /// only match the whole text, so "Russia" never resolves to US.
    pub fn from_label(text: &str) -> Option<CountryCode> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|c| {
            c.names().iter().any(|name| {
                if name.len() <= 3 {
                    lower == *name
                } else {
                    lower.contains(name)
                }
            })
        })
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting frequency of a macro indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}

/// How a released value compares with its forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActualVsForecast {
    Better,
    Worse,
    Inline,
}

impl ActualVsForecast {
    /// Values within 0.01 of the forecast are inline; higher is better.
    pub fn classify(actual: f64, forecast: f64) -> Self {
        let diff = actual - forecast;
        if diff.abs() < 0.01 {
            Self::Inline
        } else if diff > 0.0 {
            Self::Better
        } else {
            Self::Worse
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Bullish,
    Bearish,
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            _ => Err(format!("Invalid sentiment: {}", s)),
        }
    }
}

/// A quoted instrument from one of the market panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInstrument {
    pub symbol: String,
    pub name: String,
    pub value: f64,
    pub change: Option<f64>,
    pub pct_change: Option<f64>,
    pub category: MarketCategory,
    pub timestamp: DateTime<Utc>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
    pub previous_close: Option<f64>,
}

impl MarketInstrument {
    /// A record with only the required fields set.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        value: f64,
        category: MarketCategory,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            value,
            change: None,
            pct_change: None,
            category,
            timestamp: Utc::now(),
            bid: None,
            ask: None,
            high: None,
            low: None,
            open: None,
            previous_close: None,
        }
    }
}

/// One macroeconomic reading for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicator {
    pub country: CountryCode,
    pub indicator_name: String,
    pub value: Option<f64>,
    pub previous: Option<f64>,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub frequency: Frequency,
    pub source: Option<String>,
    pub actual: Option<ActualVsForecast>,
    pub forecast: Option<f64>,
    pub period: Option<String>,
}

impl MacroIndicator {
    pub fn new(country: CountryCode, indicator_name: impl Into<String>) -> Self {
        Self {
            country,
            indicator_name: indicator_name.into(),
            value: None,
            previous: None,
            unit: "%".to_string(),
            timestamp: Utc::now(),
            frequency: Frequency::Monthly,
            source: None,
            actual: None,
            forecast: None,
            period: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub source: Option<String>,
    pub category: Option<String>,
    pub sentiment: Option<Sentiment>,
}

/// What a fetched page is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Market(MarketCategory),
    Macro,
    News,
}

impl Domain {
    /// Label used in logs and in the error list.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Market(c) => c.as_str(),
            Self::Macro => "macro",
            Self::News => "news",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Market(c) => c.path(),
            Self::Macro => "/macro",
            Self::News => "/news",
        }
    }
}

/// A URL to fetch and the domain it will be parsed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    pub domain: Domain,
}

impl CrawlTarget {
    /// Builds the target for `domain` under `base_url`.
    pub fn for_domain(base_url: &Url, domain: Domain) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: base_url.join(domain.path())?,
            domain,
        })
    }
}
