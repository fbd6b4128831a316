//! Library layer for the Trading Economics collector: typed records,
//! cascading HTML extraction, validation, and the collection pipeline.
//!
//! Fetching (robots.txt, rate limiting, retries) lives in `tradingecon_http`
//! and is re-exported here.

pub mod aliases;
pub mod collect;
pub mod error;
pub mod extract;
pub mod models;
pub mod numeric;
pub mod report;
pub mod validation;

pub use tradingecon_http;
pub use tradingecon_http::{FetchConfig, Fetcher, DEFAULT_BASE_URL};

pub use collect::Collector;
pub use error::TradingEconError;
pub use extract::macro_indicators::{
    extract_country_sections, extract_macro, gdp_by_country, inflation_by_country,
    unemployment_by_country, MacroData,
};
pub use extract::markets::extract_markets;
pub use extract::news::{extract_headlines, extract_news_feed};
pub use extract::{DiscardReason, Extraction, RowLocator, RowOutcome, StrategyChain};
pub use models::{
    ActualVsForecast, CountryCode, CrawlTarget, Domain, Frequency, MacroIndicator,
    MarketCategory, MarketInstrument, NewsArticle, Sentiment,
};
pub use report::{CategoryError, CollectionReport, NewsFeed, RunMetadata, INTERRUPTED};
