//! Runs a full collection: every market panel, the macro page and the news
//! page, each fetched politely and extracted into a [`CollectionReport`].
//!
//! Market categories are fetched concurrently on a `JoinSet` sharing one
//! `Arc<Fetcher>`; macro and news follow as separate stages. A category
//! that fails to fetch becomes a `CategoryError` entry and the run continues.
//! An empty extraction is not an error.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinSet;
use tradingecon_http::{Fetcher, DEFAULT_BASE_URL};
use url::Url;

use crate::error::TradingEconError;
use crate::extract::macro_indicators::{extract_country_sections, extract_macro, MacroData};
use crate::extract::markets::extract_markets;
use crate::extract::news::extract_news_feed;
use crate::models::{CrawlTarget, Domain, MarketCategory, MarketInstrument};
use crate::report::{CollectionReport, NewsFeed, RunMetadata, PIPELINE_VERSION};

pub struct Collector {
    fetcher: Arc<Fetcher>,
    base_url: Url,
}

impl Collector {
    /// Collector for the default site.
    pub fn new(fetcher: Fetcher) -> Result<Self, TradingEconError> {
        Self::with_base_url(fetcher, DEFAULT_BASE_URL)
    }

    /// Collector for another base URL (a mirror, or a mock server in tests).
    pub fn with_base_url(fetcher: Fetcher, base_url: &str) -> Result<Self, TradingEconError> {
        Self::from_shared(Arc::new(fetcher), base_url)
    }

    pub fn from_shared(fetcher: Arc<Fetcher>, base_url: &str) -> Result<Self, TradingEconError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TradingEconError::InvalidInput(format!("Invalid base URL '{}': {}", base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TradingEconError::InvalidInput(format!(
                "Base URL must be http(s): {}",
                base_url
            )));
        }
        Ok(Self { fetcher, base_url })
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn target(&self, domain: Domain) -> Result<CrawlTarget, TradingEconError> {
        CrawlTarget::for_domain(&self.base_url, domain).map_err(|e| {
            let msg = format!("Cannot build URL for {}: {}", domain.label(), e);
            TradingEconError::InvalidInput(msg)
        })
    }

    /// Fetches the page behind a crawl target.
    pub async fn fetch_target(&self, target: &CrawlTarget) -> Result<String, TradingEconError> {
        tracing::debug!("Fetching {} ({})", target.url, target.domain.label());
        Ok(self.fetcher.fetch_url(&target.url).await?)
    }

    /// Fetches and extracts one market panel.
    pub async fn collect_market(
        &self,
        category: MarketCategory,
    ) -> Result<Vec<MarketInstrument>, TradingEconError> {
        let target = self.target(Domain::Market(category))?;
        let html = self.fetch_target(&target).await?;
        Ok(market_records(&html, category))
    }

    /// Fetches every market panel concurrently and stores the results.
    pub async fn collect_markets(&self, report: &mut CollectionReport) {
        let mut join_set = JoinSet::new();

        for category in MarketCategory::ALL {
            let target = match self.target(Domain::Market(category)) {
                Ok(t) => t,
                Err(e) => {
                    report.record_error(category.as_str(), e.to_string());
                    continue;
                }
            };
            let fetcher = Arc::clone(&self.fetcher);
            join_set.spawn(async move {
                let result = fetcher
                    .fetch_url(&target.url)
                    .await
                    .map(|html| market_records(&html, category));
                (category, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((category, Ok(records))) => {
                    *report.market_mut(category) = records;
                }
                Ok((category, Err(e))) => {
                    tracing::error!("{}: {}", category, e);
                    report.record_error(category.as_str(), e.to_string());
                }
                Err(e) => {
                    tracing::error!("Market task failed: {}", e);
                    report.record_error("markets", e.to_string());
                }
            }
        }
    }

    /// Macro indicators for all 13 countries. When no table strategy finds
    /// anything, the page is read as one titled section per country.
    pub async fn collect_macro(&self) -> Result<MacroData, TradingEconError> {
        let target = self.target(Domain::Macro)?;
        let html = self.fetch_target(&target).await?;
        let mut data = extract_macro(&html);
        if data.values().all(Vec::is_empty) {
            let sections = extract_country_sections(&html);
            if !sections.is_empty() {
                tracing::debug!("macro: read {} country sections", sections.len());
                data.extend(sections);
            }
        }
        let total: usize = data.values().map(Vec::len).sum();
        let countries = data.values().filter(|v| !v.is_empty()).count();
        tracing::info!("macro: {} indicators across {} countries", total, countries);
        Ok(data)
    }

    pub async fn collect_news(&self) -> Result<NewsFeed, TradingEconError> {
        let target = self.target(Domain::News)?;
        let html = self.fetch_target(&target).await?;
        let feed = extract_news_feed(&html, &target.url);
        tracing::info!(
            "news: {} headlines, {} earnings, {} dividends",
            feed.market_headlines.len(),
            feed.earnings_announcements.len(),
            feed.dividend_news.len()
        );
        Ok(feed)
    }

    /// An empty report stamped with this collector's configuration.
    pub fn start_report(&self) -> CollectionReport {
        let config = self.fetcher.config();
        CollectionReport::new(RunMetadata {
            scraped_at: Utc::now(),
            duration_seconds: 0.0,
            base_url: self.base_url.to_string(),
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
            rate_limit_delay_secs: config.rate_limit_delay.as_secs_f64(),
            http_timeout_secs: config.timeout.as_secs_f64(),
            pipeline_version: PIPELINE_VERSION.to_string(),
            requests_succeeded: 0,
            requests_failed: 0,
            retries: 0,
            robots_blocked: 0,
        })
    }

    /// Runs every stage, writing into `report` as each completes.
    ///
    /// Dropping the future mid-run leaves finished categories in `report`.
    pub async fn run_into(&self, report: &mut CollectionReport) {
        self.collect_markets(report).await;

        match self.collect_macro().await {
            Ok(data) => report.set_macro(data),
            Err(e) => {
                tracing::error!("macro: {}", e);
                report.record_error(Domain::Macro.label(), e.to_string());
            }
        }

        match self.collect_news().await {
            Ok(feed) => report.news = feed,
            Err(e) => {
                tracing::error!("news: {}", e);
                report.record_error(Domain::News.label(), e.to_string());
            }
        }
    }

    /// Stamps run duration and request counters onto the report.
    pub fn finish(&self, report: &mut CollectionReport, started: Instant) {
        let stats = self.fetcher.stats().summary();
        let meta = &mut report.metadata;
        meta.duration_seconds = started.elapsed().as_secs_f64();
        meta.requests_succeeded = stats.succeeded;
        meta.requests_failed = stats.failed;
        meta.retries = stats.retries;
        meta.robots_blocked = stats.blocked;
    }

    /// Runs a full collection.
    pub async fn run(&self) -> CollectionReport {
        let started = Instant::now();
        let mut report = self.start_report();
        self.run_into(&mut report).await;
        self.finish(&mut report, started);
        tracing::info!(
            "Collected {} items with {} errors in {:.1}s",
            report.total_items(),
            report.errors.len(),
            report.metadata.duration_seconds
        );
        report
    }
}

fn market_records(html: &str, category: MarketCategory) -> Vec<MarketInstrument> {
    let extraction = extract_markets(html, category);
    tracing::info!(
        "{}: {} instruments ({} rows discarded, strategy {})",
        category,
        extraction.records.len(),
        extraction.discarded,
        extraction.strategy.as_deref().unwrap_or("none")
    );
    extraction.records
}
