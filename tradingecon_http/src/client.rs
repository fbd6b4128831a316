//! Politeness-aware page fetcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use url::Url;

use crate::config::{FetchConfig, BASE_HEADERS};
use crate::rate_limiter::HostRateLimiter;
use crate::robots::RobotsPolicyCache;
use crate::user_agent::pick_user_agent;
use crate::Error;

/// Fetches pages over HTTP while honouring robots.txt, a per-host minimum
/// interval, and bounded exponential-backoff retries.
///
/// The robots cache and rate limiter are injected so several fetchers (or
/// tests) can share them. The `reqwest::Client` is built once and reused.
pub struct Fetcher {
    http: reqwest::Client,
    config: FetchConfig,
    robots: Arc<RobotsPolicyCache>,
    limiter: Arc<HostRateLimiter>,
    stats: FetchStats,
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    Done(String),
    Transient(String),
    Fatal(Error),
}

impl Fetcher {
    /// Creates a fetcher with its own robots cache and rate limiter.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = build_http(&config)?;
        let robots = Arc::new(RobotsPolicyCache::new(
            http.clone(),
            config.robots_ttl,
            config.user_agents.clone(),
        ));
        let limiter = Arc::new(HostRateLimiter::new(config.rate_limit_delay));
        Ok(Self::from_parts(http, config, robots, limiter))
    }

    /// Creates a fetcher around an existing robots cache and rate limiter.
    pub fn with_shared(
        config: FetchConfig,
        robots: Arc<RobotsPolicyCache>,
        limiter: Arc<HostRateLimiter>,
    ) -> Result<Self, Error> {
        let http = build_http(&config)?;
        Ok(Self::from_parts(http, config, robots, limiter))
    }

    fn from_parts(
        http: reqwest::Client,
        config: FetchConfig,
        robots: Arc<RobotsPolicyCache>,
        limiter: Arc<HostRateLimiter>,
    ) -> Self {
        Self {
            http,
            config,
            robots,
            limiter,
            stats: FetchStats::default(),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn robots(&self) -> &Arc<RobotsPolicyCache> {
        &self.robots
    }

    pub fn rate_limiter(&self) -> &Arc<HostRateLimiter> {
        &self.limiter
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Fetches `url` and returns the response body.
    pub async fn fetch(&self, url: &str) -> Result<String, Error> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        self.fetch_url(&parsed).await
    }

    /// Fetches an already-parsed URL.
    ///
    /// Order of operations: robots check, rate-limit wait, then up to
    /// `max_retries + 1` attempts. Server errors (5xx) and network errors
    /// are retried with `backoff_factor * 2^attempt` seconds between
    /// attempts; any other non-success status fails immediately.
    pub async fn fetch_url(&self, url: &Url) -> Result<String, Error> {
        let host = host_key(url)?;

        let policy = self.robots.policy_for(url).await;
        if !policy.is_allowed(url.path()) {
            tracing::warn!("robots.txt disallows {}", url);
            self.stats.record_blocked();
            return Err(Error::RobotsBlocked {
                url: url.to_string(),
            });
        }

        self.limiter.wait_turn(&host, policy.crawl_delay()).await;

        let max_retries = self.config.max_retries;
        let mut last = String::new();
        for attempt in 0..=max_retries {
            match self.attempt(url).await {
                Attempt::Done(body) => {
                    self.stats.record_success();
                    return Ok(body);
                }
                Attempt::Fatal(err) => {
                    self.stats.record_failure();
                    return Err(err);
                }
                Attempt::Transient(msg) => {
                    last = msg;
                    if attempt == max_retries {
                        break;
                    }
                    let delay = self.config.backoff_for_attempt(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}): {}, retrying in {:.1}s",
                        url,
                        attempt + 1,
                        max_retries + 1,
                        last,
                        delay.as_secs_f64()
                    );
                    self.stats.record_retry();
                    tokio::time::sleep(delay).await;
                }
            }
        }

        self.stats.record_failure();
        tracing::error!("Giving up on {} after {} attempts: {}", url, max_retries + 1, last);
        Err(Error::RetriesExhausted {
            url: url.to_string(),
            attempts: max_retries + 1,
            last,
        })
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let mut req = self
            .http
            .get(url.clone())
            .header("user-agent", pick_user_agent(&self.config.user_agents));
        for (name, value) in BASE_HEADERS {
            req = req.header(*name, *value);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return Attempt::Transient(format!("network error: {}", e)),
        };

        let status = resp.status();
        if status.is_server_error() {
            return Attempt::Transient(format!("status {}", status.as_u16()));
        }
        if !status.is_success() {
            tracing::error!("Request to {} failed with status {}", url, status);
            return Attempt::Fatal(Error::RequestFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match resp.text().await {
            Ok(body) => Attempt::Done(body),
            Err(e) => Attempt::Transient(format!("failed to read body: {}", e)),
        }
    }
}

fn build_http(config: &FetchConfig) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .gzip(true)
        .build()
        .map_err(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            Error::Client(e)
        })
}

/// Rate-limit key for a URL: host plus explicit port, if any.
fn host_key(url: &Url) -> Result<String, Error> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(format!("{}: missing host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Atomic counters over fetch outcomes.
#[derive(Default)]
pub struct FetchStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
    blocked: AtomicU64,
}

impl FetchStats {
    fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> FetchSummary {
        FetchSummary {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of [`FetchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchSummary {
    pub succeeded: u64,
    pub failed: u64,
    pub retries: u64,
    pub blocked: u64,
}
