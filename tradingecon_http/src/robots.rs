//! robots.txt policies, cached per origin with a time-to-live.
//!
//! The cache fails open: a missing robots.txt, a non-200 answer or a network
//! error all produce an unrestricted policy for that origin.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use url::Url;

use crate::user_agent::pick_user_agent;

/// Parsed robots.txt rules for one origin.
///
/// Rules are collected across all user-agent groups. Only `Disallow`
/// entries affect [`RobotsPolicy::is_allowed`]; `Allow` entries are kept
/// for inspection but never re-permit a disallowed prefix.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    disallowed: BTreeSet<String>,
    allowed: BTreeSet<String>,
    crawl_delay: Option<Duration>,
    fetched_at: Instant,
    ttl: Duration,
}

impl RobotsPolicy {
    /// A policy with no rules.
    pub fn unrestricted(ttl: Duration) -> Self {
        Self {
            disallowed: BTreeSet::new(),
            allowed: BTreeSet::new(),
            crawl_delay: None,
            fetched_at: Instant::now(),
            ttl,
        }
    }

    /// Parses a robots.txt body. Directive names are case-insensitive,
    /// paths keep their case, `#` comments and empty values are ignored.
    pub fn parse(body: &str, ttl: Duration) -> Self {
        let mut policy = Self::unrestricted(ttl);
        for raw in body.lines() {
            let line = raw.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "disallow" if !value.is_empty() => {
                    policy.disallowed.insert(value.to_string());
                }
                "allow" if !value.is_empty() => {
                    policy.allowed.insert(value.to_string());
                }
                "crawl-delay" => match value.parse::<f64>() {
                    Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                        policy.crawl_delay = Some(Duration::from_secs_f64(secs));
                    }
                    _ => tracing::debug!("Ignoring malformed crawl-delay {:?}", value),
                },
                _ => {}
            }
        }
        policy
    }

    /// True unless `path` starts with a disallowed prefix.
    pub fn is_allowed(&self, path: &str) -> bool {
        !self
            .disallowed
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }

    pub fn disallowed(&self) -> &BTreeSet<String> {
        &self.disallowed
    }

    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    pub fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() >= self.ttl
    }
}

/// Shared, per-origin robots.txt cache.
///
/// Each origin maps to a `OnceCell`, so tasks that miss the same origin at
/// once wait on a single robots.txt fetch. An expired cell is swapped for a
/// fresh one under the map's entry lock; the await happens after the lock
/// is released.
pub struct RobotsPolicyCache {
    http: reqwest::Client,
    store: DashMap<String, Arc<OnceCell<Arc<RobotsPolicy>>>>,
    ttl: Duration,
    user_agents: Vec<String>,
}

impl RobotsPolicyCache {
    pub fn new(http: reqwest::Client, ttl: Duration, user_agents: Vec<String>) -> Self {
        Self {
            http,
            store: DashMap::new(),
            ttl,
            user_agents,
        }
    }

    /// Returns the cached policy for `url`'s origin, fetching robots.txt on
    /// a miss or after the entry's TTL has elapsed.
    pub async fn policy_for(&self, url: &Url) -> Arc<RobotsPolicy> {
        let origin = url.origin().ascii_serialization();
        let cell = {
            let mut entry = self
                .store
                .entry(origin.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            if entry.get().is_some_and(|policy| policy.is_expired()) {
                tracing::debug!("robots.txt for {} expired, refetching", origin);
                *entry = Arc::new(OnceCell::new());
            }
            Arc::clone(entry.value())
        };

        let policy = cell
            .get_or_init(|| async { Arc::new(self.fetch_policy(&origin).await) })
            .await;
        Arc::clone(policy)
    }

    async fn fetch_policy(&self, origin: &str) -> RobotsPolicy {
        let robots_url = format!("{}/robots.txt", origin);
        let resp = self
            .http
            .get(&robots_url)
            .header("user-agent", pick_user_agent(&self.user_agents))
            .send()
            .await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Could not fetch {}: {}; assuming no restrictions", robots_url, e);
                return RobotsPolicy::unrestricted(self.ttl);
            }
        };

        let status = resp.status();
        if status.as_u16() == 404 {
            tracing::debug!("No robots.txt at {}", robots_url);
            return RobotsPolicy::unrestricted(self.ttl);
        }
        if status.as_u16() != 200 {
            tracing::warn!("{} returned {}; assuming no restrictions", robots_url, status);
            return RobotsPolicy::unrestricted(self.ttl);
        }

        match resp.text().await {
            Ok(body) => {
                let policy = RobotsPolicy::parse(&body, self.ttl);
                tracing::debug!(
                    "Loaded robots.txt for {}: {} disallow rules",
                    origin,
                    policy.disallowed.len()
                );
                policy
            }
            Err(e) => {
                tracing::warn!("Could not read {}: {}; assuming no restrictions", robots_url, e);
                RobotsPolicy::unrestricted(self.ttl)
            }
        }
    }
}
