//! Static fetch configuration, read once at startup.

use std::time::Duration;

use crate::user_agent::USER_AGENTS;

/// Default site crawled when no base URL is given.
pub const DEFAULT_BASE_URL: &str = "https://tradingeconomics.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_FACTOR: f64 = 0.5;
const DEFAULT_RATE_LIMIT_SECS: f64 = 5.0;
const DEFAULT_ROBOTS_TTL_SECS: u64 = 3600;

/// Headers sent with every page request, in addition to the rotated User-Agent.
/// Accept-Encoding is left to reqwest so gzip bodies are decoded.
pub const BASE_HEADERS: &[(&str, &str)] = &[
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.5"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
];

/// Politeness and retry settings for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    /// Backoff before retry `n` (0-based) is `backoff_factor * 2^n` seconds.
    pub backoff_factor: f64,
    /// Minimum interval between two requests to the same host.
    pub rate_limit_delay: Duration,
    pub robots_ttl: Duration,
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            rate_limit_delay: Duration::from_secs_f64(DEFAULT_RATE_LIMIT_SECS),
            robots_ttl: Duration::from_secs(DEFAULT_ROBOTS_TTL_SECS),
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FetchConfig {
    /// Builds a config from `TRADINGECON_*` environment variables.
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: Duration::from_secs(env_u64(
                "TRADINGECON_HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
            max_retries: env_u64("TRADINGECON_RETRY_MAX", DEFAULT_MAX_RETRIES as u64) as u32,
            backoff_factor: env_f64("TRADINGECON_BACKOFF_FACTOR", DEFAULT_BACKOFF_FACTOR),
            rate_limit_delay: Duration::from_secs_f64(env_f64(
                "TRADINGECON_RATE_LIMIT_SECS",
                DEFAULT_RATE_LIMIT_SECS,
            )),
            robots_ttl: Duration::from_secs(env_u64(
                "TRADINGECON_ROBOTS_TTL_SECS",
                DEFAULT_ROBOTS_TTL_SECS,
            )),
            user_agents: defaults.user_agents,
        }
    }

    /// Delay slept before retry number `attempt` (0-based).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exp = 1u64 << attempt.min(30);
        Duration::from_secs_f64(self.backoff_factor * exp as f64)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_policy() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.rate_limit_delay, Duration::from_secs(5));
        assert_eq!(cfg.robots_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.user_agents.len(), 5);
    }

    #[test]
    fn backoff_doubles() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.backoff_for_attempt(0), Duration::from_millis(500));
        assert_eq!(cfg.backoff_for_attempt(1), Duration::from_secs(1));
        assert_eq!(cfg.backoff_for_attempt(2), Duration::from_secs(2));
    }

    #[test]
    fn env_fallback_on_garbage() {
        std::env::set_var("TRADINGECON_TEST_GARBAGE_U64", "abc");
        assert_eq!(env_u64("TRADINGECON_TEST_GARBAGE_U64", 7), 7);
        std::env::set_var("TRADINGECON_TEST_NEGATIVE_F64", "-2.0");
        assert_eq!(env_f64("TRADINGECON_TEST_NEGATIVE_F64", 1.5), 1.5);
    }
}
