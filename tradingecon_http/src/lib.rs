//! Politeness-aware HTTP fetching: robots.txt compliance, per-host rate
//! limiting, user-agent rotation and bounded retries.

mod client;
pub mod config;
mod errors;
pub mod rate_limiter;
pub mod robots;
mod user_agent;

pub use self::client::{FetchStats, FetchSummary, Fetcher};
pub use self::config::{FetchConfig, DEFAULT_BASE_URL};
pub use self::errors::Error;
pub use self::rate_limiter::HostRateLimiter;
pub use self::robots::{RobotsPolicy, RobotsPolicyCache};
pub use self::user_agent::USER_AGENTS;
