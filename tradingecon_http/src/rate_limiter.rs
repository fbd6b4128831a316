//! Per-host request pacing.
//!
//! Each host gets a reserved "next slot" instant. Reserving a slot and
//! advancing it happen together under the host's `DashMap` entry lock, so
//! concurrent callers for the same host are spaced at least one interval
//! apart. The sleep happens after the entry lock is released.

use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::{sleep_until, Instant};

/// Minimum-interval limiter keyed by host.
pub struct HostRateLimiter {
    slots: DashMap<String, Instant>,
    interval: Duration,
}

impl HostRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            interval,
        }
    }

    /// Waits until `host` may be requested again and records the request.
    ///
    /// The effective interval is the larger of the configured interval and
    /// `crawl_delay`. Returns how long the caller was suspended.
    pub async fn wait_turn(&self, host: &str, crawl_delay: Option<Duration>) -> Duration {
        let interval = crawl_delay.map_or(self.interval, |d| d.max(self.interval));
        let now = Instant::now();

        let slot = match self.slots.entry(host.to_string()) {
            Entry::Occupied(mut e) => {
                let slot = (*e.get() + interval).max(now);
                e.insert(slot);
                slot
            }
            Entry::Vacant(e) => {
                e.insert(now);
                now
            }
        };

        let wait = slot.saturating_duration_since(now);
        if !wait.is_zero() {
            tracing::debug!("Rate limiting {}: waiting {:.1}s", host, wait.as_secs_f64());
            sleep_until(slot).await;
        }
        wait
    }
}
