use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Fixed-window request counter keyed by caller identity (usually client IP,
/// optionally scoped per route group, e.g. `upload:1.2.3.4`).
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u64,
    pub retry_after: Option<Duration>,
}

struct Window {
    started: Instant,
    hits: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(&self, key: &str, limit: u64, window: Duration) -> RateDecision {
        if limit == 0 {
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(window),
            };
        }

        let mut windows = self.windows.lock().await;
        let entry = windows.entry(key.to_string()).or_insert_with(|| Window {
            started: Instant::now(),
            hits: 0,
        });

        if entry.started.elapsed() >= window {
            entry.started = Instant::now();
            entry.hits = 0;
        }

        entry.hits += 1;
        if entry.hits > limit {
            let retry_after = window.saturating_sub(entry.started.elapsed());
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(retry_after),
            };
        }

        RateDecision {
            allowed: true,
            remaining: limit.saturating_sub(entry.hits),
            retry_after: None,
        }
    }

    /// Drop windows whose period has fully elapsed. Called opportunistically;
    /// the limiter is correct without it, this just bounds memory.
    pub async fn prune(&self, window: Duration) {
        let mut windows = self.windows.lock().await;
        windows.retain(|_, entry| entry.started.elapsed() < window);
    }
}
