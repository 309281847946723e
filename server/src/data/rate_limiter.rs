//! Fixed-window rate limiter
//!
//! Each client key owns a window that opens on its first request and admits
//! up to `limit` requests until `window` has elapsed. The check, the window
//! reset and the increment for one key all happen inside a single exclusive
//! `DashMap` entry, so concurrent first requests cannot both open a window or
//! over-admit. Different keys live in different shards and never contend.
//!
//! Expired windows are replaced on access; a single sweeper task drops the
//! ones nobody touches again so the table stays bounded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Per-key counter for the current window
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    /// Requests admitted in this window. Never decremented.
    count: u32,
    window_start: Instant,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub admitted: bool,
    pub limit: u32,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// Time until the window closes. Zero when admitted.
    pub retry_after: Duration,
}

pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request from `key` and decide whether to admit it.
    /// Denied requests do not count.
    pub fn allow(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();

        match self.windows.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateWindow {
                    count: 1,
                    window_start: now,
                });
                self.admitted(1)
            }
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                let elapsed = now.saturating_duration_since(state.window_start);

                if elapsed >= self.window {
                    *state = RateWindow {
                        count: 1,
                        window_start: now,
                    };
                    return self.admitted(1);
                }

                if state.count < self.limit {
                    state.count += 1;
                    return self.admitted(state.count);
                }

                RateLimitDecision {
                    admitted: false,
                    limit: self.limit,
                    remaining: 0,
                    retry_after: self.window - elapsed,
                }
            }
        }
    }

    fn admitted(&self, count: u32) -> RateLimitDecision {
        RateLimitDecision {
            admitted: true,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
            retry_after: Duration::ZERO,
        }
    }

    /// Drop every window that has run its full duration
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.window_start) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Spawn the background sweeper. Runs once per window until `shutdown` fires.
    pub fn start_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Rate limit sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::trace!(removed, "Swept expired rate limit windows");
                        }
                    }
                }
            }
        })
    }
}
