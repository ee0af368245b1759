// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fixed-window per-key rate limiting.
//!
//! One bucket per key: a counter and a reset instant. A bucket whose
//! reset instant has passed is semantically absent: the next consult
//! reinitialises it in the same step. The periodic sweep only reclaims
//! memory; `check_limit` self-heals expired buckets, so correctness
//! never depends on the sweeper running.
//!
//! The read-modify-write in `check_limit` happens inside the map's
//! per-key entry guard, so two concurrent callers can never both observe
//! `count = max - 1` and both increment.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fixed-window quota.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(60_000),
            max_requests: 100,
        }
    }
}

/// Per-key counter state.
#[derive(Debug, Clone, Copy)]
struct RateBucket {
    count: u32,
    reset_at: Instant,
}

/// Outcome of one `check_limit` consult.
#[derive(Debug, Clone, Copy)]
pub struct LimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this consult.
    pub remaining: u32,
    /// When the current window ends.
    pub reset_at: Instant,
}

impl LimitDecision {
    /// Milliseconds until the window resets, measured now.
    pub fn retry_after_ms(&self) -> u64 {
        self.reset_at
            .saturating_duration_since(Instant::now())
            .as_millis() as u64
    }
}

/// Fixed-window per-key rate limiter.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: DashMap<String, RateBucket>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window: config.window,
            max_requests: config.max_requests.max(1),
            buckets: DashMap::new(),
            sweeper: Mutex::new(None),
        }
    }

    /// Consult (and count) one request for `key`.
    pub fn check_limit(&self, key: &str) -> LimitDecision {
        let now = Instant::now();
        let mut entry = self
            .buckets
            .entry(key.to_string())
            .or_insert(RateBucket {
                count: 0,
                reset_at: now + self.window,
            });
        let bucket = entry.value_mut();

        // expired bucket: reset in the same step, not as two operations
        if now >= bucket.reset_at {
            *bucket = RateBucket {
                count: 0,
                reset_at: now + self.window,
            };
        }

        if bucket.count >= self.max_requests {
            return LimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: bucket.reset_at,
            };
        }

        bucket.count += 1;
        LimitDecision {
            allowed: true,
            remaining: self.max_requests - bucket.count,
            reset_at: bucket.reset_at,
        }
    }

    /// Drop the bucket for `key`. Returns whether one was tracked.
    pub fn reset(&self, key: &str) -> bool {
        self.buckets.remove(key).is_some()
    }

    /// Current count for `key`; 0 if untracked or expired.
    pub fn count(&self, key: &str) -> u32 {
        match self.buckets.get(key) {
            Some(bucket) if Instant::now() < bucket.reset_at => bucket.count,
            _ => 0,
        }
    }

    /// Number of buckets currently tracked (expired-but-unswept included).
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    pub fn clear(&self) {
        self.buckets.clear();
    }

    /// Start the periodic sweep of expired buckets, once per window.
    ///
    /// The task holds only a weak reference, so dropping the limiter also
    /// ends the sweep; `destroy` ends it promptly.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let window = self.window;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(window);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(limiter) = weak.upgrade() else { break };
                let now = Instant::now();
                let before = limiter.buckets.len();
                limiter.buckets.retain(|_, bucket| now < bucket.reset_at);
                let swept = before - limiter.buckets.len();
                if swept > 0 {
                    debug!(swept, "rate limiter swept expired buckets");
                }
            }
        });

        let mut sweeper = self.sweeper.lock();
        if let Some(old) = sweeper.replace(handle) {
            old.abort();
        }
    }

    /// Stop the sweeper. Buckets stay; `check_limit` still self-heals.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.destroy();
    }
}
