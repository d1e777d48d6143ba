//! Rate limiting and throttling.
//!
//! Sliding window rate limiter keyed by caller identifier.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::types::RateLimitConfig;

/// Source of "now" for the limiter.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic window tests.
#[cfg(any(test, feature = "test-harness"))]
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-harness"))]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock();
        *now += to_chrono(by);
    }
}

#[cfg(any(test, feature = "test-harness"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Windows beyond chrono's range are clamped to a century.
fn to_chrono(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::days(36_500))
}

/// Upper bound on the timestamps reserved up front per identifier.
const MAX_PREALLOCATED: usize = 1024;

/// Sliding window for tracking requests of one identifier.
#[derive(Debug)]
struct SlidingWindow {
    timestamps: VecDeque<DateTime<Utc>>,
}

impl SlidingWindow {
    fn new(capacity: usize) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(capacity),
        }
    }

    /// Drop the time-ordered prefix older than `window_start`.
    fn prune(&mut self, window_start: DateTime<Utc>) {
        while let Some(&ts) = self.timestamps.front() {
            if ts < window_start {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit and record the request if the window has room.
    fn check_and_record(&mut self, now: DateTime<Utc>, window: Duration, max: usize) -> bool {
        self.prune(now - window);

        if self.timestamps.len() >= max {
            return false;
        }

        // Keep the sequence ascending even if the clock steps backwards.
        let ts = match self.timestamps.back() {
            Some(&last) if last > now => last,
            _ => now,
        };
        self.timestamps.push_back(ts);
        true
    }
}

/// Rate limiter - enforces request rate limits per identifier.
///
/// Owned by the gateway and shared by `Arc`; never a global. The map guard is
/// released before a window is locked, so distinct identifiers never wait on
/// each other.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    windows: DashMap<String, Arc<Mutex<SlidingWindow>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            window: to_chrono(config.window),
            max_requests: config.max_requests as usize,
            windows: DashMap::new(),
            clock,
        }
    }

    /// Check the limit for an identifier and record the request if allowed.
    pub fn allow(&self, identifier: &str) -> bool {
        let window = self.window_for(identifier);
        let now = self.clock.now();
        let allowed = window
            .lock()
            .check_and_record(now, self.window, self.max_requests);

        if !allowed {
            tracing::debug!(identifier, max = self.max_requests, "rate limit exceeded");
        }
        allowed
    }

    /// Number of requests currently counted in the identifier's window.
    pub fn current_count(&self, identifier: &str) -> usize {
        let Some(window) = self.windows.get(identifier).map(|w| Arc::clone(w.value())) else {
            return 0;
        };
        let now = self.clock.now();
        let mut guard = window.lock();
        guard.prune(now - self.window);
        guard.timestamps.len()
    }

    /// Clear one identifier's window, or every window when `None`.
    pub fn reset(&self, identifier: Option<&str>) {
        match identifier {
            Some(id) => {
                self.windows.remove(id);
            }
            None => self.windows.clear(),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window_ms(&self) -> i64 {
        self.window.num_milliseconds()
    }

    fn window_for(&self, identifier: &str) -> Arc<Mutex<SlidingWindow>> {
        if let Some(existing) = self.windows.get(identifier) {
            return Arc::clone(existing.value());
        }
        let capacity = self.max_requests.min(MAX_PREALLOCATED);
        let entry = self
            .windows
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SlidingWindow::new(capacity))));
        Arc::clone(entry.value())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
