//! Bounded retry policy shared by readiness polling and schema loading.
//!
//! Attempts are numbered from 1. The delay before attempt `n + 1` is
//! `base_delay * backoff_factor^(n - 1)`, capped at `max_delay`. A factor of
//! 1.0 gives the fixed one-second cadence the instance needs by default.
//!
//! Delays go through a [`Sleeper`] so tests can count them instead of waiting.

use std::time::Duration;

use async_trait::async_trait;

/// Attempt ceiling used for readiness polling and schema retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Fixed delay between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Multiplier applied per further attempt; 1.0 keeps the delay fixed.
    pub backoff_factor: f64,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: interval,
            backoff_factor: 1.0,
            max_delay: interval,
        }
    }

    pub fn with_backoff(mut self, factor: f64, max_delay: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_delay = max_delay;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-based), or `None` when
    /// no attempts remain.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempts() {
            return None;
        }
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor > 0.0 {
            self.backoff_factor
        } else {
            1.0
        };
        if factor == 1.0 {
            return Some(self.base_delay);
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * factor.powi(exponent);
        let cap = self.max_delay.max(self.base_delay).as_secs_f64();
        Some(Duration::from_secs_f64(secs.min(cap)))
    }
}

/// Source of wall-clock waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
