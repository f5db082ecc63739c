//! Breaker configuration
//!
//! A [`BreakerConfig`] is fixed once a breaker is constructed. Breakers hold it
//! behind an `Arc`, so it is shared read-only by every concurrent caller.

use crate::error::ConfigError;
use std::time::Duration;

/// Thresholds and timings for one circuit breaker
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Window failure rate (percent) at or above which the breaker trips
    pub failure_rate_threshold: f64,

    /// Calls taking longer than this are counted as slow
    pub slow_call_duration_threshold: Duration,

    /// Window slow-call rate (percent) at or above which the breaker trips
    pub slow_call_rate_threshold: f64,

    /// Outcomes the window must hold before any trip decision is made
    pub minimum_calls_before_evaluation: usize,

    /// Capacity of the sliding window
    pub window_size: usize,

    /// How long an open breaker waits before admitting a probe
    pub open_state_timeout: Duration,

    /// Consecutive successful probes required to close a half-open breaker
    pub permitted_probe_calls: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            slow_call_duration_threshold: Duration::from_secs(60),
            slow_call_rate_threshold: 100.0,
            minimum_calls_before_evaluation: 10,
            window_size: 100,
            open_state_timeout: Duration::from_secs(60),
            permitted_probe_calls: 3,
        }
    }
}

impl BreakerConfig {
    /// Trip early on a small window, recover quickly
    pub fn aggressive() -> Self {
        Self {
            failure_rate_threshold: 25.0,
            slow_call_duration_threshold: Duration::from_secs(2),
            slow_call_rate_threshold: 50.0,
            minimum_calls_before_evaluation: 5,
            window_size: 20,
            open_state_timeout: Duration::from_secs(15),
            permitted_probe_calls: 1,
        }
    }

    /// Tolerate noisy dependencies, demand a longer streak to recover
    pub fn lenient() -> Self {
        Self {
            failure_rate_threshold: 75.0,
            slow_call_duration_threshold: Duration::from_secs(30),
            slow_call_rate_threshold: 100.0,
            minimum_calls_before_evaluation: 20,
            window_size: 200,
            open_state_timeout: Duration::from_secs(120),
            permitted_probe_calls: 5,
        }
    }

    /// Reject configurations that would let a breaker misbehave in service
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_percentage(self.failure_rate_threshold) {
            return Err(ConfigError::FailureRateThreshold(
                self.failure_rate_threshold,
            ));
        }

        if !is_percentage(self.slow_call_rate_threshold) {
            return Err(ConfigError::SlowCallRateThreshold(
                self.slow_call_rate_threshold,
            ));
        }

        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindowSize);
        }

        if self.minimum_calls_before_evaluation == 0 {
            return Err(ConfigError::ZeroMinimumCalls);
        }

        if self.minimum_calls_before_evaluation > self.window_size {
            return Err(ConfigError::MinimumCallsExceedWindow {
                minimum: self.minimum_calls_before_evaluation,
                window: self.window_size,
            });
        }

        if self.permitted_probe_calls == 0 {
            return Err(ConfigError::ZeroProbeCalls);
        }

        Ok(())
    }
}

// NaN fails both comparisons
fn is_percentage(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}
