//! Error types for breaker construction and guarded execution

use std::fmt;
use thiserror::Error;

/// Why a call was turned away without reaching the protected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Breaker is open and the open-state timeout has not elapsed
    Open,
    /// Breaker is half-open and another probe is still outstanding
    ProbeInFlight,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Open => write!(f, "breaker open"),
            RejectReason::ProbeInFlight => write!(f, "probe already in flight"),
        }
    }
}

/// Outcome of a guarded call that did not produce a value.
///
/// `Rejected` means the operation was never invoked. `Failed` carries the
/// operation's own error untouched so callers can still inspect it.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    #[error("call to '{breaker}' rejected: {reason}")]
    Rejected {
        breaker: String,
        reason: RejectReason,
    },

    #[error("operation failed: {0}")]
    Failed(E),
}

impl<E> BreakerError<E> {
    /// True if the breaker refused the call without running it
    pub fn is_rejected(&self) -> bool {
        matches!(self, BreakerError::Rejected { .. })
    }

    /// The underlying operation error, if the operation actually ran
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Failed(e) => Some(e),
            BreakerError::Rejected { .. } => None,
        }
    }

    /// Borrow the underlying operation error, if any
    pub fn inner(&self) -> Option<&E> {
        match self {
            BreakerError::Failed(e) => Some(e),
            BreakerError::Rejected { .. } => None,
        }
    }
}

/// Invalid breaker configuration, caught before the breaker enters service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failure_rate_threshold must be within 0..=100, got {0}")]
    FailureRateThreshold(f64),

    #[error("slow_call_rate_threshold must be within 0..=100, got {0}")]
    SlowCallRateThreshold(f64),

    #[error("window_size must be at least 1")]
    ZeroWindowSize,

    #[error("minimum_calls_before_evaluation must be at least 1")]
    ZeroMinimumCalls,

    #[error(
        "minimum_calls_before_evaluation ({minimum}) exceeds window_size ({window}); the breaker could never trip"
    )]
    MinimumCallsExceedWindow { minimum: usize, window: usize },

    #[error("permitted_probe_calls must be at least 1")]
    ZeroProbeCalls,
}
