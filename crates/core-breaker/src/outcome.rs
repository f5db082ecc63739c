//! Record of one completed call

use std::time::Duration;
use tokio::time::Instant;

/// Immutable result of one attempted operation.
///
/// Created once per completed unit of work and handed to the sliding window,
/// which owns it from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOutcome {
    success: bool,
    duration: Duration,
    recorded_at: Instant,
}

impl CallOutcome {
    pub fn new(success: bool, duration: Duration) -> Self {
        Self {
            success,
            duration,
            recorded_at: Instant::now(),
        }
    }

    pub fn success(duration: Duration) -> Self {
        Self::new(true, duration)
    }

    pub fn failure(duration: Duration) -> Self {
        Self::new(false, duration)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Monotonic time at which the outcome was recorded
    pub fn recorded_at(&self) -> Instant {
        self.recorded_at
    }

    /// Strictly longer than `threshold`
    pub fn is_slower_than(&self, threshold: Duration) -> bool {
        self.duration > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_threshold_is_exclusive() {
        let outcome = CallOutcome::success(Duration::from_millis(100));
        assert!(outcome.is_success());
        assert!(!outcome.is_slower_than(Duration::from_millis(100)));
        assert!(outcome.is_slower_than(Duration::from_millis(99)));
    }
}
