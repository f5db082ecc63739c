//! Health Evaluator: rolling statistics over a window snapshot
//!
//! [`evaluate`] is a pure function of the snapshot and the configuration. It
//! never trips on sparse data: below `minimum_calls_before_evaluation` the
//! report always says "do not trip", whatever the rates look like.
//!
//! Slow calls only feed the slow-call rate. A slow success is still a success
//! as far as the failure rate is concerned.

use crate::config::BreakerConfig;
use crate::outcome::CallOutcome;

/// Statistics computed from one window snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReport {
    /// Percentage of failed calls in the sample (0.0 - 100.0)
    pub failure_rate: f64,

    /// Percentage of slow calls in the sample (0.0 - 100.0)
    pub slow_call_rate: f64,

    /// Number of failed calls in the sample
    pub failed_calls: usize,

    /// Number of slow calls in the sample
    pub slow_calls: usize,

    /// Number of outcomes the rates were computed over
    pub sample_size: usize,

    /// Whether the breaker should move to OPEN
    pub should_trip: bool,
}

impl HealthReport {
    /// Report for an empty window
    pub fn empty() -> Self {
        Self {
            failure_rate: 0.0,
            slow_call_rate: 0.0,
            failed_calls: 0,
            slow_calls: 0,
            sample_size: 0,
            should_trip: false,
        }
    }
}

/// Compute failure and slow-call rates and the trip decision
pub fn evaluate(snapshot: &[CallOutcome], config: &BreakerConfig) -> HealthReport {
    let sample_size = snapshot.len();
    if sample_size == 0 {
        return HealthReport::empty();
    }

    let failed_calls = snapshot.iter().filter(|o| !o.is_success()).count();
    let slow_calls = snapshot
        .iter()
        .filter(|o| o.is_slower_than(config.slow_call_duration_threshold))
        .count();

    let failure_rate = percentage(failed_calls, sample_size);
    let slow_call_rate = percentage(slow_calls, sample_size);

    let should_trip = sample_size >= config.minimum_calls_before_evaluation
        && (failure_rate >= config.failure_rate_threshold
            || slow_call_rate >= config.slow_call_rate_threshold);

    HealthReport {
        failure_rate,
        slow_call_rate,
        failed_calls,
        slow_calls,
        sample_size,
        should_trip,
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    100.0 * count as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> BreakerConfig {
        BreakerConfig {
            failure_rate_threshold: 50.0,
            slow_call_duration_threshold: Duration::from_millis(100),
            slow_call_rate_threshold: 80.0,
            minimum_calls_before_evaluation: 5,
            window_size: 10,
            ..Default::default()
        }
    }

    fn outcomes(pattern: &str) -> Vec<CallOutcome> {
        pattern
            .chars()
            .map(|c| match c {
                's' => CallOutcome::success(Duration::from_millis(10)),
                'f' => CallOutcome::failure(Duration::from_millis(10)),
                'S' => CallOutcome::success(Duration::from_millis(500)),
                'F' => CallOutcome::failure(Duration::from_millis(500)),
                other => panic!("unknown outcome marker {other}"),
            })
            .collect()
    }

    #[test]
    fn test_empty_window() {
        let report = evaluate(&[], &config());
        assert_eq!(report, HealthReport::empty());
    }

    #[test]
    fn test_half_failures_trip_at_threshold() {
        let report = evaluate(&outcomes("sssssfffff"), &config());
        assert_eq!(report.sample_size, 10);
        assert_eq!(report.failed_calls, 5);
        assert!((report.failure_rate - 50.0).abs() < f64::EPSILON);
        assert!(report.should_trip, "rate equal to threshold trips");
    }

    #[test]
    fn test_below_threshold_does_not_trip() {
        let report = evaluate(&outcomes("ssssssffff"), &config());
        assert!((report.failure_rate - 40.0).abs() < f64::EPSILON);
        assert!(!report.should_trip);
    }

    #[test]
    fn test_insufficient_sample_never_trips() {
        let report = evaluate(&outcomes("ffff"), &config());
        assert!((report.failure_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(report.sample_size, 4);
        assert!(!report.should_trip);
    }

    #[test]
    fn test_slow_successes_only_affect_slow_rate() {
        let report = evaluate(&outcomes("SSSSs"), &config());
        assert_eq!(report.failed_calls, 0);
        assert_eq!(report.failure_rate, 0.0);
        assert_eq!(report.slow_calls, 4);
        assert!((report.slow_call_rate - 80.0).abs() < f64::EPSILON);
        assert!(report.should_trip, "slow-call rate alone trips");
    }

    #[test]
    fn test_slow_failures_count_in_both_rates() {
        let report = evaluate(&outcomes("FFsss"), &config());
        assert_eq!(report.failed_calls, 2);
        assert_eq!(report.slow_calls, 2);
        assert!(!report.should_trip);
    }

    #[test]
    fn test_duration_equal_to_threshold_is_not_slow() {
        let snapshot = vec![CallOutcome::success(Duration::from_millis(100)); 5];
        let report = evaluate(&snapshot, &config());
        assert_eq!(report.slow_calls, 0);
    }
}
