/*!
 * Serializable views of breaker state for CLI output
 */

use serde::Serialize;
use std::fmt;
use tripwire_core_breaker::{BreakerConfig, BreakerMetrics};

/// What happened to one replayed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// Operation ran and succeeded
    Success,
    /// Operation ran and failed; fallback used
    Failed,
    /// Breaker refused the call; fallback used
    Rejected,
    /// No call, only time passed
    Waited,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepOutcome::Success => "success",
            StepOutcome::Failed => "failed",
            StepOutcome::Rejected => "rejected",
            StepOutcome::Waited => "waited",
        };
        f.pad(label)
    }
}

/// Breaker metrics flattened for printing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub breaker: String,
    pub state: String,
    pub failure_rate: f64,
    pub slow_call_rate: f64,
    pub sample_size: usize,
    pub failed_calls: usize,
    pub slow_calls: usize,
    pub total_calls: u64,
    pub rejected_calls: u64,
}

impl From<&BreakerMetrics> for MetricsView {
    fn from(metrics: &BreakerMetrics) -> Self {
        Self {
            breaker: metrics.name.clone(),
            state: metrics.state.to_string(),
            failure_rate: metrics.failure_rate,
            slow_call_rate: metrics.slow_call_rate,
            sample_size: metrics.sample_size,
            failed_calls: metrics.failed_calls,
            slow_calls: metrics.slow_calls,
            total_calls: metrics.total_calls,
            rejected_calls: metrics.rejected_calls,
        }
    }
}

/// One line of replay output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: String,
    pub outcome: StepOutcome,
    pub degraded: bool,
    pub metrics: MetricsView,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        write!(
            f,
            "#{:<3} {:<10} {:<8} state={:<9} failure={:>5.1}% slow={:>5.1}% window={} total={} rejected={}",
            self.step,
            self.action,
            self.outcome,
            m.state,
            m.failure_rate,
            m.slow_call_rate,
            m.sample_size,
            m.total_calls,
            m.rejected_calls,
        )
    }
}

/// Resolved breaker settings, one line per breaker
pub fn describe_config(name: &str, config: &BreakerConfig) -> String {
    format!(
        "{}: failure>={}% slow>{}ms@{}% min_calls={} window={} open_timeout={}ms probes={}",
        name,
        config.failure_rate_threshold,
        config.slow_call_duration_threshold.as_millis(),
        config.slow_call_rate_threshold,
        config.minimum_calls_before_evaluation,
        config.window_size,
        config.open_state_timeout.as_millis(),
        config.permitted_probe_calls,
    )
}
