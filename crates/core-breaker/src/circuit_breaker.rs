//! Circuit Breaker: per-dependency state machine
//!
//! The breaker decides, per call, whether to run the protected operation,
//! reject it outright, or let it through as a recovery probe. It has three
//! states:
//! - Closed: every call runs; outcomes feed the sliding window and the health
//!   evaluator decides whether to trip
//! - Open: calls are rejected without running until `open_state_timeout`
//!   has elapsed since the breaker opened
//! - HalfOpen: exactly one probe at a time; `permitted_probe_calls`
//!   consecutive successful probes close the breaker, any failed probe
//!   reopens it
//!
//! Time is checked lazily inside [`CircuitBreaker::execute`]; no background
//! task drives transitions.
//!
//! Every transition bumps a generation counter. A call remembers the
//! generation it was admitted under, and its outcome is discarded if the
//! breaker has moved on by the time the call completes.

use crate::config::BreakerConfig;
use crate::error::{BreakerError, ConfigError, RejectReason};
use crate::health::{self, HealthReport};
use crate::outcome::CallOutcome;
use crate::window::SlidingWindow;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// State of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Calls pass through and are recorded
    Closed,
    /// Calls are rejected until the open-state timeout elapses
    Open,
    /// A single probe at a time tests whether the dependency recovered
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        };
        f.pad(label)
    }
}

/// Point-in-time view of a breaker's health
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerMetrics {
    pub name: String,
    pub state: CircuitState,
    /// Failure rate over the current window (percent)
    pub failure_rate: f64,
    /// Slow-call rate over the current window (percent)
    pub slow_call_rate: f64,
    /// Failed outcomes in the current window
    pub failed_calls: usize,
    /// Slow outcomes in the current window
    pub slow_calls: usize,
    /// Outcomes in the current window
    pub sample_size: usize,
    /// Calls admitted to the operation over the breaker's lifetime
    pub total_calls: u64,
    /// Calls rejected without running over the breaker's lifetime
    pub rejected_calls: u64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    last_transition: Instant,
    probe_successes: usize,
    probe_in_flight: bool,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermitKind {
    Closed,
    Probe,
}

/// Admission ticket for one call. A probe permit dropped before completion
/// (the caller's future was cancelled) hands the probe slot back.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    kind: PermitKind,
    generation: u64,
    completed: bool,
}

impl CallPermit<'_> {
    fn complete(mut self, outcome: CallOutcome) {
        self.completed = true;
        self.breaker.on_outcome(self.kind, self.generation, outcome);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed && self.kind == PermitKind::Probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

/// Circuit breaker guarding one downstream dependency
///
/// # Example
/// ```no_run
/// use tripwire_core_breaker::{BreakerConfig, CircuitBreaker};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let breaker = CircuitBreaker::new("inventory-db", BreakerConfig::default())?;
///
/// let rows = breaker
///     .execute(|| async { Ok::<_, std::io::Error>(42) })
///     .await?;
///
/// println!("rows: {}", rows);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: Arc<BreakerConfig>,
    window: SlidingWindow,
    state: Mutex<BreakerState>,
    total_calls: AtomicU64,
    rejected_calls: AtomicU64,
}

impl CircuitBreaker {
    /// Create a closed breaker. Fails if the configuration is invalid.
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_shared_config(name, Arc::new(config))
    }

    /// Create a closed breaker that shares an existing configuration
    pub fn with_shared_config(
        name: impl Into<String>,
        config: Arc<BreakerConfig>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            name: name.into(),
            window: SlidingWindow::new(config.window_size),
            config,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                last_transition: Instant::now(),
                probe_successes: 0,
                probe_in_flight: false,
                generation: 0,
            }),
            total_calls: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state. Does not advance an expired OPEN state; that happens
    /// on the next call.
    pub fn state(&self) -> CircuitState {
        self.lock_state().state
    }

    /// When the breaker last changed state
    pub fn last_transition(&self) -> Instant {
        self.lock_state().last_transition
    }

    /// Consecutive successful probes in the current HALF_OPEN episode
    pub fn probe_successes(&self) -> usize {
        self.lock_state().probe_successes
    }

    /// Copy of the sliding window contents, oldest first
    pub fn window_snapshot(&self) -> Vec<CallOutcome> {
        self.window.snapshot()
    }

    /// Current health statistics and counters
    pub fn metrics(&self) -> BreakerMetrics {
        let (state, report) = {
            let inner = self.lock_state();
            let report = health::evaluate(&self.window.snapshot(), &self.config);
            (inner.state, report)
        };

        BreakerMetrics {
            name: self.name.clone(),
            state,
            failure_rate: report.failure_rate,
            slow_call_rate: report.slow_call_rate,
            failed_calls: report.failed_calls,
            slow_calls: report.slow_calls,
            sample_size: report.sample_size,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
        }
    }

    /// Run `op` under breaker protection. Any `Err` counts as a failure.
    ///
    /// Returns `BreakerError::Rejected` without calling `op` when the breaker
    /// is open (or a probe is already running), and `BreakerError::Failed`
    /// carrying the operation's own error when it ran and failed.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_classifier(op, Result::is_err).await
    }

    /// Like [`execute`](Self::execute), but `is_failure` decides which
    /// results count against the breaker. The result itself is returned
    /// unchanged either way.
    pub async fn execute_with_classifier<T, E, F, Fut, C>(
        &self,
        op: F,
        is_failure: C,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnOnce(&Result<T, E>) -> bool,
    {
        let permit = self.acquire().map_err(|reason| BreakerError::Rejected {
            breaker: self.name.clone(),
            reason,
        })?;

        let started = Instant::now();
        let result = op().await;
        let elapsed = started.elapsed();

        let failed = is_failure(&result);
        permit.complete(CallOutcome::new(!failed, elapsed));

        result.map_err(BreakerError::Failed)
    }

    /// Operator override: open the breaker now and clear its history
    pub fn force_open(&self) {
        let mut inner = self.lock_state();
        warn!(breaker = %self.name, "circuit breaker forced open");
        self.transition(&mut inner, CircuitState::Open, Instant::now());
        self.window.clear();
    }

    /// Operator override: close the breaker now and clear its history
    pub fn force_close(&self) {
        let mut inner = self.lock_state();
        info!(breaker = %self.name, "circuit breaker forced closed");
        self.transition(&mut inner, CircuitState::Closed, Instant::now());
    }

    /// Same as [`force_close`](Self::force_close)
    pub fn reset(&self) {
        self.force_close();
    }

    fn acquire(&self) -> Result<CallPermit<'_>, RejectReason> {
        let mut inner = self.lock_state();
        let now = Instant::now();

        let kind = match inner.state {
            CircuitState::Closed => PermitKind::Closed,
            CircuitState::Open => {
                if now.duration_since(inner.last_transition) < self.config.open_state_timeout {
                    return Err(self.reject(RejectReason::Open));
                }
                self.transition(&mut inner, CircuitState::HalfOpen, now);
                inner.probe_in_flight = true;
                PermitKind::Probe
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    return Err(self.reject(RejectReason::ProbeInFlight));
                }
                inner.probe_in_flight = true;
                PermitKind::Probe
            }
        };

        self.total_calls.fetch_add(1, Ordering::Relaxed);

        Ok(CallPermit {
            breaker: self,
            kind,
            generation: inner.generation,
            completed: false,
        })
    }

    fn reject(&self, reason: RejectReason) -> RejectReason {
        self.rejected_calls.fetch_add(1, Ordering::Relaxed);
        debug!(breaker = %self.name, %reason, "call rejected");
        reason
    }

    fn on_outcome(&self, kind: PermitKind, generation: u64, outcome: CallOutcome) {
        let mut inner = self.lock_state();

        if inner.generation != generation {
            debug!(
                breaker = %self.name,
                state = %inner.state,
                "discarding outcome admitted under an earlier state"
            );
            return;
        }

        match kind {
            PermitKind::Closed => {
                self.window.record(outcome);
                let report = health::evaluate(&self.window.snapshot(), &self.config);
                if report.should_trip {
                    self.log_trip(&report);
                    self.transition(&mut inner, CircuitState::Open, Instant::now());
                }
            }
            PermitKind::Probe => {
                inner.probe_in_flight = false;

                if outcome.is_success() {
                    inner.probe_successes += 1;
                    debug!(
                        breaker = %self.name,
                        successes = inner.probe_successes,
                        required = self.config.permitted_probe_calls,
                        "probe succeeded"
                    );
                    if inner.probe_successes >= self.config.permitted_probe_calls {
                        self.transition(&mut inner, CircuitState::Closed, Instant::now());
                    }
                } else {
                    debug!(breaker = %self.name, "probe failed");
                    self.transition(&mut inner, CircuitState::Open, Instant::now());
                }
            }
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock_state();
        if inner.generation == generation {
            inner.probe_in_flight = false;
            debug!(breaker = %self.name, "probe abandoned before completion");
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState, now: Instant) {
        let from = inner.state;

        inner.state = to;
        inner.last_transition = now;
        inner.generation += 1;
        inner.probe_successes = 0;
        inner.probe_in_flight = false;

        if to == CircuitState::Closed {
            self.window.clear();
        }

        info!(breaker = %self.name, %from, %to, "circuit breaker state transition");
    }

    fn log_trip(&self, report: &HealthReport) {
        warn!(
            breaker = %self.name,
            failure_rate = report.failure_rate,
            slow_call_rate = report.slow_call_rate,
            sample_size = report.sample_size,
            "circuit breaker tripped"
        );
    }

    // State is only ever replaced wholesale by `transition`, so a poisoned lock
    // still holds a consistent value.
    fn lock_state(&self) -> MutexGuard<'_, BreakerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
