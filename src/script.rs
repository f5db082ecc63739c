/*!
 * Replay scripts: scripted call outcomes driven through a breaker
 *
 * A script is a comma or whitespace separated list of steps:
 *
 * - `ok`        a call that succeeds immediately
 * - `fail`      a call that fails immediately
 * - `slow`      a call that succeeds just after the slow-call threshold
 * - `wait=<ms>` no call, let time pass
 *
 * Any step may be repeated with a `*N` suffix, e.g. `ok*5, fail*5, wait=30000, ok`.
 */

use std::time::Duration;
use tracing::info;
use tripwire_core_breaker::{BreakerConfig, BreakerError, ConfigError, Protected, ProtectedCaller};

use crate::error::{Result, TripwireError};
use crate::report::{MetricsView, StepOutcome, StepReport};

/// Upper bound on the number of steps a script may expand to
pub const MAX_STEPS: usize = 100_000;

/// One scripted action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ok,
    Fail,
    Slow,
    Wait(Duration),
}

impl Step {
    pub fn label(&self) -> String {
        match self {
            Step::Ok => "ok".to_string(),
            Step::Fail => "fail".to_string(),
            Step::Slow => "slow".to_string(),
            Step::Wait(d) => format!("wait={}", d.as_millis()),
        }
    }
}

/// Parse a script into individual steps, expanding repeats
pub fn parse_script(script: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    for token in script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (body, repeat) = match token.split_once('*') {
            Some((body, count)) => {
                let count: usize = count.parse().map_err(|_| {
                    TripwireError::Script(format!("bad repeat count in '{}'", token))
                })?;
                (body, count)
            }
            None => (token, 1),
        };

        let step = parse_step(body)?;
        match steps.len().checked_add(repeat) {
            Some(total) if total <= MAX_STEPS => {}
            _ => {
                return Err(TripwireError::Script(format!(
                    "too many steps in '{}' (limit is {})",
                    token, MAX_STEPS
                )))
            }
        }
        steps.extend(std::iter::repeat_n(step, repeat));
    }

    if steps.is_empty() {
        return Err(TripwireError::Script("script contains no steps".to_string()));
    }

    Ok(steps)
}

fn parse_step(body: &str) -> Result<Step> {
    match body.to_ascii_lowercase().as_str() {
        "ok" => Ok(Step::Ok),
        "fail" => Ok(Step::Fail),
        "slow" => Ok(Step::Slow),
        other => {
            let ms = other
                .strip_prefix("wait=")
                .ok_or_else(|| TripwireError::Script(format!("unknown step '{}'", body)))?;
            let ms: u64 = ms
                .parse()
                .map_err(|_| TripwireError::Script(format!("bad wait duration in '{}'", body)))?;
            Ok(Step::Wait(Duration::from_millis(ms)))
        }
    }
}

/// Drive `steps` through the breaker registered under `name`, reporting after
/// each step. Calls go through the protected-call facade, so rejections and
/// failures come back as degraded results rather than errors.
pub async fn replay<F>(
    caller: &ProtectedCaller,
    name: &str,
    config: &BreakerConfig,
    steps: &[Step],
    mut on_step: F,
) -> Result<Vec<StepReport>>
where
    F: FnMut(&StepReport),
{
    let to_breaker_error = |source: ConfigError| TripwireError::Breaker {
        name: name.to_string(),
        source,
    };

    let breaker = caller
        .registry()
        .get_or_create(name, config.clone())
        .map_err(to_breaker_error)?;
    let slow_delay = breaker.config().slow_call_duration_threshold + Duration::from_millis(1);
    info!(breaker = name, steps = steps.len(), "replaying script");

    let mut reports = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let (outcome, degraded) = match *step {
            Step::Wait(duration) => {
                tokio::time::sleep(duration).await;
                (StepOutcome::Waited, false)
            }
            Step::Ok | Step::Fail | Step::Slow => {
                let result = caller
                    .call(
                        name,
                        config.clone(),
                        || scripted_call(*step, slow_delay),
                        |_| (),
                    )
                    .await
                    .map_err(to_breaker_error)?;
                classify(&result)
            }
        };

        let report = StepReport {
            step: index + 1,
            action: step.label(),
            outcome,
            degraded,
            metrics: MetricsView::from(&breaker.metrics()),
        };
        on_step(&report);
        reports.push(report);
    }

    Ok(reports)
}

async fn scripted_call(step: Step, slow_delay: Duration) -> std::result::Result<(), String> {
    match step {
        Step::Fail => Err("scripted failure".to_string()),
        Step::Slow => {
            tokio::time::sleep(slow_delay).await;
            Ok(())
        }
        _ => Ok(()),
    }
}

fn classify(result: &Protected<(), String>) -> (StepOutcome, bool) {
    match result.cause() {
        None => (StepOutcome::Success, false),
        Some(BreakerError::Rejected { .. }) => (StepOutcome::Rejected, true),
        Some(BreakerError::Failed(_)) => (StepOutcome::Failed, true),
    }
}
