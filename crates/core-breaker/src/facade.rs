//! Protected Call Facade: breaker-guarded calls with an explicit fallback
//!
//! This is the only place where a rejection or an operation failure is turned
//! into a usable value. The substitution is never hidden: the caller gets
//! [`Protected::Degraded`] with the original cause attached, not a plain
//! success.
//!
//! # Example
//!
//! ```
//! use tripwire_core_breaker::{BreakerConfig, BreakerRegistry, ProtectedCaller};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let caller = ProtectedCaller::new(BreakerRegistry::new());
//!
//! let price = caller
//!     .call(
//!         "pricing",
//!         BreakerConfig::default(),
//!         || async { Err::<u32, _>("pricing service unavailable") },
//!         |_cause| 0,
//!     )
//!     .await
//!     .unwrap();
//!
//! assert!(price.is_degraded());
//! assert_eq!(price.into_value(), 0);
//! # }
//! ```

use crate::config::BreakerConfig;
use crate::error::{BreakerError, ConfigError};
use crate::registry::BreakerRegistry;
use std::future::Future;
use tracing::debug;

/// Result of a protected call: either the operation's own value, or a
/// fallback value together with the reason the fallback was used
#[derive(Debug)]
pub enum Protected<T, E> {
    /// The protected operation ran and succeeded
    Success(T),
    /// The breaker rejected the call or the operation failed; `value` came
    /// from the fallback
    Degraded { value: T, cause: BreakerError<E> },
}

impl<T, E> Protected<T, E> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Protected::Degraded { .. })
    }

    /// Why the fallback was used, if it was
    pub fn cause(&self) -> Option<&BreakerError<E>> {
        match self {
            Protected::Success(_) => None,
            Protected::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Protected::Success(value) | Protected::Degraded { value, .. } => value,
        }
    }

    /// Discard the success/degraded distinction and keep the value
    pub fn into_value(self) -> T {
        match self {
            Protected::Success(value) | Protected::Degraded { value, .. } => value,
        }
    }
}

/// Runs operations through a [`BreakerRegistry`] and applies fallbacks
#[derive(Debug, Clone, Default)]
pub struct ProtectedCaller {
    registry: BreakerRegistry,
}

impl ProtectedCaller {
    pub fn new(registry: BreakerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BreakerRegistry {
        &self.registry
    }

    /// Execute `op` through the breaker registered under `key` (created with
    /// `config` on first use) and fall back on rejection or failure.
    ///
    /// Only an invalid configuration for a not-yet-created breaker is
    /// returned as an error.
    pub async fn call<T, E, F, Fut, FB>(
        &self,
        key: &str,
        config: BreakerConfig,
        op: F,
        fallback: FB,
    ) -> Result<Protected<T, E>, ConfigError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        FB: FnOnce(&BreakerError<E>) -> T,
    {
        let breaker = self.registry.get_or_create(key, config)?;

        Ok(match breaker.execute(op).await {
            Ok(value) => Protected::Success(value),
            Err(cause) => {
                debug!(breaker = key, rejected = cause.is_rejected(), "using fallback");
                let value = fallback(&cause);
                Protected::Degraded { value, cause }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitState;
    use crate::error::RejectReason;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn config() -> BreakerConfig {
        BreakerConfig {
            minimum_calls_before_evaluation: 2,
            window_size: 4,
            open_state_timeout: Duration::from_secs(60),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let caller = ProtectedCaller::default();

        let result = caller
            .call("svc", config(), || async { Ok::<_, String>(5) }, |_| 0)
            .await
            .unwrap();

        assert!(!result.is_degraded());
        assert!(result.cause().is_none());
        assert_eq!(*result.value(), 5);
    }

    #[tokio::test]
    async fn test_failure_uses_fallback_with_cause() {
        let caller = ProtectedCaller::default();

        let result = caller
            .call(
                "svc",
                config(),
                || async { Err::<u32, _>("timeout".to_string()) },
                |cause| {
                    assert_eq!(cause.inner().map(String::as_str), Some("timeout"));
                    99
                },
            )
            .await
            .unwrap();

        assert!(result.is_degraded());
        assert!(matches!(result.cause(), Some(BreakerError::Failed(_))));
        assert_eq!(result.into_value(), 99);
    }

    #[tokio::test]
    async fn test_rejection_uses_fallback_without_invoking() {
        let caller = ProtectedCaller::default();
        let invocations = AtomicUsize::new(0);

        for _ in 0..2 {
            let _ = caller
                .call("svc", config(), || async { Err::<u32, _>("down") }, |_| 0)
                .await
                .unwrap();
        }
        let breaker = caller.registry().get("svc").unwrap();
        assert_eq!(breaker.state(), CircuitState::Open);

        let result = caller
            .call(
                "svc",
                config(),
                || async {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, &str>(1)
                },
                |_| 42,
            )
            .await
            .unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        match result {
            Protected::Degraded {
                value,
                cause: BreakerError::Rejected { reason, .. },
            } => {
                assert_eq!(value, 42);
                assert_eq!(reason, RejectReason::Open);
            }
            other => panic!("expected rejected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_config_surfaces() {
        let caller = ProtectedCaller::default();
        let bad = BreakerConfig {
            failure_rate_threshold: 120.0,
            ..config()
        };

        let result = caller
            .call("svc", bad, || async { Ok::<_, String>(1) }, |_| 0)
            .await;

        assert!(matches!(result, Err(ConfigError::FailureRateThreshold(_))));
    }
}
