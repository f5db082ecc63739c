//! Breaker Registry: one independent breaker per downstream dependency
//!
//! Each key gets exactly one breaker for the life of the registry. The
//! configuration passed on the first `get_or_create` for a key is the one
//! that breaker keeps; later calls return the existing breaker and ignore
//! whatever configuration they carry. Tripping one key's breaker never
//! affects another's.
//!
//! # Example
//!
//! ```
//! use tripwire_core_breaker::{BreakerConfig, BreakerRegistry, CircuitState};
//!
//! let registry = BreakerRegistry::new();
//!
//! let payments = registry.get_or_create("payments", BreakerConfig::default()).unwrap();
//! let search = registry.get_or_create("search", BreakerConfig::lenient()).unwrap();
//!
//! payments.force_open();
//! assert_eq!(payments.state(), CircuitState::Open);
//! assert_eq!(search.state(), CircuitState::Closed);
//! ```

use crate::circuit_breaker::{BreakerMetrics, CircuitBreaker};
use crate::config::BreakerConfig;
use crate::error::ConfigError;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Keyed collection of circuit breakers, shareable across threads
#[derive(Debug, Clone, Default)]
pub struct BreakerRegistry {
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the breaker for `key`, creating it with `config` if absent.
    ///
    /// Creation happens at most once per key even under concurrent callers.
    /// The configuration is only validated when a breaker is actually created.
    pub fn get_or_create(
        &self,
        key: &str,
        config: BreakerConfig,
    ) -> Result<Arc<CircuitBreaker>, ConfigError> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }

        // The entry holds the shard lock, so concurrent creators share one breaker
        let entry = self
            .breakers
            .entry(key.to_string())
            .or_try_insert_with(|| {
                let breaker = CircuitBreaker::new(key, config)?;
                debug!(breaker = key, "registered circuit breaker");
                Ok(Arc::new(breaker))
            })?;

        Ok(Arc::clone(entry.value()))
    }

    /// Find a breaker by key without creating one
    pub fn get(&self, key: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered keys, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .breakers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Health metrics for every registered breaker
    pub fn snapshot_all(&self) -> BTreeMap<String, BreakerMetrics> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().metrics()))
            .collect()
    }

    /// Force every registered breaker closed
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().force_close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitState;
    use crate::error::BreakerError;
    use std::time::Duration;

    fn config() -> BreakerConfig {
        BreakerConfig {
            minimum_calls_before_evaluation: 3,
            window_size: 5,
            open_state_timeout: Duration::from_secs(60),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let registry = BreakerRegistry::new();

        let first = registry.get_or_create("db", config()).unwrap();
        let second = registry.get_or_create("db", config()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_first_config_wins() {
        let registry = BreakerRegistry::new();

        registry.get_or_create("db", config()).unwrap();
        let again = registry
            .get_or_create("db", BreakerConfig::lenient())
            .unwrap();

        assert_eq!(again.config().window_size, 5);
    }

    #[test]
    fn test_invalid_config_creates_nothing() {
        let registry = BreakerRegistry::new();
        let bad = BreakerConfig {
            permitted_probe_calls: 0,
            ..config()
        };

        assert_eq!(
            registry.get_or_create("db", bad).unwrap_err(),
            ConfigError::ZeroProbeCalls
        );
        assert!(registry.is_empty());
        assert!(registry.get("db").is_none());
    }

    #[test]
    fn test_existing_key_skips_validation() {
        let registry = BreakerRegistry::new();
        let first = registry.get_or_create("db", config()).unwrap();

        let bad = BreakerConfig {
            window_size: 0,
            ..config()
        };
        let again = registry.get_or_create("db", bad).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let registry = BreakerRegistry::new();
        for key in ["search", "auth", "payments"] {
            registry.get_or_create(key, config()).unwrap();
        }
        assert_eq!(registry.names(), vec!["auth", "payments", "search"]);
    }

    #[tokio::test]
    async fn test_bulkhead_isolation() {
        let registry = BreakerRegistry::new();
        let a = registry.get_or_create("serviceA", config()).unwrap();
        let b = registry.get_or_create("serviceB", config()).unwrap();

        for _ in 0..3 {
            let _: Result<(), BreakerError<&str>> = a.execute(|| async { Err("boom") }).await;
        }

        assert_eq!(a.state(), CircuitState::Open);
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.window_snapshot().is_empty());

        let snapshot = registry.snapshot_all();
        assert_eq!(snapshot["serviceA"].state, CircuitState::Open);
        assert_eq!(snapshot["serviceA"].failed_calls, 3);
        assert_eq!(snapshot["serviceB"].sample_size, 0);
    }

    #[test]
    fn test_reset_all() {
        let registry = BreakerRegistry::new();
        let a = registry.get_or_create("a", config()).unwrap();
        let b = registry.get_or_create("b", config()).unwrap();
        a.force_open();
        b.force_open();

        registry.reset_all();

        assert_eq!(a.state(), CircuitState::Closed);
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn test_concurrent_creation_is_at_most_once() {
        let registry = BreakerRegistry::new();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let r = registry.clone();
                std::thread::spawn(move || r.get_or_create("shared", config()).unwrap())
            })
            .collect();

        let breakers: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();

        assert_eq!(registry.len(), 1);
        assert!(breakers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
