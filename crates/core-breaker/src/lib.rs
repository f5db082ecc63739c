//! Tripwire Core Breaker: circuit breaking with sliding-window health evaluation
//!
//! # Overview
//!
//! This crate decides, per logical call-site, whether to attempt an
//! operation, reject it immediately, or probe whether a failed dependency has
//! recovered. It includes:
//!
//! - **Sliding Window**: bounded, thread-safe ring of recent call outcomes
//! - **Health Evaluator**: failure-rate and slow-call-rate statistics with a trip decision
//! - **Circuit Breaker**: CLOSED / OPEN / HALF_OPEN state machine around any async operation
//! - **Breaker Registry**: one independently tripping breaker per dependency (bulkhead isolation)
//! - **Protected Call Facade**: explicit, visible fallback on rejection or failure
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - What the protected operation does (database, payment API, RPC)
//! - Transports, retries, or load balancing
//!
//! No background tasks are spawned. Time-based transitions are evaluated
//! lazily on the next call.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Your Application                │
//! └─────────────┬───────────────────────────┘
//!               │  call(key, op, fallback)
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Protected Call Facade             │  ← Fallback on reject/failure
//! └─────────────┬───────────────────────────┘
//!               │  get_or_create(key)
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Breaker Registry                  │  ← One breaker per dependency
//! └─────────────┬───────────────────────────┘
//!               │  execute(op)
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Circuit Breaker                   │  ← Admit / reject / probe
//! │  (Sliding Window + Health Evaluator)    │
//! └─────────────┬───────────────────────────┘
//!               │
//!               ▼
//!         Protected Operation
//!       (database, payment call)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use tripwire_core_breaker::{BreakerConfig, BreakerRegistry, BreakerError};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = BreakerRegistry::new();
//!
//! let config = BreakerConfig {
//!     failure_rate_threshold: 50.0,
//!     minimum_calls_before_evaluation: 5,
//!     window_size: 10,
//!     open_state_timeout: Duration::from_secs(30),
//!     ..Default::default()
//! };
//!
//! let breaker = registry.get_or_create("payments", config)?;
//!
//! match breaker.execute(|| async { Ok::<_, std::io::Error>("charged") }).await {
//!     Ok(receipt) => println!("{}", receipt),
//!     Err(BreakerError::Rejected { .. }) => println!("payments unavailable, try later"),
//!     Err(BreakerError::Failed(e)) => println!("payment failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod facade;
pub mod health;
pub mod outcome;
pub mod registry;
pub mod window;

// Re-export main types for convenience
pub use circuit_breaker::{BreakerMetrics, CircuitBreaker, CircuitState};
pub use config::BreakerConfig;
pub use error::{BreakerError, ConfigError, RejectReason};
pub use facade::{Protected, ProtectedCaller};
pub use health::{evaluate, HealthReport};
pub use outcome::CallOutcome;
pub use registry::BreakerRegistry;
pub use window::SlidingWindow;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use tripwire_core_breaker::prelude::*;
/// ```
pub mod prelude {
    pub use super::circuit_breaker::{BreakerMetrics, CircuitBreaker, CircuitState};
    pub use super::config::BreakerConfig;
    pub use super::error::{BreakerError, ConfigError, RejectReason};
    pub use super::facade::{Protected, ProtectedCaller};
    pub use super::registry::BreakerRegistry;
}
