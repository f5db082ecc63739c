/*!
 * Tripwire - circuit breaking for in-process dependency calls
 *
 * Operator-facing layer over `tripwire-core-breaker`:
 * - TOML configuration of named breakers with shared defaults and presets
 * - Structured logging setup
 * - Scripted replay of call outcomes for inspecting breaker behaviour
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod script;

// Re-export commonly used types
pub use config::{BreakerSettings, LogLevel, LoggingConfig, Preset, TripwireConfig};
pub use error::{Result, TripwireError};
pub use report::{MetricsView, StepOutcome, StepReport};
pub use script::{parse_script, replay, Step};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
