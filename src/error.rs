/*!
 * Error types for Tripwire
 */

use thiserror::Error;
use tripwire_core_breaker::ConfigError;

pub type Result<T> = std::result::Result<T, TripwireError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

#[derive(Debug, Error)]
pub enum TripwireError {
    /// Configuration file or logging setup problem
    #[error("configuration error: {0}")]
    Config(String),

    /// A named breaker resolved to an invalid configuration
    #[error("invalid settings for breaker '{name}': {source}")]
    Breaker {
        name: String,
        #[source]
        source: ConfigError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed replay script
    #[error("invalid script: {0}")]
    Script(String),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

impl TripwireError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TripwireError::Config(_) | TripwireError::Breaker { .. } | TripwireError::Toml(_) => {
                EXIT_CONFIG
            }
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            TripwireError::Config("bad".to_string()).exit_code(),
            EXIT_CONFIG
        );
        assert_eq!(
            TripwireError::Breaker {
                name: "db".to_string(),
                source: ConfigError::ZeroWindowSize,
            }
            .exit_code(),
            EXIT_CONFIG
        );
        assert_eq!(
            TripwireError::Script("?".to_string()).exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_breaker_error_message() {
        let err = TripwireError::Breaker {
            name: "db".to_string(),
            source: ConfigError::ZeroProbeCalls,
        };
        assert_eq!(
            err.to_string(),
            "invalid settings for breaker 'db': permitted_probe_calls must be at least 1"
        );
    }
}
