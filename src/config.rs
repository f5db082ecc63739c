/*!
 * Configuration types for Tripwire
 *
 * A config file names the breakers a process uses and the thresholds each one
 * runs with. Per-breaker tables only need the fields that differ from
 * `[defaults]`; anything left unset falls back to `[defaults]`, then to the
 * chosen preset.
 *
 * ```toml
 * [logging]
 * level = "info"
 *
 * [defaults]
 * preset = "default"
 * open_state_timeout_ms = 30000
 *
 * [breakers.payments]
 * failure_rate_threshold = 25.0
 * window_size = 20
 * minimum_calls_before_evaluation = 10
 * ```
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tripwire_core_breaker::{BreakerConfig, BreakerRegistry};

use crate::error::{Result, TripwireError};

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TripwireConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Settings shared by every breaker unless overridden
    #[serde(default)]
    pub defaults: BreakerSettings,

    /// Per-dependency overrides, keyed by breaker name
    #[serde(default)]
    pub breakers: BTreeMap<String, BreakerSettings>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for level = debug)
    #[serde(default)]
    pub verbose: bool,
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Named starting point for breaker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Default,
    Aggressive,
    Lenient,
}

impl Preset {
    pub fn config(&self) -> BreakerConfig {
        match self {
            Preset::Default => BreakerConfig::default(),
            Preset::Aggressive => BreakerConfig::aggressive(),
            Preset::Lenient => BreakerConfig::lenient(),
        }
    }
}

/// Breaker settings as written in the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerSettings {
    pub preset: Option<Preset>,
    pub failure_rate_threshold: Option<f64>,
    pub slow_call_duration_ms: Option<u64>,
    pub slow_call_rate_threshold: Option<f64>,
    pub minimum_calls_before_evaluation: Option<usize>,
    pub window_size: Option<usize>,
    pub open_state_timeout_ms: Option<u64>,
    pub permitted_probe_calls: Option<usize>,
}

impl BreakerSettings {
    /// Fill unset fields from `base`
    pub fn or(&self, base: &BreakerSettings) -> BreakerSettings {
        BreakerSettings {
            preset: self.preset.or(base.preset),
            failure_rate_threshold: self.failure_rate_threshold.or(base.failure_rate_threshold),
            slow_call_duration_ms: self.slow_call_duration_ms.or(base.slow_call_duration_ms),
            slow_call_rate_threshold: self
                .slow_call_rate_threshold
                .or(base.slow_call_rate_threshold),
            minimum_calls_before_evaluation: self
                .minimum_calls_before_evaluation
                .or(base.minimum_calls_before_evaluation),
            window_size: self.window_size.or(base.window_size),
            open_state_timeout_ms: self.open_state_timeout_ms.or(base.open_state_timeout_ms),
            permitted_probe_calls: self.permitted_probe_calls.or(base.permitted_probe_calls),
        }
    }

    /// Apply the set fields on top of the preset's configuration
    pub fn resolve(&self) -> BreakerConfig {
        let mut config = self.preset.unwrap_or_default().config();

        if let Some(v) = self.failure_rate_threshold {
            config.failure_rate_threshold = v;
        }
        if let Some(ms) = self.slow_call_duration_ms {
            config.slow_call_duration_threshold = Duration::from_millis(ms);
        }
        if let Some(v) = self.slow_call_rate_threshold {
            config.slow_call_rate_threshold = v;
        }
        if let Some(v) = self.minimum_calls_before_evaluation {
            config.minimum_calls_before_evaluation = v;
        }
        if let Some(v) = self.window_size {
            config.window_size = v;
        }
        if let Some(ms) = self.open_state_timeout_ms {
            config.open_state_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = self.permitted_probe_calls {
            config.permitted_probe_calls = v;
        }

        config
    }
}

impl FromStr for TripwireConfig {
    type Err = TripwireError;

    fn from_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

impl TripwireConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TripwireError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        contents.parse()
    }

    /// Resolved configuration for `name`. Unknown names get the defaults.
    pub fn breaker_config(&self, name: &str) -> BreakerConfig {
        match self.breakers.get(name) {
            Some(settings) => settings.or(&self.defaults).resolve(),
            None => self.defaults.resolve(),
        }
    }

    /// Check the defaults and every named breaker
    pub fn validate(&self) -> Result<()> {
        self.defaults
            .resolve()
            .validate()
            .map_err(|source| TripwireError::Breaker {
                name: "[defaults]".to_string(),
                source,
            })?;

        for name in self.breakers.keys() {
            self.breaker_config(name)
                .validate()
                .map_err(|source| TripwireError::Breaker {
                    name: name.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Registry with every named breaker already created
    pub fn build_registry(&self) -> Result<BreakerRegistry> {
        let registry = BreakerRegistry::new();
        for name in self.breakers.keys() {
            registry
                .get_or_create(name, self.breaker_config(name))
                .map_err(|source| TripwireError::Breaker {
                    name: name.clone(),
                    source,
                })?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [logging]
        level = "debug"

        [defaults]
        open_state_timeout_ms = 5000
        minimum_calls_before_evaluation = 4

        [breakers.payments]
        failure_rate_threshold = 25.0
        window_size = 8

        [breakers.search]
        preset = "lenient"
    "#;

    #[test]
    fn test_default_config() {
        let config = TripwireConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.breakers.is_empty());
        assert_eq!(config.breaker_config("anything"), BreakerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_and_resolve() {
        let config: TripwireConfig = SAMPLE.parse().unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);

        let payments = config.breaker_config("payments");
        assert_eq!(payments.failure_rate_threshold, 25.0);
        assert_eq!(payments.window_size, 8);
        assert_eq!(payments.minimum_calls_before_evaluation, 4);
        assert_eq!(payments.open_state_timeout, Duration::from_secs(5));
        assert_eq!(
            payments.permitted_probe_calls,
            BreakerConfig::default().permitted_probe_calls
        );

        let search = config.breaker_config("search");
        assert_eq!(search.window_size, BreakerConfig::lenient().window_size);
        assert_eq!(search.minimum_calls_before_evaluation, 4);

        let unknown = config.breaker_config("unknown");
        assert_eq!(unknown.open_state_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_names_offending_breaker() {
        let config: TripwireConfig = r#"
            [breakers.db]
            window_size = 3
            minimum_calls_before_evaluation = 5
        "#
        .parse()
        .unwrap();

        match config.validate() {
            Err(TripwireError::Breaker { name, .. }) => assert_eq!(name, "db"),
            other => panic!("expected breaker error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<TripwireConfig> = r#"
            [breakers.db]
            failure_threshold = 5
        "#
        .parse();
        assert!(matches!(result, Err(TripwireError::Toml(_))));
    }

    #[test]
    fn test_build_registry_preregisters() {
        let config: TripwireConfig = SAMPLE.parse().unwrap();
        let registry = config.build_registry().unwrap();

        assert_eq!(registry.names(), vec!["payments", "search"]);
        let payments = registry.get("payments").unwrap();
        assert_eq!(payments.config().window_size, 8);
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let settings = BreakerSettings {
            preset: Some(Preset::Aggressive),
            window_size: Some(12),
            ..Default::default()
        };
        let text = toml::to_string(&settings).unwrap();
        let back: BreakerSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}
