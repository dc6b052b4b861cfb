//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! default every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::correlation::{PatternError, PatternRegistry};

/// Root configuration for the correlation echo service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Correlation header patterns.
    pub correlation: CorrelationConfig,

    /// Optional downstream service used to demonstrate propagation.
    pub downstream: DownstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Header pattern configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Start from the built-in pattern table.
    pub use_default_patterns: bool,

    /// Extra patterns, registered in order after the defaults.
    /// Repeating a default pattern updates its `required` flag.
    pub patterns: Vec<PatternEntryConfig>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            use_default_patterns: true,
            patterns: Vec::new(),
        }
    }
}

impl CorrelationConfig {
    /// Build the pattern registry, failing on the first bad pattern.
    pub fn build_registry(&self) -> Result<PatternRegistry, PatternError> {
        let mut registry = if self.use_default_patterns {
            PatternRegistry::with_defaults()
        } else {
            PatternRegistry::empty()
        };

        for entry in &self.patterns {
            registry.register(entry.pattern.clone(), entry.required)?;
        }
        Ok(registry)
    }
}

/// A single configured header pattern.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PatternEntryConfig {
    /// Header name, or a regex when it starts with `^`.
    pub pattern: String,

    /// Echo the header on responses and downstream requests.
    #[serde(default)]
    pub required: bool,
}

/// Downstream propagation target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// URL called by `GET /downstream`. Disabled when unset.
    pub url: Option<String>,

    /// Downstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
