//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every header pattern before the config is accepted
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::correlation::{HeaderPattern, PatternError};

/// A single semantic problem with a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address `{0}`")]
    BindAddress(String),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("`{0}` must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("invalid downstream url `{url}`: {source}")]
    DownstreamUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("downstream url `{0}` must use http or https")]
    DownstreamScheme(String),
}

/// Check a configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    if config.downstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("downstream.timeout_secs"));
    }

    for entry in &config.correlation.patterns {
        if let Err(e) = HeaderPattern::new(entry.pattern.clone(), entry.required) {
            errors.push(e.into());
        }
    }

    if let Some(raw) = &config.downstream.url {
        match url::Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(_) => errors.push(ValidationError::DownstreamScheme(raw.clone())),
            Err(source) => errors.push(ValidationError::DownstreamUrl {
                url: raw.clone(),
                source,
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PatternEntryConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.correlation.patterns.push(PatternEntryConfig {
            pattern: "^X-(".into(),
            required: false,
        });
        config.downstream.url = Some("ftp://example.com".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Pattern(PatternError::InvalidRegex { .. }))));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DownstreamScheme(_))));
    }

    #[test]
    fn test_rejects_malformed_downstream_url() {
        let mut config = AppConfig::default();
        config.downstream.url = Some("::nope".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::DownstreamUrl { .. }));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
