//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! Every problem is collected so a bad file is reported in one pass.

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.fetch.timeout_secs == 0 {
        errors.push(ValidationError::new("fetch.timeout_secs", "must be greater than 0"));
    }
    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than 0"));
    }
    if config.cache.capacity == 0 {
        errors.push(ValidationError::new("cache.capacity", "must be greater than 0"));
    }
    if config.cache.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("cache.sweep_interval_secs", "must be greater than 0"));
    }
    if config.sessions.ttl_secs == 0 {
        errors.push(ValidationError::new("sessions.ttl_secs", "must be greater than 0"));
    }
    if config.sessions.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "sessions.sweep_interval_secs",
            "must be greater than 0",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected 'pretty' or 'json'", other),
        )),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
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

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RelayConfig::default();
        config.cache.capacity = 0;
        config.sessions.ttl_secs = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["cache.capacity", "sessions.ttl_secs", "observability.log_format"]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
