//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, limits > 0)
//! - Detect malformed or duplicate route prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::PipelineConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if rl.max_requests == 0 {
            errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
        }
        if rl.window_secs == 0 {
            errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
        }
        if !rl.scope_prefix.starts_with('/') {
            errors.push(ValidationError::new("rate_limit.scope_prefix", "must start with '/'"));
        }
    }

    if config.body.limit_bytes == 0 {
        errors.push(ValidationError::new("body.limit_bytes", "must be greater than 0"));
    }

    for (i, key) in config.pollution.whitelist.iter().enumerate() {
        if key.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("pollution.whitelist[{i}]"),
                "must not be empty",
            ));
        }
    }

    if config.static_files.enabled && config.static_files.directory.trim().is_empty() {
        errors.push(ValidationError::new("static_files.directory", "must not be empty"));
    }

    let mut seen = HashSet::new();
    for (i, route) in config.routes.iter().enumerate() {
        let prefix = route.path_prefix.trim_end_matches('/');
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::new(
                format!("routes[{i}].path_prefix"),
                "must start with '/'",
            ));
        } else if !seen.insert(prefix.to_string()) {
            errors.push(ValidationError::new(
                format!("routes[{i}].path_prefix"),
                format!("duplicate prefix '{}'", route.path_prefix),
            ));
        }
        if route.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("routes[{i}].name"), "must not be empty"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
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
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&PipelineConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = PipelineConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_secs = 0;
        config.body.limit_bytes = 0;
        config.routes = vec![
            RouteConfig::new("a", "/api/v1/tours"),
            RouteConfig::new("b", "/api/v1/tours/"),
            RouteConfig::new("c", "no-slash"),
        ];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"rate_limit.max_requests"));
        assert!(fields.contains(&"rate_limit.window_secs"));
        assert!(fields.contains(&"body.limit_bytes"));
        assert!(fields.contains(&"routes[1].path_prefix"));
        assert!(fields.contains(&"routes[2].path_prefix"));
    }

    #[test]
    fn test_disabled_rate_limit_skips_checks() {
        let mut config = PipelineConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }
}
