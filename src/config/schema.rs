//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the request pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Error verbosity and request logging mode.
    pub environment: Environment,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Request body decoding.
    pub body: BodyConfig,

    /// Query parameter pollution guard.
    pub pollution: PollutionConfig,

    /// Static asset passthrough.
    pub static_files: StaticFilesConfig,

    /// Security header settings.
    pub security: SecurityConfig,

    /// Resource groups mounted in the route table, in match order.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            rate_limit: RateLimitConfig::default(),
            body: BodyConfig::default(),
            pollution: PollutionConfig::default(),
            static_files: StaticFilesConfig::default(),
            security: SecurityConfig::default(),
            routes: RouteConfig::defaults(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Process-wide mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Verbose errors, access logging.
    Development,
    /// Anything production-like: unexpected failures are masked.
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    /// `development`/`dev` select development; every other non-empty value
    /// is production-like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err("environment must not be empty".to_string()),
            "development" | "dev" => Ok(Environment::Development),
            _ => Ok(Environment::Production),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
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

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per identity per window.
    pub max_requests: u64,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Only paths under this prefix are counted.
    pub scope_prefix: String,

    /// Use the first `X-Forwarded-For` hop as identity.
    pub trust_forwarded_for: bool,

    /// Interval for evicting expired windows; 0 disables the sweep.
    pub prune_interval_secs: u64,

    /// Message returned with 429 responses.
    pub message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60 * 60,
            scope_prefix: "/api".to_string(),
            trust_forwarded_for: false,
            prune_interval_secs: 300,
            message: "Too many requests from this IP, please try again in an hour!".to_string(),
        }
    }
}

/// Body decoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum accepted body size in bytes.
    pub limit_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            limit_bytes: 10 * 1024, // 10KB
        }
    }
}

/// Parameter pollution guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollutionConfig {
    /// Query keys allowed to repeat.
    pub whitelist: Vec<String>,
}

impl Default for PollutionConfig {
    fn default() -> Self {
        Self {
            whitelist: [
                "duration",
                "difficulty",
                "ratingsAverage",
                "ratingsQuantity",
                "price",
                "maxGroupSize",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Serve files from `directory`.
    pub enabled: bool,

    /// Public directory root.
    pub directory: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "public".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub headers_enabled: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            headers_enabled: true,
        }
    }
}

/// A mounted resource group.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match (segment aligned).
    pub path_prefix: String,
}

impl RouteConfig {
    pub fn new(name: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
        }
    }

    /// The three API resource groups.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("tours", "/api/v1/tours"),
            Self::new("users", "/api/v1/users"),
            Self::new("reviews", "/api/v1/reviews"),
        ]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str("environment = \"development\"").unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 3600);
        assert_eq!(config.body.limit_bytes, 10 * 1024);
        assert!(config.pollution.whitelist.contains(&"price".to_string()));
        assert_eq!(config.routes.len(), 3);
        assert_eq!(config.routes[0].path_prefix, "/api/v1/tours");
    }

    #[test]
    fn test_routes_parse_in_order() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [[routes]]
            name = "tours"
            path_prefix = "/api/v1/tours"

            [[routes]]
            name = "users"
            path_prefix = "/api/v1/users"
            "#,
        )
        .unwrap();
        let names: Vec<_> = config.routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["tours", "users"]);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("development".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!("Dev".parse::<Environment>(), Ok(Environment::Development));
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Production));
        assert!("".parse::<Environment>().is_err());
    }
}
