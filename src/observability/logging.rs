//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Emit the development access log for each request
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config; `RUST_LOG` wins when set

use async_trait::async_trait;
use axum::http::StatusCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, ObservabilityConfig};
use crate::http::request::RequestContext;
use crate::pipeline::{Flow, Stage};

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig, environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "api_pipeline={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if environment.is_development() {
        registry.with(tracing_subscriber::fmt::layer().pretty()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Access log in development mode; silent otherwise.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogger {
    enabled: bool,
}

impl RequestLogger {
    pub fn new(environment: Environment) -> Self {
        Self {
            enabled: environment.is_development(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl Stage for RequestLogger {
    fn name(&self) -> &'static str {
        "request_logger"
    }

    async fn process(&self, _ctx: &mut RequestContext) -> Flow {
        Flow::Continue
    }

    fn on_complete(&self, ctx: &RequestContext, status: StatusCode) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = ctx.started.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            url = %ctx.original_url(),
            status = status.as_u16(),
            elapsed_ms,
            "{} {} {} {:.3} ms",
            ctx.method,
            ctx.original_url(),
            status.as_u16(),
            elapsed_ms
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_only_in_development() {
        assert!(RequestLogger::new(Environment::Development).is_enabled());
        assert!(!RequestLogger::new(Environment::Production).is_enabled());
    }
}
