//! HTTP API request pipeline.
//!
//! Every request passes through an explicit, ordered list of stages
//! (security headers, access log, rate limiting, body decoding,
//! sanitization, parameter-pollution guard, static assets) before reaching
//! the resource route table. Any failure, expected or not, is rendered by a
//! single failure funnel whose verbosity depends on the environment.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::PipelineConfig;
pub use error::{FailureFunnel, Rejection};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::Pipeline;
