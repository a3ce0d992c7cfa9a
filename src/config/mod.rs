//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → handed to stage constructors at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the pipeline never reads it ambiently
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BodyConfig, Environment, ListenerConfig, ObservabilityConfig, PipelineConfig,
    PollutionConfig, RateLimitConfig, RouteConfig, SecurityConfig, StaticFilesConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
