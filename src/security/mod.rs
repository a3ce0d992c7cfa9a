//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (stage hardening response headers)
//!     → rate_limit.rs (check per-IP window under /api)
//!     → limits.rs (check body size, decode JSON)
//!     → sanitize.rs (strip operator keys, escape markup)
//!     → pollution.rs (collapse repeated query keys)
//!     → Pass to static assets / routing
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod limits;
pub mod pollution;
pub mod rate_limit;
pub mod sanitize;

pub use headers::SecurityHeaders;
pub use limits::BodyDecoder;
pub use pollution::{collapse, PollutionGuard, Whitelist};
pub use rate_limit::{Admission, AdmissionStore, MemoryStore, RateLimit, RateLimiter, WindowPolicy, WindowState};
pub use sanitize::{sanitize_query, sanitize_value, Sanitizer};
