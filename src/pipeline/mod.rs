//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → security headers
//!     → request logging (development only)
//!     → rate limiting (scoped to /api)
//!     → body decoding (bounded)
//!     → sanitization (body + query)
//!     → parameter pollution guard
//!     → static assets (may answer)
//!     → route table dispatch / not-found
//!     → Response, or Rejection → failure funnel → Response
//! ```
//!
//! # Design Decisions
//! - Stages are an explicit ordered list, not ambient middleware chaining
//! - Each stage returns `Flow`; the runner alone decides what happens next
//! - Stages inside one request never run concurrently or out of order

pub mod runner;
pub mod stage;

pub use runner::{Pipeline, PipelineBuilder};
pub use stage::{Flow, Stage};
