//! Failure signalling subsystem.
//!
//! # Data Flow
//! ```text
//! any stage / handler group
//!     → rejection.rs (typed Rejection: message, status, kind)
//!     → short-circuits the pipeline
//!     → funnel.rs (render by environment mode)
//!     → JSON error response
//! ```
//!
//! # Design Decisions
//! - Exactly one exit point for error bodies
//! - Expected failures are safe to show; unexpected ones are not

pub mod funnel;
pub mod rejection;

pub use funnel::{FailureFunnel, GENERIC_FAILURE_MESSAGE};
pub use rejection::{Rejection, RejectionKind, StatusClass};
