//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext (path)
//!     → router.rs (ordered prefix scan)
//!     → matcher.rs (segment-aligned prefix match)
//!     → matched HandlerGroup(remainder, ctx) → Response | Rejection
//!     → or: not-found Rejection (404)
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Keep registration order
//!     → Normalize prefixes
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod echo;
pub mod matcher;
pub mod router;

pub use echo::EchoGroup;
pub use matcher::PathPrefixMatcher;
pub use router::{HandlerGroup, RouteEntry, RouteTable, RouteTableBuilder};
