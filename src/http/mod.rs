//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, panic capture)
//!     → request.rs (RequestContext: original URL, peer, request time)
//!     → query.rs (ordered multi-valued query parameters)
//!     → [pipeline stages]
//!     → assets.rs (static files, may answer directly)
//!     → [route table]
//!     → Send to client
//! ```

pub mod assets;
pub mod query;
pub mod request;
pub mod server;

pub use query::QueryParams;
pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
