//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store mounted handler groups in registration order
//! - Look up the first group whose prefix claims the path
//! - Hand the remainder and the full context to that group
//! - Manufacture the not-found rejection when nothing matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - First match wins and is exclusive: no fallthrough after a claim

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use crate::config::RouteConfig;
use crate::error::Rejection;
use crate::http::request::RequestContext;
use crate::routing::matcher::PathPrefixMatcher;

/// An independently owned group of resource handlers.
#[async_trait]
pub trait HandlerGroup: Send + Sync {
    /// Handle a request whose path, minus the mount prefix, is `remainder`.
    async fn handle(
        &self,
        remainder: &str,
        ctx: &mut RequestContext,
    ) -> Result<Response, Rejection>;
}

/// A mounted handler group.
pub struct RouteEntry {
    name: String,
    matcher: PathPrefixMatcher,
    group: Arc<dyn HandlerGroup>,
}

impl RouteEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("name", &self.name)
            .field("prefix", &self.matcher.prefix())
            .finish()
    }
}

/// Ordered prefix → handler group table.
#[derive(Debug)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder {
            entries: Vec::new(),
        }
    }

    /// Mount one group per configured route, in configuration order.
    pub fn from_config<F>(routes: &[RouteConfig], mut group_for: F) -> Self
    where
        F: FnMut(&RouteConfig) -> Arc<dyn HandlerGroup>,
    {
        routes
            .iter()
            .fold(Self::builder(), |builder, route| {
                let group = group_for(route);
                builder.mount(&route.name, &route.path_prefix, group)
            })
            .build()
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// First entry claiming `path`, with the unmatched remainder.
    pub fn resolve<'a>(&self, path: &'a str) -> Option<(&RouteEntry, &'a str)> {
        self.entries
            .iter()
            .find_map(|entry| entry.matcher.strip(path).map(|rest| (entry, rest)))
    }

    /// Route the request or reject it as not found.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> Result<Response, Rejection> {
        let path = ctx.path().to_string();
        match self.resolve(&path) {
            Some((entry, remainder)) => {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    route = %entry.name,
                    remainder = %remainder,
                    "Route matched"
                );
                ctx.route = Some(entry.name.clone());
                entry.group.handle(remainder, ctx).await
            }
            None => {
                tracing::debug!(request_id = %ctx.request_id, path = %path, "No route matched");
                Err(Rejection::not_found(ctx.original_url()))
            }
        }
    }
}

/// Builder collecting mounts before the table is frozen.
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
}

impl RouteTableBuilder {
    /// Mount `group` at `prefix`. Earlier mounts take precedence.
    pub fn mount(
        mut self,
        name: impl Into<String>,
        prefix: &str,
        group: Arc<dyn HandlerGroup>,
    ) -> Self {
        self.entries.push(RouteEntry {
            name: name.into(),
            matcher: PathPrefixMatcher::new(prefix),
            group,
        });
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            entries: self.entries,
        }
    }
}
