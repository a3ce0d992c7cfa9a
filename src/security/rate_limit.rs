//! Fixed-window rate limiting per client identity.
//!
//! # Responsibilities
//! - Count requests per identity inside a fixed window
//! - Reject the request that exceeds the window's allowance with 429
//! - Report limit, remaining and reset through response headers
//!
//! # Design Decisions
//! - The counting store is a trait injected into the limiter, so a shared
//!   store can replace the in-memory one for multi-replica deployments
//! - The in-memory store serializes updates per entry (dashmap shard
//!   lock held across reset + increment), so concurrent checks for one
//!   identity cannot lose updates
//! - Expiry is lazy; `prune_expired` is optional memory hygiene
//! - An admitted increment is never rolled back

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::Rejection;
use crate::http::request::RequestContext;
use crate::observability::metrics;
use crate::pipeline::{Flow, Stage};
use crate::routing::PathPrefixMatcher;

/// Window allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub max_requests: u64,
    pub window: Duration,
}

/// Counter state for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u64,
    pub window_start: Instant,
}

impl WindowState {
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Time left until this window resets.
    pub fn reset_after(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.window_start))
    }
}

/// Storage for per-identity window counters.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Atomically reset the window if it has expired, then count one hit.
    /// Returns the state after the increment.
    async fn hit(&self, identity: &str, now: Instant, window: Duration) -> WindowState;

    /// Drop windows that expired before `now`. Returns how many were removed.
    async fn prune_expired(&self, now: Instant, window: Duration) -> usize;

    /// Number of identities currently tracked.
    async fn tracked(&self) -> usize;
}

/// Process-local store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: DashMap<String, WindowState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn hit(&self, identity: &str, now: Instant, window: Duration) -> WindowState {
        let mut entry = self
            .windows
            .entry(identity.to_string())
            .or_insert(WindowState {
                count: 0,
                window_start: now,
            });
        if entry.is_expired(now, window) {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);
        *entry
    }

    async fn prune_expired(&self, now: Instant, window: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, state| !state.is_expired(now, window));
        before.saturating_sub(self.windows.len())
    }

    async fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// Outcome of an admission check.
#[derive(Debug)]
pub enum Admission {
    Allowed {
        remaining: u64,
        reset_after: Duration,
    },
    Rejected {
        rejection: Rejection,
        retry_after: Duration,
    },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Fixed-window limiter over an injected store.
pub struct RateLimiter {
    store: Arc<dyn AdmissionStore>,
    policy: WindowPolicy,
    message: String,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn AdmissionStore>, policy: WindowPolicy, message: impl Into<String>) -> Self {
        Self {
            store,
            policy,
            message: message.into(),
        }
    }

    /// In-memory limiter with the configured policy.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            WindowPolicy {
                max_requests: config.max_requests,
                window: Duration::from_secs(config.window_secs),
            },
            config.message.clone(),
        )
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Count a request for `identity` and decide whether it may proceed.
    pub async fn admit(&self, identity: &str, now: Instant) -> Admission {
        let state = self.store.hit(identity, now, self.policy.window).await;
        let reset_after = state.reset_after(now, self.policy.window);

        if state.count > self.policy.max_requests {
            Admission::Rejected {
                rejection: Rejection::too_many_requests(self.message.clone()),
                retry_after: reset_after,
            }
        } else {
            Admission::Allowed {
                remaining: self.policy.max_requests - state.count,
                reset_after,
            }
        }
    }

    pub async fn prune_expired(&self, now: Instant) -> usize {
        self.store.prune_expired(now, self.policy.window).await
    }

    pub async fn tracked(&self) -> usize {
        self.store.tracked().await
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.policy)
            .finish()
    }
}

/// Seconds, rounded up.
fn ceil_secs(duration: Duration) -> u64 {
    if duration.subsec_nanos() > 0 {
        duration.as_secs() + 1
    } else {
        duration.as_secs()
    }
}

/// Pipeline stage applying the limiter to paths under a scope prefix.
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    scope: PathPrefixMatcher,
    trust_forwarded_for: bool,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>, scope_prefix: &str, trust_forwarded_for: bool) -> Self {
        Self {
            limiter,
            scope: PathPrefixMatcher::new(scope_prefix),
            trust_forwarded_for,
        }
    }
}

#[async_trait]
impl Stage for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Flow {
        if !self.scope.matches(ctx.path()) {
            return Flow::Continue;
        }

        let identity = ctx.client_ip(self.trust_forwarded_for).to_string();
        let policy = self.limiter.policy();
        let admission = self.limiter.admit(&identity, Instant::now()).await;

        let headers = &mut ctx.response_headers;
        headers.insert("x-ratelimit-limit", HeaderValue::from(policy.max_requests));

        match admission {
            Admission::Allowed {
                remaining,
                reset_after,
            } => {
                headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
                headers.insert("x-ratelimit-reset", HeaderValue::from(ceil_secs(reset_after)));
                Flow::Continue
            }
            Admission::Rejected {
                rejection,
                retry_after,
            } => {
                let retry_secs = ceil_secs(retry_after);
                headers.insert("x-ratelimit-remaining", HeaderValue::from(0u64));
                headers.insert("x-ratelimit-reset", HeaderValue::from(retry_secs));
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));

                tracing::warn!(
                    request_id = %ctx.request_id,
                    client = %identity,
                    retry_after_secs = retry_secs,
                    "Rate limit exceeded"
                );
                metrics::record_rate_limited();
                Flow::Reject(rejection)
            }
        }
    }
}
