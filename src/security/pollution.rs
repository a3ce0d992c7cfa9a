//! HTTP parameter pollution guard.
//!
//! # Responsibilities
//! - Collapse repeated query keys to their last value
//! - Leave whitelisted keys as full sequences
//! - Record collapsed keys' original values for handlers that want them
//!
//! # Design Decisions
//! - Deterministic: output depends only on the query and the whitelist
//! - The whitelist is fixed at startup

use std::collections::HashSet;

use async_trait::async_trait;

use crate::http::query::QueryParams;
use crate::http::request::RequestContext;
use crate::pipeline::{Flow, Stage};

/// Query keys allowed to repeat.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    keys: HashSet<String>,
}

impl Whitelist {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Collapse polluted parameters.
///
/// Returns the cleaned query and, separately, the full value lists of every
/// key that was collapsed.
pub fn collapse(mut query: QueryParams, whitelist: &Whitelist) -> (QueryParams, QueryParams) {
    let mut polluted = QueryParams::new();
    for (key, values) in query.iter_mut() {
        if values.len() > 1 && !whitelist.contains(key) {
            let original = std::mem::take(values);
            if let Some(last) = original.last() {
                values.push(last.clone());
            }
            polluted.set(key, original);
        }
    }
    (query, polluted)
}

/// Pipeline stage applying [`collapse`] to `ctx.query`.
#[derive(Debug, Clone)]
pub struct PollutionGuard {
    whitelist: Whitelist,
}

impl PollutionGuard {
    pub fn new(whitelist: Whitelist) -> Self {
        Self { whitelist }
    }
}

#[async_trait]
impl Stage for PollutionGuard {
    fn name(&self) -> &'static str {
        "pollution_guard"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Flow {
        let query = std::mem::take(&mut ctx.query);
        let (query, polluted) = collapse(query, &self.whitelist);
        if !polluted.is_empty() {
            tracing::debug!(
                request_id = %ctx.request_id,
                keys = polluted.len(),
                "Collapsed repeated query parameters"
            );
        }
        ctx.query = query;
        ctx.polluted = polluted;
        Flow::Continue
    }
}
