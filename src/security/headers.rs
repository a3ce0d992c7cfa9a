//! Security response headers.
//!
//! # Responsibilities
//! - Add hardening headers to every response, success or failure
//!
//! # Design Decisions
//! - Defaults mirror common browser hardening baselines
//! - Headers are staged on the context, not written by this stage, so
//!   they also land on responses produced by later stages or the funnel
//! - A responder that sets one of these headers itself wins
//! - The server applies the same set as a response layer, which covers
//!   panic and timeout responses that never return through the pipeline

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};

use crate::http::request::RequestContext;
use crate::pipeline::{Flow, Stage};

/// Default hardening headers.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
         form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
         object-src 'none';script-src 'self';script-src-attr 'none';\
         style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Stages hardening headers onto every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn new(headers: Vec<(HeaderName, HeaderValue)>) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        let headers = DEFAULT_HEADERS
            .iter()
            .map(|&(name, value)| {
                (
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            })
            .collect();
        Self { headers }
    }
}

#[async_trait]
impl Stage for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Flow {
        for (name, value) in &self.headers {
            ctx.response_headers.insert(name.clone(), value.clone());
        }
        Flow::Continue
    }
}
