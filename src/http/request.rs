//! Per-request state threaded through the pipeline.
//!
//! # Responsibilities
//! - Capture method, original URL, headers and peer address
//! - Hold the raw body until the decoder consumes it
//! - Carry decoded body, query parameters, request time and route name
//! - Collect response headers contributed by stages
//!
//! # Design Decisions
//! - Owned by exactly one request; never shared or cloned across requests
//! - Request ID comes from the tower-http layer, read once at construction;
//!   a context built without it gets a fresh UUID
//! - Stage-contributed response headers apply to success and failure alike

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderMap, Method, Request, Uri},
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::http::query::QueryParams;

/// Request ID header, set and propagated by the tower-http layers.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Mutable state for one in-flight request.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub peer: SocketAddr,
    pub request_id: String,
    /// Server-assigned arrival time.
    pub request_time: DateTime<Utc>,
    pub started: Instant,
    /// Decoded JSON body; an empty object until decoded.
    pub body: Value,
    pub query: QueryParams,
    /// Values dropped by the pollution guard, by key.
    pub polluted: QueryParams,
    /// Name of the route that claimed the request.
    pub route: Option<String>,
    /// Headers added to whatever response leaves the pipeline.
    pub response_headers: HeaderMap,
    raw_body: Option<Body>,
}

impl RequestContext {
    pub fn new(request: Request<Body>, peer: SocketAddr) -> Self {
        let (parts, body) = request.into_parts();
        let request_id = parts
            .headers
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let query = parts.uri.query().map(QueryParams::parse).unwrap_or_default();

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            peer,
            request_id,
            request_time: Utc::now(),
            started: Instant::now(),
            body: Value::Object(Map::new()),
            query,
            polluted: QueryParams::new(),
            route: None,
            response_headers: HeaderMap::new(),
            raw_body: Some(body),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Path and query exactly as the client sent them.
    pub fn original_url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Take the undecoded body. Returns `None` once consumed.
    pub fn take_raw_body(&mut self) -> Option<Body> {
        self.raw_body.take()
    }

    /// Client identity for per-client accounting.
    ///
    /// Uses the first `X-Forwarded-For` hop only when `trust_forwarded_for`
    /// is set and the header parses; otherwise the socket peer.
    pub fn client_ip(&self, trust_forwarded_for: bool) -> IpAddr {
        if trust_forwarded_for {
            let forwarded = self
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok());
            if let Some(ip) = forwarded {
                return ip;
            }
        }
        self.peer.ip()
    }

    /// Request time in the HTTP-date style used by `Date` headers.
    pub fn request_time_utc(&self) -> String {
        self.request_time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(uri: &str) -> RequestContext {
        let req = Request::builder()
            .uri(uri)
            .header("x-request-id", "abc-123")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        RequestContext::new(req, "127.0.0.1:5555".parse().unwrap())
    }

    #[test]
    fn test_context_captures_request() {
        let c = ctx("/api/v1/tours?duration=5&duration=7");
        assert_eq!(c.path(), "/api/v1/tours");
        assert_eq!(c.original_url(), "/api/v1/tours?duration=5&duration=7");
        assert_eq!(c.request_id, "abc-123");
        assert_eq!(c.query.get("duration").unwrap(), ["5", "7"]);
        assert!(c.body.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_missing_request_id_is_generated() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let c = RequestContext::new(req, "127.0.0.1:1".parse().unwrap());
        assert!(Uuid::parse_str(&c.request_id).is_ok());
    }

    #[test]
    fn test_raw_body_taken_once() {
        let mut c = ctx("/");
        assert!(c.take_raw_body().is_some());
        assert!(c.take_raw_body().is_none());
    }

    #[test]
    fn test_client_ip_respects_trust_flag() {
        let c = ctx("/");
        assert_eq!(c.client_ip(false).to_string(), "127.0.0.1");
        assert_eq!(c.client_ip(true).to_string(), "203.0.113.9");
    }
}
