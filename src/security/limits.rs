//! Request body limits and JSON decoding.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//! - Decode JSON bodies into the request context
//!
//! # Design Decisions
//! - Limits checked before full parsing (early rejection on Content-Length)
//! - Streamed bodies are read with a hard cap, never buffered past it;
//!   the server also wraps every body in the same cap for handler groups
//! - Return 413 Payload Too Large; malformed JSON is 400
//! - Only objects and arrays are accepted at the top level
//! - Non-JSON bodies are not read; the decoded body stays an empty object

use std::error::Error as StdError;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap},
};
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::error::Rejection;
use crate::http::request::RequestContext;
use crate::pipeline::{Flow, Stage};

/// Buffer at most `limit` bytes of `body`.
///
/// Overflow (here, or in a limit already wrapped around the body) becomes
/// 413; any other read failure becomes 400.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, Rejection> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        if exceeded_limit(&err) {
            Rejection::payload_too_large(limit)
        } else {
            Rejection::bad_request(format!("Failed to read request body: {err}"))
        }
    })
}

fn exceeded_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// True for `application/json` and `application/*+json`.
pub fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Decodes bounded JSON bodies.
#[derive(Debug, Clone)]
pub struct BodyDecoder {
    limit_bytes: usize,
}

impl BodyDecoder {
    pub fn new(limit_bytes: usize) -> Self {
        Self { limit_bytes }
    }

    fn too_large(&self) -> Flow {
        Flow::Reject(Rejection::payload_too_large(self.limit_bytes))
    }
}

#[async_trait]
impl Stage for BodyDecoder {
    fn name(&self) -> &'static str {
        "body_decoder"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Flow {
        if let Some(declared) = declared_length(&ctx.headers) {
            if declared > self.limit_bytes as u64 {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    declared,
                    limit = self.limit_bytes,
                    "Declared body too large"
                );
                return self.too_large();
            }
        }

        if !is_json(&ctx.headers) {
            return Flow::Continue;
        }
        let Some(body) = ctx.take_raw_body() else {
            return Flow::Continue;
        };

        let bytes = match read_body(body, self.limit_bytes).await {
            Ok(bytes) => bytes,
            Err(rejection) => return Flow::Reject(rejection),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Flow::Continue;
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                ctx.body = value;
                Flow::Continue
            }
            Ok(_) => Flow::Reject(Rejection::bad_request(
                "Invalid JSON body: expected an object or array",
            )),
            Err(err) => Flow::Reject(Rejection::bad_request(format!("Invalid JSON body: {err}"))),
        }
    }
}
