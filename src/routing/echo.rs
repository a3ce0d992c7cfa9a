//! Diagnostic handler group.
//!
//! Mounted by the binary at every configured prefix so the envelope can be
//! exercised end to end. It reflects what the pipeline handed it and
//! carries no resource semantics.

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::Rejection;
use crate::http::request::RequestContext;
use crate::routing::router::HandlerGroup;

/// Responds with the request as the pipeline saw it.
#[derive(Debug, Clone, Default)]
pub struct EchoGroup;

#[async_trait]
impl HandlerGroup for EchoGroup {
    async fn handle(
        &self,
        remainder: &str,
        ctx: &mut RequestContext,
    ) -> Result<Response, Rejection> {
        let body = json!({
            "status": "success",
            "requestedAt": ctx.request_time_utc(),
            "data": {
                "route": ctx.route,
                "method": ctx.method.as_str(),
                "path": remainder,
                "query": ctx.query,
                "body": ctx.body,
            },
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }
}
