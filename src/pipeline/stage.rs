//! The uniform capability every pipeline stage implements.

use async_trait::async_trait;
use axum::{http::StatusCode, response::Response};

use crate::error::Rejection;
use crate::http::request::RequestContext;

/// What a stage decided about the request.
#[derive(Debug)]
pub enum Flow {
    /// Hand the context to the next stage.
    Continue,
    /// Answer directly; later stages and routing are skipped.
    Respond(Response),
    /// Fail; later stages are skipped and the funnel renders the rejection.
    Reject(Rejection),
}

/// One step of the request pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Inspect or transform the request.
    async fn process(&self, ctx: &mut RequestContext) -> Flow;

    /// Called once with the final status, whichever stage produced it.
    fn on_complete(&self, _ctx: &RequestContext, _status: StatusCode) {}
}
