//! Static asset passthrough.
//!
//! GET/HEAD requests that resolve to a file under the public directory are
//! answered here and never reach the route table. Anything `ServeDir`
//! cannot find continues down the pipeline; a server-side failure while
//! reading the file is rejected so the funnel renders it.

use std::path::Path;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::error::Rejection;
use crate::http::request::RequestContext;
use crate::pipeline::{Flow, Stage};

/// Serves files from a public directory.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    serve: ServeDir,
}

impl StaticAssets {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            serve: ServeDir::new(directory).append_index_html_on_directories(false),
        }
    }
}

#[async_trait]
impl Stage for StaticAssets {
    fn name(&self) -> &'static str {
        "static_assets"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Flow {
        if ctx.method != Method::GET && ctx.method != Method::HEAD {
            return Flow::Continue;
        }

        let mut request = Request::new(Body::empty());
        *request.method_mut() = ctx.method.clone();
        *request.uri_mut() = ctx.uri.clone();
        *request.headers_mut() = ctx.headers.clone();

        let response = match self.serve.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let flow = flow_for(response.map(Body::new));
        if let Flow::Respond(_) = flow {
            tracing::trace!(request_id = %ctx.request_id, path = %ctx.path(), "Served static asset");
        }
        flow
    }
}

/// Decide what a `ServeDir` response means for the pipeline.
fn flow_for(response: Response) -> Flow {
    let status = response.status();
    match status {
        StatusCode::NOT_FOUND | StatusCode::TEMPORARY_REDIRECT => Flow::Continue,
        s if s.is_server_error() => Flow::Reject(Rejection::unexpected_message(format!(
            "static file service failed with {s}"
        ))),
        _ => Flow::Respond(response),
    }
}
