//! Fixed-order stage runner.
//!
//! # Responsibilities
//! - Run stages strictly in sequence for one request
//! - Short-circuit on the first `Respond` or `Reject`
//! - Dispatch to the route table when every stage continues
//! - Send every rejection through the failure funnel
//! - Apply stage-contributed response headers and completion hooks
//!
//! # Design Decisions
//! - Stage order is decided once, in `from_config`, and never changes
//! - One response per request: the runner owns the only return path

use std::sync::Arc;

use axum::{http::HeaderMap, response::Response};

use crate::config::PipelineConfig;
use crate::error::{FailureFunnel, Rejection};
use crate::http::assets::StaticAssets;
use crate::http::request::RequestContext;
use crate::observability::logging::RequestLogger;
use crate::observability::metrics;
use crate::pipeline::stage::{Flow, Stage};
use crate::routing::RouteTable;
use crate::security::headers::SecurityHeaders;
use crate::security::limits::BodyDecoder;
use crate::security::pollution::{PollutionGuard, Whitelist};
use crate::security::rate_limit::{RateLimit, RateLimiter};
use crate::security::sanitize::Sanitizer;

/// The assembled request pipeline.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    routes: RouteTable,
    funnel: FailureFunnel,
}

impl Pipeline {
    pub fn builder(funnel: FailureFunnel) -> PipelineBuilder {
        PipelineBuilder {
            stages: Vec::new(),
            routes: RouteTable::builder().build(),
            funnel,
        }
    }

    /// Build the standard stage order from configuration.
    ///
    /// The rate limiter is passed in so its store can be shared with a
    /// background sweeper or replaced in tests.
    pub fn from_config(
        config: &PipelineConfig,
        routes: RouteTable,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let environment = config.environment;
        let mut builder = Self::builder(FailureFunnel::new(environment));

        if config.security.headers_enabled {
            builder = builder.stage(SecurityHeaders::default());
        }
        builder = builder.stage(RequestLogger::new(environment));
        if config.rate_limit.enabled {
            builder = builder.stage(RateLimit::new(
                limiter,
                &config.rate_limit.scope_prefix,
                config.rate_limit.trust_forwarded_for,
            ));
        }
        builder = builder
            .stage(BodyDecoder::new(config.body.limit_bytes))
            .stage(Sanitizer)
            .stage(PollutionGuard::new(Whitelist::new(
                config.pollution.whitelist.iter().cloned(),
            )));
        if config.static_files.enabled {
            builder = builder.stage(StaticAssets::new(&config.static_files.directory));
        }

        builder.routes(routes).build()
    }

    pub fn funnel(&self) -> FailureFunnel {
        self.funnel
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the request through every stage and produce its one response.
    pub async fn handle(&self, mut ctx: RequestContext) -> Response {
        let mut response = match self.run(&mut ctx).await {
            Ok(response) => response,
            Err(rejection) => self.funnel.render(&rejection),
        };

        apply_staged_headers(&mut response, &ctx.response_headers);

        let status = response.status();
        for stage in &self.stages {
            stage.on_complete(&ctx, status);
        }
        metrics::record_request(ctx.method.as_str(), status.as_u16(), ctx.started);

        response
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<Response, Rejection> {
        for stage in &self.stages {
            match stage.process(ctx).await {
                Flow::Continue => {}
                Flow::Respond(response) => {
                    tracing::trace!(
                        request_id = %ctx.request_id,
                        stage = stage.name(),
                        "Stage answered request"
                    );
                    return Ok(response);
                }
                Flow::Reject(rejection) => {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        stage = stage.name(),
                        status = rejection.status_code().as_u16(),
                        "Stage rejected request"
                    );
                    return Err(rejection);
                }
            }
        }
        self.routes.dispatch(ctx).await
    }
}

/// Builder for custom stage lists.
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    routes: RouteTable,
    funnel: FailureFunnel,
}

impl PipelineBuilder {
    /// Append a stage; stages run in the order added.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            routes: self.routes,
            funnel: self.funnel,
        }
    }
}

/// Copy staged headers onto the response without overriding ones the
/// responder already set.
fn apply_staged_headers(response: &mut Response, staged: &HeaderMap) {
    let headers = response.headers_mut();
    for name in staged.keys() {
        if headers.contains_key(name) {
            continue;
        }
        for value in staged.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
}
