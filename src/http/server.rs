//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router hosting the request pipeline
//! - Wire up deployment layers (tracing, request ID, panic capture)
//! - Apply hardening headers to every response, including panic and
//!   timeout responses built outside the pipeline
//! - Bound total handling time and body size per request
//! - Bind server to listener and shut down gracefully
//! - Sweep expired rate-limit windows in the background

use std::any::Any;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::Limited;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::PipelineConfig;
use crate::error::{FailureFunnel, Rejection};
use crate::http::request::RequestContext;
use crate::pipeline::Pipeline;
use crate::routing::{EchoGroup, HandlerGroup, RouteTable};
use crate::security::headers::SecurityHeaders;
use crate::security::rate_limit::RateLimiter;

/// Application state injected into the catch-all handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub request_timeout: Duration,
    /// Hard cap on bytes any consumer may read from a request body.
    pub body_limit: usize,
}

/// HTTP server hosting the pipeline.
pub struct HttpServer {
    router: Router,
    config: PipelineConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a server that mounts the echo group at every configured route.
    pub fn new(config: PipelineConfig) -> Self {
        let echo: Arc<dyn HandlerGroup> = Arc::new(EchoGroup);
        let routes = RouteTable::from_config(&config.routes, |_| echo.clone());
        Self::with_routes(config, routes)
    }

    /// Create a server with caller-supplied handler groups.
    pub fn with_routes(config: PipelineConfig, routes: RouteTable) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self::with_parts(config, routes, limiter)
    }

    /// Create a server around an existing limiter (e.g. one backed by a
    /// shared store).
    pub fn with_parts(
        config: PipelineConfig,
        routes: RouteTable,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        for entry in routes.entries() {
            tracing::info!(route = %entry.name(), prefix = %entry.prefix(), "Route mounted");
        }

        let pipeline = Arc::new(Pipeline::from_config(&config, routes, limiter.clone()));
        tracing::debug!(stages = ?pipeline.stage_names(), "Pipeline assembled");

        let router = Self::build_router(&config, pipeline);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &PipelineConfig, pipeline: Arc<Pipeline>) -> Router {
        let funnel = pipeline.funnel();
        let state = AppState {
            pipeline,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            body_limit: config.body.limit_bytes,
        };

        let mut router = Router::new()
            .fallback(pipeline_handler)
            .with_state(state)
            .layer(CatchPanicLayer::custom(
                move |panic: Box<dyn Any + Send + 'static>| render_panic(funnel, panic),
            ));

        // Outside panic capture so crash responses are hardened too.
        // A header the responder already set wins.
        if config.security.headers_enabled {
            for (name, value) in SecurityHeaders::default().headers() {
                router = router.layer(SetResponseHeaderLayer::if_not_present(
                    name.clone(),
                    value.clone(),
                ));
            }
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        let rl = &self.config.rate_limit;
        if rl.enabled && rl.prune_interval_secs > 0 {
            let limiter = self.limiter.clone();
            let interval = Duration::from_secs(rl.prune_interval_secs);
            let stop = shutdown.resubscribe();
            tokio::spawn(async move {
                prune_windows(limiter, interval, stop).await;
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every request enters the pipeline here.
async fn pipeline_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));

    // Every reader of the body, stage or handler group, sees the cap.
    let limit = state.body_limit;
    let request = request.map(|body| Body::new(Limited::new(body, limit)));

    let ctx = RequestContext::new(request, peer);
    let request_id = ctx.request_id.clone();

    match tokio::time::timeout(state.request_timeout, state.pipeline.handle(ctx)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                request_id = %request_id,
                timeout_secs = state.request_timeout.as_secs(),
                "Request timed out"
            );
            state.pipeline.funnel().render(&Rejection::expected(
                StatusCode::REQUEST_TIMEOUT,
                "Request timed out",
            ))
        }
    }
}

fn render_panic(funnel: FailureFunnel, panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    funnel.render(&Rejection::unexpected_message(format!("panic: {message}")))
}

async fn prune_windows(
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut stop: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.prune_expired(Instant::now()).await;
                if removed > 0 {
                    tracing::debug!(removed, "Pruned expired rate-limit windows");
                }
            }
            _ = stop.recv() => break,
        }
    }
}
