//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use api_pipeline::config::{Environment, PipelineConfig};
use api_pipeline::http::{HttpServer, RequestContext};
use api_pipeline::lifecycle::Shutdown;
use api_pipeline::routing::{EchoGroup, HandlerGroup, RouteTable};
use api_pipeline::security::limits::read_body;
use api_pipeline::Rejection;

/// Config with static files off so tests never touch the working directory.
pub fn test_config(environment: Environment) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.environment = environment;
    config.static_files.enabled = false;
    config.rate_limit.prune_interval_secs = 0;
    config
}

/// Echo group at `/api/v1/tours` plus deliberately failing groups.
pub fn test_routes() -> RouteTable {
    RouteTable::builder()
        .mount("tours", "/api/v1/tours", Arc::new(EchoGroup))
        .mount("broken", "/api/v1/broken", Arc::new(Broken))
        .mount("panics", "/api/v1/panics", Arc::new(Panics))
        .mount("teapot", "/api/v1/teapot", Arc::new(Teapot))
        .mount("slow", "/api/v1/slow", Arc::new(Slow))
        .mount("uploads", "/api/v1/uploads", Arc::new(RawReader))
        .build()
}

pub fn router(config: PipelineConfig) -> Router {
    HttpServer::with_routes(config, test_routes()).router()
}

/// Drive one request through the router in-process.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, headers, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_owned()))
        .unwrap()
}

/// Start a real server on an ephemeral port.
pub async fn spawn_server(config: PipelineConfig) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_routes(config, test_routes());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

struct Broken;

#[async_trait]
impl HandlerGroup for Broken {
    async fn handle(&self, _: &str, _: &mut RequestContext) -> Result<Response, Rejection> {
        Err(Rejection::unexpected(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "database connection refused",
        )))
    }
}

struct Panics;

#[async_trait]
impl HandlerGroup for Panics {
    async fn handle(&self, _: &str, _: &mut RequestContext) -> Result<Response, Rejection> {
        panic!("handler exploded");
    }
}

struct Teapot;

#[async_trait]
impl HandlerGroup for Teapot {
    async fn handle(&self, _: &str, ctx: &mut RequestContext) -> Result<Response, Rejection> {
        if ctx.query.contains_key("fail") {
            return Err(Rejection::with_code(400, "No tour found with that ID"));
        }
        Ok((StatusCode::IM_A_TEAPOT, [("x-frame-options", "DENY")], "short and stout")
            .into_response())
    }
}

struct Slow;

#[async_trait]
impl HandlerGroup for Slow {
    async fn handle(&self, _: &str, _: &mut RequestContext) -> Result<Response, Rejection> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok("too late".into_response())
    }
}

/// Reads the undecoded body itself, as an upload handler would.
struct RawReader;

#[async_trait]
impl HandlerGroup for RawReader {
    async fn handle(&self, _: &str, ctx: &mut RequestContext) -> Result<Response, Rejection> {
        let body = ctx.take_raw_body().unwrap_or_default();
        let bytes = read_body(body, usize::MAX).await?;
        Ok(format!("received {} bytes", bytes.len()).into_response())
    }
}
