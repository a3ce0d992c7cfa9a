//! Centralized failure rendering.
//!
//! # Responsibilities
//! - Turn any [`Rejection`] into the client-visible JSON response
//! - Pick verbosity from the process environment mode
//! - Log unexpected failures with full diagnostics server-side
//!
//! # Design Decisions
//! - The only code path that writes an error body
//! - Rendering is infallible: bodies are built from `serde_json::Value`
//!   and every status code in a `Rejection` is already valid

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::Environment;
use crate::error::rejection::Rejection;
use crate::observability::metrics;

/// Message shown for unexpected failures outside development.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went very wrong!";

/// Converts rejections into responses.
#[derive(Debug, Clone, Copy)]
pub struct FailureFunnel {
    environment: Environment,
}

impl FailureFunnel {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Render a rejection. Never panics.
    pub fn render(&self, rejection: &Rejection) -> Response {
        let status = rejection.status_code();
        metrics::record_rejection(status.as_u16(), rejection.kind().as_str());

        if !rejection.is_expected() {
            tracing::error!(
                status_code = status.as_u16(),
                diagnostics = %rejection.diagnostics(),
                "Unexpected failure"
            );
        } else {
            tracing::debug!(
                status_code = status.as_u16(),
                message = %rejection.message(),
                "Request rejected"
            );
        }

        match self.environment {
            Environment::Development => self.render_development(rejection),
            Environment::Production if rejection.is_expected() => (
                status,
                Json(json!({
                    "status": rejection.status_class().as_str(),
                    "message": rejection.message(),
                })),
            )
                .into_response(),
            Environment::Production => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": GENERIC_FAILURE_MESSAGE,
                })),
            )
                .into_response(),
        }
    }

    fn render_development(&self, rejection: &Rejection) -> Response {
        let class = rejection.status_class().as_str();
        let body = json!({
            "status": class,
            "error": {
                "status": class,
                "statusCode": rejection.status_code().as_u16(),
                "isExpected": rejection.is_expected(),
                "message": rejection.message(),
            },
            "message": rejection.message(),
            "stack": rejection.diagnostics(),
        });
        (rejection.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn server_fault() -> Rejection {
        Rejection::unexpected(std::io::Error::new(
            std::io::ErrorKind::Other,
            "connection pool exhausted",
        ))
    }

    #[tokio::test]
    async fn test_production_hides_unexpected_details() {
        let funnel = FailureFunnel::new(Environment::Production);
        let response = funnel.render(&server_fault());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, json!({"status": "error", "message": "Something went very wrong!"}));
        assert!(!body.to_string().contains("pool"));
    }

    #[tokio::test]
    async fn test_production_exposes_expected_message() {
        let funnel = FailureFunnel::new(Environment::Production);
        let response = funnel.render(&Rejection::not_found("/missing"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(
            body,
            json!({"status": "fail", "message": "Can't find /missing on this server!"})
        );
    }

    #[tokio::test]
    async fn test_development_shows_message_and_stack() {
        let funnel = FailureFunnel::new(Environment::Development);
        let response = funnel.render(&server_fault());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "connection pool exhausted");
        assert_eq!(body["error"]["isExpected"], false);
        assert!(body["stack"].as_str().unwrap().contains("connection pool exhausted"));
    }

    #[tokio::test]
    async fn test_render_survives_any_status() {
        let funnel = FailureFunnel::new(Environment::Production);
        for code in [400u16, 401, 418, 429, 499, 500, 503, 599] {
            let response = funnel.render(&Rejection::with_code(code, "x"));
            assert_eq!(response.status().as_u16(), code);
        }
    }
}
