//! The typed failure value every stage and handler group produces.
//!
//! # Design Decisions
//! - The expected/unexpected split is an explicit discriminant, never
//!   inferred from which fields happen to be set
//! - Immutable once built: no setters, only constructors
//! - The backtrace is captured at construction so the funnel can show
//!   where the failure originated, not where it was rendered
//! - Unexpected failures always capture one; expected ones only when
//!   `RUST_BACKTRACE` asks for it

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;

/// Whether a rejection was raised on purpose or escaped unanticipated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionKind {
    /// Raised by validation or policy; the message is safe for clients.
    Expected,
    /// Anything else; the message must not leave the process in production.
    Unexpected,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::Expected => "expected",
            RejectionKind::Unexpected => "unexpected",
        }
    }
}

/// Client-visible classification, derived from the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    /// 4xx
    Fail,
    /// Everything else.
    Error,
}

impl StatusClass {
    pub fn for_status(code: StatusCode) -> Self {
        if code.is_client_error() {
            StatusClass::Fail
        } else {
            StatusClass::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Fail => "fail",
            StatusClass::Error => "error",
        }
    }
}

/// A request failure on its way to the failure funnel.
pub struct Rejection {
    message: String,
    status_code: StatusCode,
    kind: RejectionKind,
    trace: Backtrace,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Rejection {
    /// A deliberate client-fault rejection with a message safe to expose.
    pub fn expected(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            kind: RejectionKind::Expected,
            trace: Backtrace::capture(),
            source: None,
        }
    }

    /// Like [`Rejection::expected`], but from a raw status number.
    /// Anything that is not an error status (below 400 or out of range)
    /// becomes 500.
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        let status = match StatusCode::from_u16(code) {
            Ok(status) if status.is_client_error() || status.is_server_error() => status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::expected(status, message)
    }

    /// An unanticipated server fault wrapping the underlying error.
    pub fn unexpected<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            kind: RejectionKind::Unexpected,
            trace: Backtrace::force_capture(),
            source: Some(Box::new(error)),
        }
    }

    /// An unanticipated server fault described only by a message
    /// (e.g. a panic payload).
    pub fn unexpected_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            kind: RejectionKind::Unexpected,
            trace: Backtrace::force_capture(),
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::expected(StatusCode::BAD_REQUEST, message)
    }

    /// The not-found interceptor's rejection for `original_url`.
    pub fn not_found(original_url: &str) -> Self {
        Self::expected(
            StatusCode::NOT_FOUND,
            format!("Can't find {original_url} on this server!"),
        )
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::expected(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn payload_too_large(limit_bytes: usize) -> Self {
        Self::expected(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds the {limit_bytes} byte limit"),
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::for_status(self.status_code)
    }

    pub fn kind(&self) -> RejectionKind {
        self.kind
    }

    pub fn is_expected(&self) -> bool {
        self.kind == RejectionKind::Expected
    }

    /// Message, source chain and backtrace, for operators only.
    pub fn diagnostics(&self) -> String {
        let mut out = format!("Rejection: {}", self.message);
        let mut cause: Option<&(dyn StdError + 'static)> = self.source();
        // `unexpected` copies the source's message; don't print it twice.
        if cause.is_some_and(|err| err.to_string() == self.message) {
            cause = cause.and_then(|err| err.source());
        }
        while let Some(err) = cause {
            out.push_str(&format!("\n  caused by: {err}"));
            cause = err.source();
        }
        if self.trace.status() == BacktraceStatus::Captured {
            out.push('\n');
            out.push_str(&self.trace.to_string());
        }
        out
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejection")
            .field("message", &self.message)
            .field("status_code", &self.status_code.as_u16())
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status_code.as_u16())
    }
}

impl StdError for Rejection {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
