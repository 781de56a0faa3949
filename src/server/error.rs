/// HTTP error handling and response formatting.
///
/// This module maps the application error taxonomy onto transport-level
/// status codes: unreachable database to 502, database-side failures to
/// 500 with the classification and message in the body, bad input to 400,
/// unknown demos or tables to 404.

use crate::core::OralabError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable classification (connection, script, query, ...).
    pub kind: String,
    /// Database error code, when the failure carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl ErrorResponse {
    fn new(kind: impl Into<String>, error: impl Into<String>) -> Self {
        ErrorResponse {
            kind: kind.into(),
            error: error.into(),
            code: None,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Database or configuration failure from the core.
    Core(OralabError),
    /// The requested demo or table does not exist.
    NotFound(String),
    /// Malformed or missing request input.
    BadRequest(String),
    /// Internal server error (e.g. a panicked blocking task).
    Internal(String),
}

impl From<OralabError> for ApiError {
    fn from(e: OralabError) -> Self {
        ApiError::Core(e)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Core(e) => write!(f, "{}", e),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Core(e) => {
                let status = match &e {
                    OralabError::Connection(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let code = match &e {
                    OralabError::Script { code, .. } => *code,
                    _ => None,
                };
                let mut body = ErrorResponse::new(e.kind(), e.to_string());
                body.code = code;
                (status, body)
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("not_found", msg))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg))
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal", "Internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
