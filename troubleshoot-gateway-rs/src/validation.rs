//! Gateway Request Validation and Error Envelope
//!
//! Every failure leaves the gateway as `{error, details}` with a status that
//! matches its kind. POST routes under `/api/` only accept JSON bodies.

use axum::body::{Body, Bytes};
use axum::http::{header::CONTENT_TYPE, HeaderMap, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use llm_client::LLMError;
use scenario_store::StoreError;
use serde::Serialize;
use serde_json::Value;

use crate::pipeline::PipelineError;

/// Maximum request payload size (1MB)
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Error envelope returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    /// The model provider failed; `message` is the provider's own message
    #[error("{message}")]
    Upstream { message: String, details: String },

    #[error("Content type must be {0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    NotFound(String),

    /// Body exceeded the limit, in bytes
    #[error("Request payload too large")]
    PayloadTooLarge(usize),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, details: Option<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } | ApiError::Upstream { .. } => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::BadRequest { details, .. } | ApiError::Internal { details, .. } => details.clone(),
            ApiError::Upstream { details, .. } => Some(details.clone()),
            ApiError::PayloadTooLarge(limit) => {
                Some(format!("Request bodies are limited to {} bytes", limit))
            }
            ApiError::UnsupportedMediaType(_) | ApiError::NotFound(_) => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };

        if status.is_server_error() {
            tracing::error!("{}: {:?}", body.error, body.details);
        } else {
            tracing::debug!("Rejected request ({}): {}", status, body.error);
        }

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Input(reason) => {
                ApiError::bad_request("Invalid query provided", Some(reason.to_string()))
            }
            PipelineError::Upstream(e) => upstream(e),
            PipelineError::Parse(e) => ApiError::internal(e.public_message(), Some(e.detail())),
        }
    }
}

fn upstream(err: LLMError) -> ApiError {
    ApiError::Upstream {
        message: err.message().to_string(),
        details: err.to_string(),
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::InvalidRating(_) => ApiError::bad_request(err.to_string(), None),
            StoreError::Corrupt { .. } | StoreError::Database(_) => {
                ApiError::internal("Storage failure", Some(err.to_string()))
            }
        }
    }
}

/// Validate the Content-Type header
pub fn validate_content_type(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !content_type.starts_with(expected) {
        return Err(ApiError::UnsupportedMediaType(format!(
            "'{}', got '{}'",
            expected, content_type
        )));
    }

    Ok(())
}

/// Middleware rejecting POST bodies under `/api/` that are not JSON
pub async fn require_json_content_type(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    if req.method() == Method::POST && req.uri().path().starts_with("/api/") {
        validate_content_type(req.headers(), "application/json")?;
    }
    Ok(next.run(req).await)
}

/// Decode a raw request body, mapping malformed input to a 400 envelope
pub fn parse_json_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request("Invalid request format", Some(e.to_string())))
}

/// Request body limit layer
pub fn payload_limit_config() -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(MAX_PAYLOAD_SIZE)
}

/// Middleware replacing the plain-text 413 of the body limit with the error
/// envelope. Must sit outside `payload_limit_config()`.
pub async fn envelope_payload_too_large(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json(response.headers()) {
        return ApiError::PayloadTooLarge(MAX_PAYLOAD_SIZE).into_response();
    }
    response
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("application/json"))
}
