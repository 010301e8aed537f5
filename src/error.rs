use aide::OperationOutput;
use axum::{http::StatusCode, response::IntoResponse, Json};
use schemars::JsonSchema;
use serde_json::json;

/// Represent request-time errors of the web service
///
/// All `ServiceError`s can be transformed to http errors.
#[derive(Debug, Clone, JsonSchema)]
pub enum ServiceError {
    InternalServerError(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ServiceError {}

/// Helper for `ServiceError` result
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<anyhow::Error> for ServiceError {
    fn from(error: anyhow::Error) -> Self {
        ServiceError::InternalServerError(format!("{error:#}"))
    }
}

impl OperationOutput for ServiceError {
    type Inner = String;
}
impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceError::InternalServerError(ref cause) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "cause": cause })),
            ),
        }
        .into_response()
    }
}

/// A protocol module was installed without one of its required handlers.
///
/// Raised once while composing the router, never while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HandlerNotFoundError: handler '{handler}' is required by {module}")]
pub struct HandlerNotFoundError {
    pub handler: &'static str,
    pub module: &'static str,
}

impl HandlerNotFoundError {
    pub fn new(handler: &'static str, module: &'static str) -> Self {
        Self { handler, module }
    }
}

/// The authorization failure status of an endpoint table must be
/// `401 Unauthorized` or `403 Forbidden`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unauthorized status must be 401 or 403, got {0}")]
pub struct UnsupportedStatusError(pub u16);

/// Error type handlers report failures with.
pub type HandlerError = anyhow::Error;

/// Helper for handler results
pub type HandlerResult<T> = Result<T, HandlerError>;
