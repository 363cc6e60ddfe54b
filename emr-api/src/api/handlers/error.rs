use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use emr_domain::errors::ServiceError;

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a not found error response
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    /// Create a validation error response
    pub fn validation_error(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            details,
            ..Self::new("validation_error", message)
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("conflict", message)
    }

    /// Upstream service could not be reached
    pub fn bad_gateway(error: &str, message: impl Into<String>) -> Self {
        Self::new(error, message)
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self::new("internal_error", "An unexpected error occurred")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" | "bad_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "conflict" => StatusCode::CONFLICT,
            "bad_gateway" | "ai_gateway_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ErrorResponse::validation_error(msg, None),
            ServiceError::NotFound(msg) => ErrorResponse::not_found(msg),
            ServiceError::Conflict(msg) => ErrorResponse::conflict(msg),
            ServiceError::Unauthorized(msg) => ErrorResponse::unauthorized(msg),
            ServiceError::Upstream(msg) => ErrorResponse::bad_gateway("bad_gateway", msg),
            ServiceError::Repository(msg) | ServiceError::Internal(msg) => {
                error!("Service failure: {}", msg);
                ErrorResponse::internal_error()
            },
        }
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Request body rejected: {}", rejection.body_text());
        ErrorResponse::bad_request(rejection.body_text())
    }
}

/// Convert a service error into the error handlers return
pub fn service_error(err: ServiceError) -> ErrorResponse {
    let response = ErrorResponse::from(err);
    if response.status().is_client_error() {
        warn!("Request rejected: {} ({})", response.message, response.error);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = vec![
            (ServiceError::Validation("mrn and name are required".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("patient 9 not found".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("mrn already exists".into()), StatusCode::CONFLICT),
            (ServiceError::Unauthorized("invalid credentials".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Upstream("gateway down".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::Repository("disk I/O error".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(service_error(err).status(), expected);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = ErrorResponse::from(ServiceError::Internal("stack trace".into()));
        assert_eq!(response.error, "internal_error");
        assert!(!response.message.contains("stack trace"));
    }

    #[test]
    fn conflict_keeps_service_message() {
        let response = ErrorResponse::from(ServiceError::Conflict("mrn already exists".into()));
        assert_eq!(response.message, "mrn already exists");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
