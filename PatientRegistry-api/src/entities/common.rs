use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::ToSchema;

use patient_registry_domain::services::PatientServiceError;

/// Plain message returned by informational and successful mutating endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error response format for API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level details for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a not found error response
    pub fn not_found(message: &str) -> Self {
        Self {
            error: "not_found".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create a validation error response
    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: "validation_error".to_string(),
            message: message.to_string(),
            details,
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: &str) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An unexpected error occurred".to_string(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::UNPROCESSABLE_ENTITY,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<PatientServiceError> for ErrorResponse {
    fn from(err: PatientServiceError) -> Self {
        match err {
            PatientServiceError::Validation(report) => {
                ErrorResponse::validation_error("Validation failed", Some(json!(report)))
            }
            PatientServiceError::NotFound(_) => ErrorResponse::not_found("Patient not found"),
            PatientServiceError::AlreadyExists(_) => {
                ErrorResponse::bad_request("Patient already exists")
            }
            PatientServiceError::InvalidSortField(_) => {
                ErrorResponse::bad_request("Invalid sort field")
            }
            PatientServiceError::InvalidSortOrder(_) => {
                ErrorResponse::bad_request("Invalid sort order")
            }
            PatientServiceError::Repository(e) => {
                error!("Patient registry storage failure: {}", e);
                ErrorResponse::internal_error()
            }
        }
    }
}
