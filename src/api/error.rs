//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::crypto::PasswordError;
use crate::prediction::PredictionError;
use crate::store::StoreError;

/// Error body for data routes.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<&'static str>,
}

/// Failure body for the login and registration forms.
#[derive(Debug, Serialize)]
pub struct AuthFailure {
    pub success: bool,
    pub message: &'static str,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Missing required fields: [{}]", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidCredentials => {
                return auth_failure(StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            ApiError::UsernameTaken => {
                return auth_failure(StatusCode::BAD_REQUEST, "Username already exists")
            }
            ApiError::MissingFields(fields) => {
                let body = ErrorBody {
                    error: format!("Missing required fields: [{}]", fields.join(", ")),
                    code: "MISSING_FIELDS",
                    missing_fields: fields,
                };
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code,
            missing_fields: Vec::new(),
        };
        (status, Json(body)).into_response()
    }
}

fn auth_failure(status: StatusCode, message: &'static str) -> Response {
    (
        status,
        Json(AuthFailure {
            success: false,
            message,
        }),
    )
        .into_response()
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::MissingFields(fields) => ApiError::MissingFields(fields),
            e @ PredictionError::InvalidFeature { .. } => ApiError::BadRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(_) => ApiError::UsernameTaken,
            StoreError::PatientNotFound(_) => ApiError::NotFound("Patient not found".into()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ApiError::Internal(format!("session: {err}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
