use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ResultEnvelope;
use crate::services::{AuthError, DomainValidationError, ServiceError};

pub const UNAUTHORIZED_MESSAGE: &str = "The login and password combination is incorrect!";
pub const INVALID_TOKEN_MESSAGE: &str = "A valid bearer token is required.";
pub const APPLICATION_ERROR_MESSAGE: &str =
    "An internal application error occurred, please try again.";

/// Failure outcomes of an API call, each rendered as a `success=false` envelope
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    DomainValidation {
        message: String,
        errors: Vec<String>,
    },

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Missing or invalid bearer token")]
    InvalidToken,

    /// The detail is logged, never returned to the caller
    #[error("Application error: {0}")]
    Application(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DomainValidation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Application(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainValidationError> for ApiError {
    fn from(err: DomainValidationError) -> Self {
        ApiError::DomainValidation {
            message: err.message,
            errors: err.errors,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(domain) => domain.into(),
            other => ApiError::Application(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized,
            AuthError::InvalidToken | AuthError::TokenExpired => ApiError::InvalidToken,
            AuthError::Internal(detail) => ApiError::Application(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let envelope = match self {
            ApiError::DomainValidation { message, errors } => {
                let errors = (!errors.is_empty()).then_some(errors);
                ResultEnvelope::failure(message, errors)
            }
            ApiError::Unauthorized => ResultEnvelope::failure(UNAUTHORIZED_MESSAGE, None),
            ApiError::InvalidToken => ResultEnvelope::failure(INVALID_TOKEN_MESSAGE, None),
            ApiError::Application(detail) => {
                tracing::error!(error = %detail, "Unhandled application error");
                ResultEnvelope::failure(APPLICATION_ERROR_MESSAGE, None)
            }
        };

        (status, Json(envelope)).into_response()
    }
}
