use crate::models::MessageResponse;
use crate::services::auth_service::AuthError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use thiserror::Error;

/// Errors surfaced at the handler boundary. The display text is the
/// `message` sent to the client, so it never carries internal detail.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid credential; the cause is deliberately not exposed.
    #[error("Unauthorized access")]
    Unauthenticated,
    #[error("Forbidden access")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Logs `source` and keeps only the public `message`.
    pub fn internal(message: &str, source: impl fmt::Display) -> Self {
        log::error!("❌ {}: {}", message, source);
        AppError::Internal(message.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(MessageResponse::new(self.to_string()))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => {
                log::warn!("🔒 Rejected credential: {}", err);
                AppError::Unauthenticated
            }
            AuthError::Authority(_) => AppError::internal("Failed to verify credentials", err),
            AuthError::Signing(_) => AppError::internal("Token generation failed", err),
        }
    }
}
