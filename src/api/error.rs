use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ErrorResponse;
use crate::services::{FileError, UserError};

#[derive(Debug)]
pub enum ApiError {
    /// No session, or the session expired
    Unauthenticated(String),

    NotFound(String),

    /// Download refused by the access policy
    AccessDenied(String),

    DuplicateIdentity(String),

    InvalidCredential(String),

    ValidationError(String),

    PayloadTooLarge(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated(msg) => write!(f, "Unauthenticated: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::AccessDenied(msg) => write!(f, "Access denied: {msg}"),
            Self::DuplicateIdentity(msg) => write!(f, "Duplicate identity: {msg}"),
            Self::InvalidCredential(msg) => write!(f, "Invalid credential: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::PayloadTooLarge(msg) => write!(f, "Payload too large: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::AccessDenied(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::DuplicateIdentity(msg)
            | Self::InvalidCredential(msg)
            | Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateIdentity => Self::DuplicateIdentity(err.to_string()),
            UserError::InvalidCredential => Self::InvalidCredential(err.to_string()),
            UserError::NotFound => Self::NotFound(err.to_string()),
            UserError::Validation(msg) => Self::ValidationError(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound => Self::NotFound(err.to_string()),
            FileError::AccessDenied(_) => Self::AccessDenied(err.to_string()),
            FileError::Validation(msg) => Self::ValidationError(msg),
            FileError::Database(msg) => Self::DatabaseError(msg),
            FileError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Not authenticated".to_string())
    }

    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{resource} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DenialReason;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::unauthenticated(), StatusCode::UNAUTHORIZED),
            (ApiError::not_found("File"), StatusCode::NOT_FOUND),
            (
                ApiError::from(FileError::AccessDenied(DenialReason::Expired)),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(UserError::DuplicateIdentity),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(UserError::InvalidCredential),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::validation("bad"), StatusCode::BAD_REQUEST),
            (ApiError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_denial_reason_is_not_exposed() {
        for reason in [
            DenialReason::Expired,
            DenialReason::LimitReached,
            DenialReason::PasswordRequired,
            DenialReason::WrongPassword,
        ] {
            let ApiError::AccessDenied(msg) = ApiError::from(FileError::AccessDenied(reason))
            else {
                panic!("expected AccessDenied");
            };
            assert_eq!(msg, "Access denied");
        }
    }
}
