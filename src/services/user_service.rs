//! Domain service for user accounts.
//!
//! Handles registration, credential checks and account lookups.

use thiserror::Error;

use crate::db::User;

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Username or email already in use")]
    DuplicateIdentity,

    #[error("Invalid username or password")]
    InvalidCredential,

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for user accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an account with a hashed password and a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::DuplicateIdentity`] if the username or email is taken,
    /// [`UserError::Validation`] if a field is malformed.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError>;

    /// Verifies credentials and returns the matching user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredential`] for an unknown username and for
    /// a wrong password alike.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, UserError>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, UserError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;
}
