//! Domain service for shared files.
//!
//! Owns the upload policy, the download gate and download accounting.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::{FileRecord, StoredFile};
use crate::services::access_policy::{AccessDecision, DenialReason};

/// Errors specific to file operations.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found")]
    NotFound,

    #[error("Access denied")]
    AccessDenied(DenialReason),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for FileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Caller-supplied parameters for a new upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub content: Vec<u8>,
    pub original_file_name: String,
    pub owner_user_id: String,
    pub password: Option<String>,
    pub download_limit: Option<i64>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Domain service trait for shared files.
#[async_trait::async_trait]
pub trait FileService: Send + Sync {
    /// Stores a new file and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Validation`] if `download_limit` is not positive.
    async fn upload(&self, request: UploadRequest) -> Result<String, FileError>;

    /// Runs the download gate against the record as it is now.
    async fn validate_access(
        &self,
        file: &FileRecord,
        supplied_password: Option<&str>,
    ) -> Result<AccessDecision, FileError>;

    /// Adds one to the download counter; a missing file is ignored.
    async fn record_download(&self, file_id: &str) -> Result<(), FileError>;

    /// Validates access and counts the download in one step.
    ///
    /// The content is read only once the download has been counted.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`] for an unknown id and
    /// [`FileError::AccessDenied`] when the gate refuses, including when a
    /// concurrent download consumed the last allowed slot.
    async fn download(
        &self,
        file_id: &str,
        supplied_password: Option<&str>,
    ) -> Result<StoredFile, FileError>;

    async fn metadata(&self, file_id: &str) -> Result<FileRecord, FileError>;

    async fn list_for_owner(&self, owner_user_id: &str) -> Result<Vec<FileRecord>, FileError>;

    async fn count_for_owner(&self, owner_user_id: &str) -> Result<u64, FileError>;
}
