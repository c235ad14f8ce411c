use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{FileRecord, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
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

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub file_count: u64,
}

impl ProfileResponse {
    pub fn new(user: User, file_count: u64) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            created_at: format_timestamp(&user.created_at),
            file_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    pub message: String,
}

/// Public metadata of a file. Never carries the content or the password hash.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataResponse {
    pub file_id: String,
    pub original_file_name: String,
    pub file_size: u64,
    pub user_id: String,
    pub has_password: bool,
    pub download_limit: Option<i32>,
    pub download_count: i32,
    pub expiry_date: Option<String>,
    pub created_at: String,
}

impl From<FileRecord> for FileMetadataResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            has_password: record.is_password_protected(),
            file_id: record.file_id,
            original_file_name: record.original_file_name,
            file_size: record.file_size,
            user_id: record.owner_user_id,
            download_limit: record.download_limit,
            download_count: record.download_count,
            expiry_date: record.expiry_date.as_ref().map(format_timestamp),
            created_at: format_timestamp(&record.created_at),
        }
    }
}

/// Entry of the caller's own file listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFileResponse {
    pub file_id: String,
    pub original_file_name: String,
    pub is_password_protected: bool,
    pub download_limit: Option<i32>,
    pub download_count: i32,
    pub expiry_date: Option<String>,
    pub created_at: String,
}

impl From<FileRecord> for UserFileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            is_password_protected: record.is_password_protected(),
            file_id: record.file_id,
            original_file_name: record.original_file_name,
            download_limit: record.download_limit,
            download_count: record.download_count,
            expiry_date: record.expiry_date.as_ref().map(format_timestamp),
            created_at: format_timestamp(&record.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub password: Option<String>,
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
