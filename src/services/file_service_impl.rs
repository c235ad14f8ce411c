//! `SeaORM` implementation of the `FileService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::{FileRecord, NewFile, Store, StoredFile};
use crate::services::access_policy::{self, AccessDecision, DenialReason};
use crate::services::credentials;
use crate::services::file_service::{FileError, FileService, UploadRequest};

/// Used when the client sends no filename with the upload.
pub const DEFAULT_FILE_NAME: &str = "file";

pub struct SeaOrmFileService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmFileService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

/// Normalise an optional limit from the client.
///
/// A limit must be a positive 32-bit integer; anything else is rejected
/// rather than silently treated as unlimited.
pub fn normalize_download_limit(limit: Option<i64>) -> Result<Option<i32>, FileError> {
    match limit {
        None => Ok(None),
        Some(n) if n <= 0 => Err(FileError::Validation(
            "Download limit must be a positive number".to_string(),
        )),
        Some(n) => i32::try_from(n).map(Some).map_err(|_| {
            FileError::Validation(format!("Download limit cannot exceed {}", i32::MAX))
        }),
    }
}

#[async_trait]
impl FileService for SeaOrmFileService {
    async fn upload(&self, request: UploadRequest) -> Result<String, FileError> {
        let download_limit = normalize_download_limit(request.download_limit)?;

        let password_hash = match request.password.as_deref() {
            Some(password) if !password.trim().is_empty() => {
                Some(credentials::hash_password_blocking(password, &self.security).await?)
            }
            _ => None,
        };

        let original_file_name = if request.original_file_name.is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            request.original_file_name
        };

        let record = self
            .store
            .add_file(NewFile {
                original_file_name,
                content: request.content,
                owner_user_id: request.owner_user_id,
                password_hash,
                download_limit,
                expiry_date: request.expiry_date,
            })
            .await?;

        info!(
            file_id = %record.file_id,
            owner = %record.owner_user_id,
            size = record.file_size,
            protected = record.is_password_protected(),
            download_limit = ?record.download_limit,
            expiry = ?record.expiry_date,
            "File uploaded"
        );

        Ok(record.file_id)
    }

    async fn validate_access(
        &self,
        file: &FileRecord,
        supplied_password: Option<&str>,
    ) -> Result<AccessDecision, FileError> {
        let record = file.clone();
        let password = supplied_password.map(str::to_string);

        // Password verification is Argon2, keep it off the async workers
        task::spawn_blocking(move || {
            access_policy::validate_access(&record, password.as_deref(), Utc::now())
        })
        .await
        .map_err(|e| FileError::Internal(format!("Access check task panicked: {e}")))
    }

    async fn record_download(&self, file_id: &str) -> Result<(), FileError> {
        if !self.store.increment_download_count(file_id).await? {
            warn!(file_id, "Download recorded for a file that no longer exists");
        }
        Ok(())
    }

    async fn download(
        &self,
        file_id: &str,
        supplied_password: Option<&str>,
    ) -> Result<StoredFile, FileError> {
        let record = self
            .store
            .get_file_record(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        if let AccessDecision::Denied(reason) =
            self.validate_access(&record, supplied_password).await?
        {
            info!(file_id, reason = reason.as_str(), "Download denied");
            return Err(FileError::AccessDenied(reason));
        }

        if !self.store.try_consume_download(file_id).await? {
            if self.store.file_exists(file_id).await? {
                info!(file_id, "Download denied, limit reached concurrently");
                return Err(FileError::AccessDenied(DenialReason::LimitReached));
            }
            warn!(file_id, "File vanished after validation");
            return Err(FileError::NotFound);
        }

        let Some(file) = self.store.get_file(file_id).await? else {
            warn!(file_id, "File vanished after its download was counted");
            return Err(FileError::NotFound);
        };

        info!(file_id, "File downloaded");
        Ok(file)
    }

    async fn metadata(&self, file_id: &str) -> Result<FileRecord, FileError> {
        self.store
            .get_file_record(file_id)
            .await?
            .ok_or(FileError::NotFound)
    }

    async fn list_for_owner(&self, owner_user_id: &str) -> Result<Vec<FileRecord>, FileError> {
        Ok(self.store.list_files_for_owner(owner_user_id).await?)
    }

    async fn count_for_owner(&self, owner_user_id: &str) -> Result<u64, FileError> {
        Ok(self.store.file_count_for_owner(owner_user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_download_limit() {
        assert_eq!(normalize_download_limit(None).unwrap(), None);
        assert_eq!(normalize_download_limit(Some(1)).unwrap(), Some(1));
        assert_eq!(normalize_download_limit(Some(500)).unwrap(), Some(500));
    }

    #[test]
    fn test_non_positive_limit_is_rejected() {
        assert!(matches!(
            normalize_download_limit(Some(0)),
            Err(FileError::Validation(_))
        ));
        assert!(matches!(
            normalize_download_limit(Some(-3)),
            Err(FileError::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_limit_is_rejected() {
        assert!(normalize_download_limit(Some(i64::from(i32::MAX))).is_ok());
        assert!(normalize_download_limit(Some(i64::from(i32::MAX) + 1)).is_err());
    }
}
