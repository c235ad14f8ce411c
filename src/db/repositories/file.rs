use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};

use crate::entities::{files, prelude::*};

/// Everything about a stored file except its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub file_id: String,
    pub original_file_name: String,
    pub owner_user_id: String,
    pub password_hash: Option<String>,
    pub download_limit: Option<i32>,
    pub download_count: i32,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub file_size: u64,
}

impl FileRecord {
    #[must_use]
    pub const fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// A file record together with its payload.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub record: FileRecord,
    pub content: Vec<u8>,
}

impl From<files::Model> for StoredFile {
    fn from(model: files::Model) -> Self {
        let file_size = model.content.len() as u64;

        Self {
            record: FileRecord {
                file_id: model.file_id,
                original_file_name: model.original_file_name,
                owner_user_id: model.owner_user_id,
                password_hash: model.password_hash,
                download_limit: model.download_limit,
                download_count: model.download_count,
                expiry_date: model.expiry_date,
                created_at: model.created_at,
                file_size,
            },
            content: model.content,
        }
    }
}

/// Fields supplied at upload; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_file_name: String,
    pub content: Vec<u8>,
    pub owner_user_id: String,
    pub password_hash: Option<String>,
    pub download_limit: Option<i32>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Row shape for queries that leave the content column unread.
#[derive(Debug, FromQueryResult)]
struct FileRecordRow {
    file_id: String,
    original_file_name: String,
    owner_user_id: String,
    password_hash: Option<String>,
    download_limit: Option<i32>,
    download_count: i32,
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    file_size: i64,
}

impl From<FileRecordRow> for FileRecord {
    fn from(row: FileRecordRow) -> Self {
        Self {
            file_id: row.file_id,
            original_file_name: row.original_file_name,
            owner_user_id: row.owner_user_id,
            password_hash: row.password_hash,
            download_limit: row.download_limit,
            download_count: row.download_count,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
            file_size: u64::try_from(row.file_size).unwrap_or_default(),
        }
    }
}

pub struct FileRepository {
    conn: DatabaseConnection,
}

impl FileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn select_record() -> sea_orm::Select<Files> {
        Files::find()
            .select_only()
            .columns([
                files::Column::FileId,
                files::Column::OriginalFileName,
                files::Column::OwnerUserId,
                files::Column::PasswordHash,
                files::Column::DownloadLimit,
                files::Column::DownloadCount,
                files::Column::ExpiryDate,
                files::Column::CreatedAt,
            ])
            .column_as(Expr::cust("LENGTH(content)"), "file_size")
    }

    pub async fn insert(&self, new_file: NewFile) -> Result<FileRecord> {
        let record = FileRecord {
            file_id: uuid::Uuid::new_v4().to_string(),
            original_file_name: new_file.original_file_name,
            owner_user_id: new_file.owner_user_id,
            password_hash: new_file.password_hash,
            download_limit: new_file.download_limit,
            download_count: 0,
            expiry_date: new_file.expiry_date,
            created_at: Utc::now(),
            file_size: new_file.content.len() as u64,
        };

        let active_model = files::ActiveModel {
            file_id: Set(record.file_id.clone()),
            original_file_name: Set(record.original_file_name.clone()),
            content: Set(new_file.content),
            owner_user_id: Set(record.owner_user_id.clone()),
            password_hash: Set(record.password_hash.clone()),
            download_limit: Set(record.download_limit),
            download_count: Set(0),
            expiry_date: Set(record.expiry_date),
            created_at: Set(record.created_at),
        };

        Files::insert(active_model)
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert file")?;

        Ok(record)
    }

    /// Load a file including its content.
    pub async fn get(&self, file_id: &str) -> Result<Option<StoredFile>> {
        let file = Files::find_by_id(file_id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query file")?;

        Ok(file.map(StoredFile::from))
    }

    /// Load a file's record without reading its content.
    pub async fn get_record(&self, file_id: &str) -> Result<Option<FileRecord>> {
        let row = Self::select_record()
            .filter(files::Column::FileId.eq(file_id))
            .into_model::<FileRecordRow>()
            .one(&self.conn)
            .await
            .context("Failed to query file metadata")?;

        Ok(row.map(FileRecord::from))
    }

    /// Newest first, content never loaded.
    pub async fn list_for_owner(&self, owner_user_id: &str) -> Result<Vec<FileRecord>> {
        let rows = Self::select_record()
            .filter(files::Column::OwnerUserId.eq(owner_user_id))
            .order_by_desc(files::Column::CreatedAt)
            .into_model::<FileRecordRow>()
            .all(&self.conn)
            .await
            .context("Failed to list files for owner")?;

        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    pub async fn count_for_owner(&self, owner_user_id: &str) -> Result<u64> {
        Files::find()
            .filter(files::Column::OwnerUserId.eq(owner_user_id))
            .count(&self.conn)
            .await
            .context("Failed to count files for owner")
    }

    /// Unconditionally add one to the download counter.
    ///
    /// Returns `false` if no such file exists.
    pub async fn increment_download_count(&self, file_id: &str) -> Result<bool> {
        let result = Files::update_many()
            .col_expr(
                files::Column::DownloadCount,
                Expr::col(files::Column::DownloadCount).add(1),
            )
            .filter(files::Column::FileId.eq(file_id))
            .exec(&self.conn)
            .await
            .context("Failed to increment download count")?;

        Ok(result.rows_affected > 0)
    }

    /// Add one to the download counter only while it is below the limit.
    ///
    /// The check and the increment are a single UPDATE, so concurrent
    /// callers can never push the count past `download_limit`. Returns
    /// `false` if the limit was already reached or the file is gone.
    pub async fn try_consume_download(&self, file_id: &str) -> Result<bool> {
        let result = Files::update_many()
            .col_expr(
                files::Column::DownloadCount,
                Expr::col(files::Column::DownloadCount).add(1),
            )
            .filter(files::Column::FileId.eq(file_id))
            .filter(
                Condition::any()
                    .add(files::Column::DownloadLimit.is_null())
                    .add(
                        Expr::col(files::Column::DownloadCount)
                            .lt(Expr::col(files::Column::DownloadLimit)),
                    ),
            )
            .exec(&self.conn)
            .await
            .context("Failed to record download")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn exists(&self, file_id: &str) -> Result<bool> {
        let count = Files::find_by_id(file_id.to_string())
            .count(&self.conn)
            .await
            .context("Failed to check file existence")?;

        Ok(count > 0)
    }
}
