use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::file::{FileRecord, NewFile, StoredFile};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    // ========== User Repository Methods ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(user_id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().exists_by_username(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().exists_by_email(email).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<Option<User>> {
        self.user_repo().create(new_user).await
    }

    // ========== File Repository Methods ==========

    #[must_use]
    pub fn file_repo(&self) -> repositories::file::FileRepository {
        repositories::file::FileRepository::new(self.conn.clone())
    }

    pub async fn add_file(&self, new_file: NewFile) -> Result<FileRecord> {
        self.file_repo().insert(new_file).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<Option<StoredFile>> {
        self.file_repo().get(file_id).await
    }

    pub async fn get_file_record(&self, file_id: &str) -> Result<Option<FileRecord>> {
        self.file_repo().get_record(file_id).await
    }

    pub async fn list_files_for_owner(&self, owner_user_id: &str) -> Result<Vec<FileRecord>> {
        self.file_repo().list_for_owner(owner_user_id).await
    }

    pub async fn file_count_for_owner(&self, owner_user_id: &str) -> Result<u64> {
        self.file_repo().count_for_owner(owner_user_id).await
    }

    pub async fn increment_download_count(&self, file_id: &str) -> Result<bool> {
        self.file_repo().increment_download_count(file_id).await
    }

    pub async fn try_consume_download(&self, file_id: &str) -> Result<bool> {
        self.file_repo().try_consume_download(file_id).await
    }

    pub async fn file_exists(&self, file_id: &str) -> Result<bool> {
        self.file_repo().exists(file_id).await
    }
}
