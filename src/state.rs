use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{FileService, SeaOrmFileService, SeaOrmUserService, UserService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub file_service: Arc<dyn FileService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService>;

        let file_service = Arc::new(SeaOrmFileService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn FileService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            user_service,
            file_service,
        })
    }
}
