use std::sync::Arc;

use anyhow::Context;

use crate::auth::{password::PasswordHasher, services::Authenticator};
use crate::config::AppConfig;
use crate::db;
use crate::import::Importer;
use crate::storage::{SqliteUserStore, UserStore};

/// Everything one command invocation needs, built from the config.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<SqliteUserStore>,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Opens the store and makes sure the `users` table exists.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config.database_path).await?;
        Self::from_pool(db, config).await
    }

    pub async fn from_pool(db: sqlx::SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let store = match SqliteUserStore::new(db.clone()).await {
            Ok(store) => store,
            Err(e) => {
                db.close().await;
                return Err(e).context("probe sqlite version");
            }
        };
        if let Err(e) = store.ensure_schema().await {
            store.close().await;
            return Err(e).context("create users table");
        }
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            hasher,
        })
    }

    pub fn importer(&self) -> Importer {
        Importer::new(self.store.clone(), self.hasher.clone())
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.store.clone(), self.hasher.clone())
    }

    /// Flushes and closes the pool.
    pub async fn close(&self) {
        self.store.close().await;
    }
}
