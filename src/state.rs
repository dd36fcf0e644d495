use crate::config::{AppConfig, StoreKind};
use crate::repo::{MemoryRepository, PgRepository, Repository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Arc<dyn Repository>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repo = match config.store {
            StoreKind::Postgres => {
                let pg = PgRepository::connect(&config.database).await?;
                pg.migrate().await?;
                Arc::new(pg) as Arc<dyn Repository>
            }
            StoreKind::Memory => {
                tracing::warn!("using the in-memory store; data is lost on exit");
                Arc::new(MemoryRepository::new()) as Arc<dyn Repository>
            }
        };

        Ok(Self::from_parts(config, repo))
    }

    pub fn from_parts(config: Arc<AppConfig>, repo: Arc<dyn Repository>) -> Self {
        Self { config, repo }
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "STORE" => Some("memory".into()),
            _ => None,
        })
        .expect("memory config");
        Self::from_parts(Arc::new(config), Arc::new(MemoryRepository::new()))
    }

    pub async fn close(&self) {
        self.repo.close().await;
    }
}
