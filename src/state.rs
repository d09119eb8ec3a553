use crate::config::AppConfig;
use crate::storage::{MarketStore, MemoryStore, PgStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects to PostgreSQL and applies migrations, or falls back to the
    /// in-memory store when no database is configured.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, config.db_max_connections).await?;
                pg.migrate().await?;
                tracing::info!("connected to postgres, migrations applied");
                Arc::new(pg) as Arc<dyn MarketStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is not persisted");
                Arc::new(MemoryStore::new()) as Arc<dyn MarketStore>
            }
        };

        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn MarketStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(AppConfig::default()),
        )
    }
}
