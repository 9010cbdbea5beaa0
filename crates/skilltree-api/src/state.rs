//! Application state wiring the hierarchy service to its SQLite store.
//!
//! The service is generic over the repository trait; AppState pins it to the
//! concrete infra implementation. Shared by CLI commands and REST handlers.

use std::path::PathBuf;
use std::sync::Arc;

use skilltree_core::service::hierarchy::HierarchyService;
use skilltree_infra::config::{load_global_config, resolve_data_dir};
use skilltree_infra::sqlite::pool::{DatabasePool, database_url};
use skilltree_infra::sqlite::skill::SqliteSkillRepository;
use skilltree_types::config::GlobalConfig;

/// Hierarchy service pinned to the SQLite repository.
pub type ConcreteHierarchyService = HierarchyService<SqliteSkillRepository>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub hierarchy: Arc<ConcreteHierarchyService>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config, open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        tracing::debug!(data_dir = %data_dir.display(), "application state ready");
        Ok(Self::from_parts(db_pool, config, data_dir))
    }

    /// Wire state from an already-open pool.
    pub fn from_parts(db_pool: DatabasePool, config: GlobalConfig, data_dir: PathBuf) -> Self {
        let hierarchy = HierarchyService::new(SqliteSkillRepository::new(db_pool))
            .with_storage_retries(config.hierarchy.storage_retries);

        Self {
            hierarchy: Arc::new(hierarchy),
            config,
            data_dir,
        }
    }
}
