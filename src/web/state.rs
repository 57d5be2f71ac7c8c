use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::database::Database;
use crate::history::HistoryLedger;
use crate::strategy::NodeStore;

/// One loaded strategy document plus the change-history ledger. Loading a
/// new document replaces only the store; the ledger outlives re-parses.
#[derive(Default)]
pub struct Workspace {
    pub store: Option<NodeStore>,
    pub ledger: HistoryLedger,
}

#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<RwLock<Workspace>>,
    pub database: Option<Arc<Database>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, database: Option<Database>) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(Workspace::default())),
            database: database.map(Arc::new),
            config: Arc::new(config),
        }
    }

    /// Write the current ledger snapshot through to the database, when one
    /// is configured.
    pub async fn persist_history(&self) -> anyhow::Result<()> {
        if let Some(database) = &self.database {
            let workspace = self.workspace.read().await;
            database.save_history(workspace.ledger.entries()).await?;
        }
        Ok(())
    }
}
