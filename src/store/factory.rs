//! Store factory.
//!
//! Creates durability backends based on configuration.

use crate::core::Result;
use crate::store::backend::{BackendType, OrderStore};
use crate::store::backends::{JournalStore, MemoryStore};
use crate::store::config::StoreConfig;
use std::sync::Arc;

/// Create a store from configuration.
///
/// Returns an Arc-wrapped backend for shared ownership.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn OrderStore>> {
    match config.backend {
        BackendType::Memory => Ok(Arc::new(MemoryStore::new()) as Arc<dyn OrderStore>),
        BackendType::Journal => {
            let store = JournalStore::open(&config.journal_path, config.sync_writes).await?;
            Ok(Arc::new(store) as Arc<dyn OrderStore>)
        }
    }
}
