//! In-memory backend implementation.
//!
//! Keeps the journal in a vector. Nothing survives a restart.

use crate::core::{Error, Result};
use crate::store::backend::{BackendType, JournalRecord, OrderStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-process journal.
pub struct MemoryStore {
    /// Appended records
    records: RwLock<Vec<JournalRecord>>,
    /// Connected flag; appends fail while unset
    available: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Mark the store reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn append(&self, record: &JournalRecord) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::StorageFailure("memory store unavailable".to_string()));
        }
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<JournalRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn compact(&self, records: &[JournalRecord]) -> Result<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::StorageFailure("memory store unavailable".to_string()));
        }
        *self.records.write().await = records.to_vec();
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}
