//! Store configuration.
//!
//! Configuration-driven backend selection.

use crate::store::backend::BackendType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default journal location.
pub const DEFAULT_JOURNAL_PATH: &str = "sla_journal.jsonl";

/// Durability layer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend type to use
    pub backend: BackendType,
    /// Journal file (journal backend only)
    pub journal_path: PathBuf,
    /// fsync after every append
    pub sync_writes: bool,
    /// Rewrite the journal as per-order snapshots after a restore
    pub compact_on_restore: bool,
}

impl StoreConfig {
    /// In-memory store.
    pub fn memory() -> Self {
        Self {
            backend: BackendType::Memory,
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            sync_writes: false,
            compact_on_restore: true,
        }
    }

    /// Journal store at `path`.
    pub fn journal(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendType::Journal,
            journal_path: path.into(),
            sync_writes: true,
            compact_on_restore: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::memory()
    }
}
