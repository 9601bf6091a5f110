//! Durability Layer
//!
//! Trait-based journal supporting:
//! - In-memory storage
//! - Append-only JSON lines file

pub mod backend;
pub mod backends;
pub mod config;
pub mod factory;

pub use backend::{BackendType, IngestRecord, JournalRecord, OrderSnapshot, OrderStore};
pub use backends::{JournalStore, MemoryStore};
pub use config::StoreConfig;
pub use factory::create_store;
