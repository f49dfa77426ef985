//! # Adapters Layer
//!
//! - `memory` - `InMemoryStateStore`
//! - `rocksdb_store` - `RocksDbStateStore` (feature `rocksdb`)
//! - `sweeper` - Tokio task driving periodic compaction

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod conformance;

pub use memory::InMemoryStateStore;
#[cfg(feature = "rocksdb")]
pub use rocksdb_store::RocksDbStateStore;

use crate::domain::config::{StoreBackend, StoreConfig};
use crate::domain::errors::StoreResult;
use crate::ports::inbound::StateStore;
use std::sync::Arc;

/// Open the backend selected by `config`.
pub fn open_state_store(config: &StoreConfig) -> StoreResult<Arc<dyn StateStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStateStore::new())),
        #[cfg(feature = "rocksdb")]
        StoreBackend::RocksDb => Ok(Arc::new(RocksDbStateStore::open(config.rocksdb.clone())?)),
        #[cfg(not(feature = "rocksdb"))]
        StoreBackend::RocksDb => Err(crate::domain::errors::StoreError::Database(
            "built without the rocksdb feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::TaskStatus;

    #[test]
    fn test_open_memory_backend() {
        let store = open_state_store(&StoreConfig::in_memory()).unwrap();
        assert!(store.list_tasks_with_status(TaskStatus::Pending).unwrap().is_empty());
    }

    #[cfg(feature = "rocksdb")]
    #[test]
    fn test_open_rocksdb_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = open_state_store(&StoreConfig::rocksdb(dir.path())).unwrap();
        store
            .save_pending_task(&conformance::sample_task("0x01", "0xavs"))
            .unwrap();
        assert_eq!(store.list_pending_tasks().unwrap().len(), 1);
        store.close().unwrap();
    }
}
