//! # Persistent State Store (tc-01)
//!
//! Durable record of every task the aggregator has seen and every block it
//! has processed, per AVS. This store is the crash-recovery anchor for the
//! consensus engine: a task left in `processing` after a restart is one whose
//! session died with the process.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Strict Lifecycle | Status changes follow `TaskStatus::can_transition_to` only |
//! | 2 | Unique Tasks | A second `save_pending_task` for the same id is `AlreadyExists` |
//! | 3 | AVS Isolation | Block records of distinct AVSs never alias |
//! | 4 | Derived Cursor | The last processed block is the highest stored record |
//! | 5 | Closed Is Final | Every call after `close()` is `StoreClosed` (close itself is idempotent) |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors, key layout, configuration
//! - `ports/` - The `StateStore` port consumed by the runtime
//! - `adapters/` - `InMemoryStateStore` and `RocksDbStateStore`
//!
//! ## Usage
//!
//! ```ignore
//! use tc_01_state_store::{open_state_store, StoreConfig};
//!
//! let store = open_state_store(&StoreConfig::in_memory())?;
//! store.save_pending_task(&task)?;
//! store.update_task_status(&task.task_id, TaskStatus::Processing)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{open_state_store, InMemoryStateStore};
#[cfg(feature = "rocksdb")]
pub use adapters::RocksDbStateStore;
pub use domain::config::{RocksDbConfig, StoreBackend, StoreConfig};
pub use domain::errors::{StoreError, StoreResult};
pub use ports::inbound::StateStore;
