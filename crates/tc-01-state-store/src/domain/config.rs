//! # Store Configuration

use std::path::PathBuf;
use std::time::Duration;

/// Which backend the runtime opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local maps; data is lost on exit.
    Memory,
    /// RocksDB at `RocksDbConfig::path`.
    #[default]
    RocksDb,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(StoreBackend::Memory),
            "rocksdb" | "lsm" => Ok(StoreBackend::RocksDb),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Configuration for the state store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub rocksdb: RocksDbConfig,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            rocksdb: RocksDbConfig::default(),
        }
    }

    pub fn rocksdb(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::RocksDb,
            rocksdb: RocksDbConfig {
                path: path.into(),
                ..Default::default()
            },
        }
    }
}

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Create the database if missing.
    pub create_if_missing: bool,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    pub max_write_buffer_number: i32,
    /// fsync every write batch.
    pub sync_writes: bool,
    /// Interval between background compaction passes.
    pub gc_interval: Duration,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/state"),
            create_if_missing: true,
            write_buffer_size: 16 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
            gc_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl RocksDbConfig {
    /// Small buffers and a short GC interval, for tests.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            write_buffer_size: 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
            gc_interval: Duration::from_millis(50),
        }
    }

    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }
}
