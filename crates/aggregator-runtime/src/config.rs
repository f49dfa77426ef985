//! # Aggregator Configuration
//!
//! Layered: built-in defaults, then an optional JSON file (`TC_CONFIG_FILE`),
//! then environment overrides.
//!
//! ## Environment Variables
//!
//! - `TC_CONFIG_FILE`: JSON config file
//! - `TC_DATA_DIR`: storage directory (default: ./data)
//! - `TC_STORE_BACKEND`: `memory` or `rocksdb` (default: rocksdb)
//! - `TC_BLOCK_RETENTION`: blocks kept per AVS and chain (default: 256)
//! - `TC_LOG_LEVEL` or `RUST_LOG`: log filter (default: info)
//! - `TC_JSON_LOGS`: JSON log output (default: false)

use serde::{Deserialize, Serialize};
use shared_types::{normalize_avs, CurveType};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tc_01_state_store::{RocksDbConfig, StoreBackend, StoreConfig};
use tc_02_block_context::BlockContextConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Unknown store backend: {0}")]
    InvalidBackend(String),

    #[error("No AVS configured")]
    NoAvs,

    #[error("AVS {0} configured more than once")]
    DuplicateAvs(String),

    #[error("AVS {avs} has no chains or lists chain id 0")]
    InvalidChains { avs: String },

    #[error("AVS {0} has no aggregator signing key")]
    MissingSigningKey(String),

    #[error("Block retention must be at least 1")]
    ZeroRetention,
}

/// One AVS served by this aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvsConfig {
    /// AVS address, any case.
    pub address: String,
    pub curve_type: CurveType,
    /// Chains polled for this AVS.
    pub chain_ids: Vec<u64>,
    /// Hex-encoded aggregator secret key for `curve_type`.
    pub signing_key: String,
}

impl AvsConfig {
    /// A throwaway ECDSA AVS on a local devnet chain.
    pub fn development() -> Self {
        Self {
            address: "0x00000000000000000000000000000000000a75de".to_string(),
            curve_type: CurveType::Ecdsa,
            chain_ids: vec![31_337],
            signing_key: hex::encode([0x11u8; 32]),
        }
    }

    pub fn key(&self) -> String {
        normalize_avs(&self.address)
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `rocksdb`.
    pub backend: String,
    pub data_dir: PathBuf,
    pub sync_writes: bool,
    /// Background compaction interval in seconds.
    pub gc_interval_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "rocksdb".to_string(),
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
            gc_interval_secs: 300,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Loopback operator network used when the binary runs standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    pub operator_count: usize,
    pub operator_weight: u128,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            operator_count: 4,
            operator_weight: 100,
        }
    }
}

/// Complete aggregator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub storage: StorageSettings,
    pub avs: Vec<AvsConfig>,
    /// Blocks kept per AVS and chain before pruning.
    pub block_retention: u64,
    /// Block context sweep interval in seconds.
    pub sweep_interval_secs: u64,
    pub logging: LoggingConfig,
    pub loopback: LoopbackConfig,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            avs: Vec::new(),
            block_retention: 256,
            sweep_interval_secs: 300,
            logging: LoggingConfig::default(),
            loopback: LoopbackConfig::default(),
        }
    }
}

impl AggregatorConfig {
    /// In-memory store, one development AVS, short intervals.
    pub fn for_testing() -> Self {
        Self {
            storage: StorageSettings {
                backend: "memory".to_string(),
                gc_interval_secs: 1,
                ..Default::default()
            },
            avs: vec![AvsConfig::development()],
            block_retention: 16,
            sweep_interval_secs: 1,
            ..Default::default()
        }
    }

    /// Defaults, then `TC_CONFIG_FILE` if set, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var("TC_CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply `TC_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| env::var(var).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup("TC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("TC_STORE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Some(value) = lookup("TC_BLOCK_RETENTION") {
            self.block_retention = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "TC_BLOCK_RETENTION",
                value,
            })?;
        }
        if let Some(level) = lookup("TC_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.logging.level = level;
        }
        if let Some(value) = lookup("TC_JSON_LOGS") {
            self.logging.json = value.eq_ignore_ascii_case("true") || value == "1";
        }
        Ok(())
    }

    /// Reject configurations the runtime cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_backend()?;
        if self.block_retention == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        if self.avs.is_empty() {
            return Err(ConfigError::NoAvs);
        }

        let mut seen = HashSet::new();
        for avs in &self.avs {
            if !seen.insert(avs.key()) {
                return Err(ConfigError::DuplicateAvs(avs.address.clone()));
            }
            if avs.chain_ids.is_empty() || avs.chain_ids.contains(&0) {
                return Err(ConfigError::InvalidChains {
                    avs: avs.address.clone(),
                });
            }
            if avs.signing_key.trim().is_empty() {
                return Err(ConfigError::MissingSigningKey(avs.address.clone()));
            }
        }
        Ok(())
    }

    fn store_backend(&self) -> Result<StoreBackend, ConfigError> {
        self.storage
            .backend
            .parse()
            .map_err(|_| ConfigError::InvalidBackend(self.storage.backend.clone()))
    }

    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        Ok(StoreConfig {
            backend: self.store_backend()?,
            rocksdb: RocksDbConfig {
                path: self.storage.data_dir.join("state"),
                sync_writes: self.storage.sync_writes,
                gc_interval: Duration::from_secs(self.storage.gc_interval_secs.max(1)),
                ..Default::default()
            },
        })
    }

    pub fn block_context_config(&self) -> BlockContextConfig {
        BlockContextConfig::default()
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs.max(1)))
    }
}
