//! # Aggregator Runtime Library
//!
//! Wiring for the task consensus engine. The `main.rs` binary is a thin
//! shell over [`Aggregator`].
//!
//! ## Modules
//!
//! - `config` - Layered configuration (defaults, JSON file, environment)
//! - `logging` - Tracing subscriber setup
//! - `ports` - Chain events in, certificates out
//! - `aggregator` - Task pipeline, reorg handling, crash recovery, event loop
//! - `adapters` - Loopback operator network and logging sink

pub mod adapters;
pub mod aggregator;
pub mod config;
pub mod errors;
pub mod logging;
pub mod ports;

pub use aggregator::{Aggregator, BlockOutcome, TaskOutcome};
pub use config::{AggregatorConfig, AvsConfig, ConfigError};
pub use errors::{AggregatorError, AggregatorResult};
pub use logging::init_logging;
pub use ports::{CertificateSink, ChainEvent};
