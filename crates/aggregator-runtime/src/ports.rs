//! # Runtime Ports
//!
//! Inbound chain events and the outbound certificate sink.

use async_trait::async_trait;
use shared_types::{BlockRecord, Task};
use tc_04_consensus_session::Certificate;

/// What the chain poller emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A qualifying task-creation event.
    TaskCreated(Task),
    /// A block observed for `avs`.
    NewBlock { avs: String, block: BlockRecord },
}

/// Destination for certificates, typically the on-chain result submitter.
#[async_trait]
pub trait CertificateSink: Send + Sync {
    async fn submit(&self, task: &Task, certificate: &Certificate) -> Result<(), String>;
}
