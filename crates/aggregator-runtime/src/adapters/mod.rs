//! # Adapters Layer
//!
//! - `loopback` - In-process operator directory and transport
//! - `LogSink` - Certificate sink that only logs

pub mod loopback;

use crate::ports::CertificateSink;
use async_trait::async_trait;
use shared_types::Task;
use tc_04_consensus_session::Certificate;
use tracing::info;

pub use loopback::{operator_address, LoopbackNetwork};

/// Logs each certificate instead of submitting it on chain.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl CertificateSink for LogSink {
    async fn submit(&self, task: &Task, certificate: &Certificate) -> Result<(), String> {
        info!(
            task_id = %task.task_id,
            session = %certificate.session_id,
            "[sink] Certificate: {} signers, weight {}/{}, response 0x{}",
            certificate.signers.len(),
            certificate.signed_weight,
            certificate.total_weight,
            hex::encode(certificate.response_digest)
        );
        Ok(())
    }
}
