//! # Outbound Ports
//!
//! Dependencies the session and runtime need from collaborators. The wire
//! format behind them is not this crate's concern.

use crate::domain::operator::{Operator, OperatorPeer};
use crate::domain::result::{TaskResult, TaskSubmission};
use async_trait::async_trait;
use thiserror::Error;

/// Failures of a single operator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Operator unreachable: {0}")]
    Unreachable(String),

    #[error("Operator rejected task: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Point-to-point "submit task, receive signed result".
#[async_trait]
pub trait OperatorTransport: Send + Sync {
    async fn submit_task(
        &self,
        operator: &Operator,
        submission: &TaskSubmission,
    ) -> Result<TaskResult, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("No operators registered for avs {avs_address} set {operator_set_id}")]
    NotFound {
        avs_address: String,
        operator_set_id: u32,
    },

    #[error("Operator directory unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the weighted operator peers for an AVS operator set.
#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    /// Peers as of `reference_timestamp`.
    async fn get_operator_peers(
        &self,
        avs_address: &str,
        operator_set_id: u32,
        reference_timestamp: u64,
    ) -> Result<Vec<OperatorPeer>, DirectoryError>;
}
