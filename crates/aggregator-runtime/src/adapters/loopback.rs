//! # Loopback Operator Network
//!
//! In-process operators seeded from fixed keys. Serves as both the operator
//! directory and the transport, so the binary can run without a peering
//! layer. Each operator echoes `keccak256(payload)` as its result.

use crate::config::{AvsConfig, LoopbackConfig};
use crate::errors::AggregatorResult;
use async_trait::async_trait;
use shared_types::{normalize_avs, Address, CurveType, Task};
use std::collections::HashMap;
use std::sync::Arc;
use tc_03_signature_schemes::{
    keccak256, result_signing_message, scheme_for, signer_from_seed, task_payload_digest,
    TaskSigner,
};
use tc_04_consensus_session::{
    DirectoryError, Operator, OperatorDirectory, OperatorPeer, OperatorSetMembership,
    OperatorTransport, TaskResult, TaskSubmission, TransportError,
};
use tracing::debug;

/// Address an operator signs under.
///
/// ECDSA keys already are addresses; BLS keys map to the low 20 bytes of
/// their keccak hash.
pub fn operator_address(signer: &dyn TaskSigner) -> Address {
    let key = signer.public_key();
    let mut address = [0u8; 20];
    match signer.curve() {
        CurveType::Ecdsa => address.copy_from_slice(&key.as_bytes()[..20]),
        CurveType::Bls12381 => address.copy_from_slice(&keccak256(key.as_bytes())[12..]),
    }
    address
}

struct LoopbackOperator {
    address: Address,
    signer: Arc<dyn TaskSigner>,
    weight: u128,
}

/// Seeded directory plus transport.
pub struct LoopbackNetwork {
    /// Normalized AVS address to curve.
    curves: HashMap<String, CurveType>,
    operators: HashMap<CurveType, Vec<LoopbackOperator>>,
}

impl LoopbackNetwork {
    pub fn new(avs: &[AvsConfig], config: &LoopbackConfig) -> AggregatorResult<Self> {
        let curves: HashMap<String, CurveType> =
            avs.iter().map(|a| (a.key(), a.curve_type)).collect();

        let mut operators = HashMap::new();
        for curve in [CurveType::Bls12381, CurveType::Ecdsa] {
            if !curves.values().any(|c| *c == curve) {
                continue;
            }
            let mut members = Vec::with_capacity(config.operator_count);
            for i in 0..config.operator_count {
                let signer = signer_from_seed(curve, format!("loopback-{curve}-{i}").as_bytes())?;
                members.push(LoopbackOperator {
                    address: operator_address(signer.as_ref()),
                    signer,
                    weight: config.operator_weight,
                });
            }
            operators.insert(curve, members);
        }

        Ok(Self { curves, operators })
    }

    /// The result every loopback operator computes.
    pub fn expected_output(task: &Task) -> Vec<u8> {
        keccak256(&task.payload).to_vec()
    }

    pub fn operator_count(&self, curve: CurveType) -> usize {
        self.operators.get(&curve).map_or(0, Vec::len)
    }

    fn find(&self, address: &Address) -> Option<&LoopbackOperator> {
        self.operators
            .values()
            .flatten()
            .find(|op| op.address == *address)
    }
}

#[async_trait]
impl OperatorDirectory for LoopbackNetwork {
    async fn get_operator_peers(
        &self,
        avs_address: &str,
        operator_set_id: u32,
        _reference_timestamp: u64,
    ) -> Result<Vec<OperatorPeer>, DirectoryError> {
        let not_found = || DirectoryError::NotFound {
            avs_address: avs_address.to_string(),
            operator_set_id,
        };
        let curve = self
            .curves
            .get(&normalize_avs(avs_address))
            .ok_or_else(not_found)?;
        let members = self.operators.get(curve).ok_or_else(not_found)?;

        Ok(members
            .iter()
            .map(|op| OperatorPeer {
                operator_address: op.address,
                socket: format!("loopback://{}", hex::encode(op.address)),
                memberships: vec![OperatorSetMembership {
                    operator_set_id,
                    weight: op.weight,
                    public_key: op.signer.public_key(),
                    curve_type: *curve,
                }],
            })
            .collect())
    }
}

#[async_trait]
impl OperatorTransport for LoopbackNetwork {
    async fn submit_task(
        &self,
        operator: &Operator,
        submission: &TaskSubmission,
    ) -> Result<TaskResult, TransportError> {
        let op = self
            .find(&operator.address)
            .ok_or_else(|| TransportError::Unreachable(operator.socket.clone()))?;

        let task = &submission.task;
        if submission.task_digest != task_payload_digest(task) {
            return Err(TransportError::Rejected("task digest mismatch".to_string()));
        }
        scheme_for(op.signer.curve())
            .verify(
                &submission.task_digest,
                &submission.aggregator_signature,
                &submission.aggregator_public_key,
            )
            .map_err(|e| TransportError::Rejected(format!("aggregator signature: {e}")))?;

        let output = Self::expected_output(task);
        let output_digest = keccak256(&output);
        let signature = op
            .signer
            .sign(&result_signing_message(&task.task_id, &output_digest))
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        debug!(
            task_id = %task.task_id,
            "[loopback] Operator {} answered",
            hex::encode(op.address)
        );
        Ok(TaskResult {
            task_id: task.task_id.clone(),
            operator_address: op.address,
            output,
            output_digest,
            signature,
        })
    }
}
