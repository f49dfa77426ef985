//! Shared fixtures and mock ports for the integration flows.

use aggregator_runtime::adapters::LoopbackNetwork;
use aggregator_runtime::{Aggregator, AggregatorConfig, AvsConfig, CertificateSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{unix_now, Address, BlockRecord, ChainId, CurveType, Task, TaskId};
use std::collections::HashSet;
use std::sync::Arc;
use tc_01_state_store::StateStore;
use tc_03_signature_schemes::BlsSigner;
use tc_04_consensus_session::{
    Certificate, Operator, OperatorTransport, TaskResult, TaskSubmission, TransportError,
};

pub const CHAIN: ChainId = ChainId(31_337);

/// Collects every certificate it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub certificates: Mutex<Vec<(TaskId, Certificate)>>,
}

impl RecordingSink {
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .certificates
            .lock()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}

#[async_trait]
impl CertificateSink for RecordingSink {
    async fn submit(&self, task: &Task, certificate: &Certificate) -> Result<(), String> {
        self.certificates
            .lock()
            .push((task.task_id.clone(), certificate.clone()));
        Ok(())
    }
}

/// Loopback operators of which only `responders` ever answer.
pub struct SelectiveTransport {
    pub inner: Arc<LoopbackNetwork>,
    pub responders: HashSet<Address>,
}

#[async_trait]
impl OperatorTransport for SelectiveTransport {
    async fn submit_task(
        &self,
        operator: &Operator,
        submission: &TaskSubmission,
    ) -> Result<TaskResult, TransportError> {
        if self.responders.contains(&operator.address) {
            self.inner.submit_task(operator, submission).await
        } else {
            std::future::pending().await
        }
    }
}

/// An operator network that never answers.
pub struct SilentTransport;

#[async_trait]
impl OperatorTransport for SilentTransport {
    async fn submit_task(
        &self,
        _operator: &Operator,
        _submission: &TaskSubmission,
    ) -> Result<TaskResult, TransportError> {
        std::future::pending().await
    }
}

/// Test configuration serving the development AVS on `curve`.
pub fn config(curve: CurveType) -> AggregatorConfig {
    let mut config = AggregatorConfig::for_testing();
    let avs = &mut config.avs[0];
    avs.curve_type = curve;
    if curve == CurveType::Bls12381 {
        let signer = BlsSigner::from_seed(b"aggregator").unwrap();
        avs.signing_key = format!("0x{}", hex::encode(signer.secret_bytes()));
    }
    config
}

pub fn avs() -> String {
    AvsConfig::development().address
}

pub fn task(id: &str, block: u64) -> Task {
    Task {
        task_id: TaskId::new(id),
        avs_address: avs(),
        operator_set_id: 1,
        chain_id: CHAIN,
        source_block_number: block,
        payload: format!("payload-{id}").into_bytes(),
        threshold_bips: 7_500,
        deadline_unix_seconds: Some(unix_now() + 600),
        ..Default::default()
    }
}

/// Block `number` on fork `fork`, chained to `number - 1` of the same fork.
pub fn block(number: u64, fork: u8) -> BlockRecord {
    let hash_of = |n: u64| {
        let mut hash = [fork; 32];
        hash[..8].copy_from_slice(&n.to_be_bytes());
        hash
    };
    BlockRecord {
        chain_id: CHAIN,
        number,
        hash: hash_of(number),
        parent_hash: hash_of(number.saturating_sub(1)),
        timestamp: 1_700_000_000 + number * 12,
    }
}

pub struct Stack {
    pub aggregator: Arc<Aggregator>,
    pub network: Arc<LoopbackNetwork>,
    pub sink: Arc<RecordingSink>,
}

/// Wire an aggregator over `store`. `transport` defaults to the loopback
/// network itself.
pub fn stack(
    config: &AggregatorConfig,
    store: Arc<dyn StateStore>,
    transport: Option<Arc<dyn OperatorTransport>>,
) -> Stack {
    let network = Arc::new(LoopbackNetwork::new(&config.avs, &config.loopback).unwrap());
    let transport: Arc<dyn OperatorTransport> = match transport {
        Some(transport) => transport,
        None => network.clone(),
    };
    let sink = Arc::new(RecordingSink::default());
    let aggregator =
        Aggregator::new(config, store, network.clone(), transport, sink.clone()).unwrap();
    Stack {
        aggregator: Arc::new(aggregator),
        network,
        sink,
    }
}
