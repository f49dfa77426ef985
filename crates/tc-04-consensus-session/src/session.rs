//! # Consensus Session
//!
//! `process()` fans out one broadcast task per operator into a `JoinSet` and
//! suspends on two events only: the threshold watch channel flipping to
//! `true`, or the block context ending. Whichever resolves the session first
//! is recorded in the phase under the state lock, so a result that lands
//! after resolution can never change the outcome.
//!
//! `record_result` is the fan-in point. It is synchronous: signature checks
//! run before the lock, the critical section only deduplicates, pins the
//! response and adds weight.

use crate::domain::certificate::Certificate;
use crate::domain::errors::{ConsensusError, ConsensusResult};
use crate::domain::operator::{OperatorPeer, OperatorSet};
use crate::domain::result::{RecordOutcome, RejectReason, TaskResult, TaskSubmission};
use crate::domain::threshold::Threshold;
use crate::ports::outbound::OperatorTransport;
use parking_lot::Mutex;
use shared_types::{format_address, Address, Hash, Task};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tc_02_block_context::{BlockContext, ContextError};
use tc_03_signature_schemes::{
    keccak256, result_signing_message, task_payload_digest, PublicKeyBytes, SignatureBytes,
    SignatureScheme, SignatureShare,
};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    Broadcasting,
    ThresholdMet,
    DeadlineExceeded,
    Cancelled,
}

impl SessionPhase {
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            SessionPhase::ThresholdMet | SessionPhase::DeadlineExceeded | SessionPhase::Cancelled
        )
    }
}

struct SessionState {
    phase: SessionPhase,
    /// Accepted results by operator.
    results: BTreeMap<Address, TaskResult>,
    signed_weight: u128,
    /// Output digest fixed by the first accepted result.
    response_digest: Option<Hash>,
}

struct SessionInner {
    session_id: Uuid,
    task: Task,
    operator_set: OperatorSet,
    threshold: Threshold,
    scheme: Arc<dyn SignatureScheme>,
    state: Mutex<SessionState>,
    results_received: AtomicUsize,
    threshold_tx: watch::Sender<bool>,
}

impl SessionInner {
    fn record_result(&self, result: TaskResult) -> RecordOutcome {
        self.results_received.fetch_add(1, Ordering::Relaxed);
        let operator = result.operator_address;

        let outcome = match self.check_result(&result) {
            Err(reason) => RecordOutcome::Rejected(reason),
            Ok(weight) => self.merge(result, weight),
        };

        match &outcome {
            RecordOutcome::Accepted {
                signed_weight,
                threshold_met,
            } => debug!(
                session = %self.session_id,
                task_id = %self.task.task_id,
                "[tc-04] Accepted result from {} (signed {}/{}, met: {})",
                format_address(&operator),
                signed_weight,
                self.operator_set.total_weight(),
                threshold_met
            ),
            RecordOutcome::Rejected(reason) => warn!(
                session = %self.session_id,
                task_id = %self.task.task_id,
                "[tc-04] Rejected result: {}",
                reason
            ),
        }
        outcome
    }

    /// Lock-free validation. Returns the operator's weight.
    fn check_result(&self, result: &TaskResult) -> Result<u128, RejectReason> {
        if result.task_id != self.task.task_id {
            return Err(RejectReason::WrongTask {
                expected: self.task.task_id.clone(),
                actual: result.task_id.clone(),
            });
        }
        let operator = self
            .operator_set
            .get(&result.operator_address)
            .ok_or(RejectReason::UnknownOperator(result.operator_address))?;
        if keccak256(&result.output) != result.output_digest {
            return Err(RejectReason::DigestMismatch);
        }

        let message = result_signing_message(&result.task_id, &result.output_digest);
        self.scheme
            .verify(&message, &result.signature, &operator.public_key)
            .map_err(|e| RejectReason::InvalidSignature(e.to_string()))?;
        Ok(operator.weight)
    }

    fn merge(&self, result: TaskResult, weight: u128) -> RecordOutcome {
        let mut state = self.state.lock();
        if state.phase.is_resolved() {
            return RecordOutcome::Rejected(RejectReason::SessionClosed);
        }
        if state.results.contains_key(&result.operator_address) {
            return RecordOutcome::Rejected(RejectReason::Duplicate(result.operator_address));
        }
        match state.response_digest {
            Some(pinned) if pinned != result.output_digest => {
                return RecordOutcome::Rejected(RejectReason::ResponseMismatch);
            }
            Some(_) => {}
            None => state.response_digest = Some(result.output_digest),
        }

        state.signed_weight = state.signed_weight.saturating_add(weight);
        state.results.insert(result.operator_address, result);

        let signed_weight = state.signed_weight;
        let threshold_met = self
            .threshold
            .is_met(signed_weight, self.operator_set.total_weight());
        if threshold_met {
            state.phase = SessionPhase::ThresholdMet;
            self.threshold_tx.send_replace(true);
        }
        RecordOutcome::Accepted {
            signed_weight,
            threshold_met,
        }
    }

    fn build_certificate(&self) -> ConsensusResult<Certificate> {
        let (results, signed_weight, response_digest) = {
            let state = self.state.lock();
            (
                state.results.clone(),
                state.signed_weight,
                state.response_digest.unwrap_or_default(),
            )
        };

        let message = result_signing_message(&self.task.task_id, &response_digest);
        let shares: Vec<SignatureShare> = results
            .values()
            .filter_map(|result| {
                let operator = self.operator_set.get(&result.operator_address)?;
                Some(SignatureShare {
                    signer: operator.address,
                    public_key: operator.public_key.clone(),
                    signature: result.signature.clone(),
                })
            })
            .collect();
        let aggregate = self.scheme.aggregate_and_verify(&message, &shares)?;

        let signers: Vec<Address> = results.keys().copied().collect();
        let non_signers: Vec<Address> = self
            .operator_set
            .members()
            .map(|op| op.address)
            .filter(|address| !results.contains_key(address))
            .collect();
        let response = results
            .values()
            .next()
            .map(|result| result.output.clone())
            .unwrap_or_default();

        Ok(Certificate {
            task_id: self.task.task_id.clone(),
            session_id: self.session_id,
            response_digest,
            response,
            signers,
            non_signers,
            signed_weight,
            total_weight: self.operator_set.total_weight(),
            threshold_bips: self.threshold.bips(),
            curve: self.scheme.curve(),
            aggregate,
        })
    }
}

/// A single consensus attempt for one task.
pub struct ConsensusSession {
    inner: Arc<SessionInner>,
    ctx: BlockContext,
    transport: Arc<dyn OperatorTransport>,
    submission: Arc<TaskSubmission>,
    processed: AtomicBool,
}

impl ConsensusSession {
    /// Build a session for `task`, resolving its operator set from `peers`.
    ///
    /// `aggregator_signature` is the aggregator's signature over
    /// `task_payload_digest(&task)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task: Task,
        aggregator_signature: SignatureBytes,
        aggregator_public_key: PublicKeyBytes,
        peers: &[OperatorPeer],
        scheme: Arc<dyn SignatureScheme>,
        transport: Arc<dyn OperatorTransport>,
        ctx: BlockContext,
    ) -> ConsensusResult<Self> {
        let operator_set = OperatorSet::resolve(peers, task.operator_set_id, scheme.as_ref())?;
        let threshold = Threshold::new(task.threshold_bips)?;
        let (threshold_tx, _) = watch::channel(false);
        let submission = Arc::new(TaskSubmission {
            task_digest: task_payload_digest(&task),
            task: task.clone(),
            aggregator_signature,
            aggregator_public_key,
        });

        let inner = Arc::new(SessionInner {
            session_id: Uuid::new_v4(),
            task,
            operator_set,
            threshold,
            scheme,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Created,
                results: BTreeMap::new(),
                signed_weight: 0,
                response_digest: None,
            }),
            results_received: AtomicUsize::new(0),
            threshold_tx,
        });

        debug!(
            session = %inner.session_id,
            task_id = %inner.task.task_id,
            "[tc-04] Session created: {} operators, total weight {}, threshold {} bips (needs {})",
            inner.operator_set.len(),
            inner.operator_set.total_weight(),
            threshold.bips(),
            threshold.required_weight(inner.operator_set.total_weight())
        );

        Ok(Self {
            inner,
            ctx,
            transport,
            submission,
            processed: AtomicBool::new(false),
        })
    }

    /// Broadcast and wait for the threshold or the end of the block context.
    pub async fn process(&self) -> ConsensusResult<Certificate> {
        if self.processed.swap(true, Ordering::SeqCst) {
            return Err(ConsensusError::AlreadyProcessed);
        }
        let inner = &self.inner;
        let mut threshold_rx = inner.threshold_tx.subscribe();

        if let Some(cause) = self.ctx.err() {
            return Err(self.expire(cause));
        }
        {
            let mut state = inner.state.lock();
            if state.phase == SessionPhase::Created {
                state.phase = SessionPhase::Broadcasting;
            }
        }

        let mut broadcasts = JoinSet::new();
        for operator in inner.operator_set.members().cloned() {
            let inner = Arc::clone(inner);
            let transport = Arc::clone(&self.transport);
            let submission = Arc::clone(&self.submission);
            broadcasts.spawn(async move {
                match transport.submit_task(&operator, &submission).await {
                    Ok(result) => {
                        inner.record_result(result);
                    }
                    Err(e) => warn!(
                        session = %inner.session_id,
                        task_id = %inner.task.task_id,
                        "[tc-04] Broadcast to {} failed: {}",
                        format_address(&operator.address),
                        e
                    ),
                }
            });
        }
        info!(
            session = %inner.session_id,
            task_id = %inner.task.task_id,
            "[tc-04] Broadcast task to {} operators",
            inner.operator_set.len()
        );

        let ended = tokio::select! {
            biased;
            _ = threshold_rx.wait_for(|met| *met) => None,
            cause = self.ctx.done() => Some(cause),
        };
        broadcasts.abort_all();

        if let Some(cause) = ended {
            if inner.state.lock().phase != SessionPhase::ThresholdMet {
                return Err(self.expire(cause));
            }
        }

        let certificate = inner.build_certificate()?;
        info!(
            session = %inner.session_id,
            task_id = %inner.task.task_id,
            "[tc-04] Threshold met: {} signers, weight {}/{}",
            certificate.signers.len(),
            certificate.signed_weight,
            certificate.total_weight
        );
        Ok(certificate)
    }

    /// Feed one operator response into the session.
    pub fn record_result(&self, result: TaskResult) -> RecordOutcome {
        self.inner.record_result(result)
    }

    /// Mark the session expired unless the threshold already won the race.
    fn expire(&self, cause: ContextError) -> ConsensusError {
        let mut state = self.inner.state.lock();
        if !state.phase.is_resolved() {
            state.phase = match cause {
                ContextError::Cancelled => SessionPhase::Cancelled,
                ContextError::DeadlineExceeded => SessionPhase::DeadlineExceeded,
            };
        }
        warn!(
            session = %self.inner.session_id,
            task_id = %self.inner.task.task_id,
            "[tc-04] Session ended without threshold ({}): weight {}/{}",
            cause,
            state.signed_weight,
            self.inner.operator_set.total_weight()
        );
        cause.into()
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn task(&self) -> &Task {
        &self.inner.task
    }

    pub fn operator_set(&self) -> &OperatorSet {
        &self.inner.operator_set
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.lock().phase
    }

    pub fn signed_weight(&self) -> u128 {
        self.inner.state.lock().signed_weight
    }

    /// Results delivered so far, accepted or not.
    pub fn results_received(&self) -> usize {
        self.inner.results_received.load(Ordering::Relaxed)
    }

    /// Signed weight at which `process` resolves with a certificate.
    pub fn required_weight(&self) -> u128 {
        self.inner
            .threshold
            .required_weight(self.inner.operator_set.total_weight())
    }

    pub fn is_threshold_met(&self) -> bool {
        *self.inner.threshold_tx.borrow()
    }

    pub fn context(&self) -> &BlockContext {
        &self.ctx
    }
}
