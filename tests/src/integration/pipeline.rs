//! # Task Pipeline Flows
//!
//! Chain task -> consensus session over loopback operators -> certificate
//! -> store transitions, for both signature curves.

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use aggregator_runtime::adapters::LoopbackNetwork;
    use aggregator_runtime::TaskOutcome;
    use shared_types::{unix_now, CurveType, TaskId, TaskStatus};
    use std::collections::HashSet;
    use std::sync::Arc;
    use tc_01_state_store::{InMemoryStateStore, StateStore};
    use tc_03_signature_schemes::{
        keccak256, result_signing_message, scheme_for, AggregateSignature, PublicKeyBytes,
        SignatureBytes,
    };
    use tc_04_consensus_session::OperatorDirectory;

    async fn three_of_four(curve: CurveType) {
        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(&config(curve), store.clone(), None);

        let outcome = stack.aggregator.process_task(task("t1", 100)).await.unwrap();
        let certificate = match outcome {
            TaskOutcome::Completed(certificate) => certificate,
            other => panic!("expected a certificate, got {other:?}"),
        };

        // 4 x 100 weight at 7500 bips: the third signer resolves the session
        assert_eq!(certificate.signers.len(), 3);
        assert_eq!(certificate.non_signers.len(), 1);
        assert_eq!(certificate.signed_weight, 300);
        assert_eq!(certificate.total_weight, 400);
        assert_eq!(certificate.curve, curve);
        assert_eq!(certificate.aggregate.signer_count(), 3);

        let expected = LoopbackNetwork::expected_output(&task("t1", 100));
        assert_eq!(certificate.response, expected);
        assert_eq!(certificate.response_digest, keccak256(&expected));

        assert_eq!(
            store.get_task(&TaskId::new("t1")).unwrap().status,
            TaskStatus::Completed
        );
        assert_eq!(stack.sink.task_ids(), vec![TaskId::new("t1")]);
    }

    #[tokio::test]
    async fn test_three_of_four_bls() {
        three_of_four(CurveType::Bls12381).await;
    }

    #[tokio::test]
    async fn test_three_of_four_ecdsa() {
        three_of_four(CurveType::Ecdsa).await;
    }

    #[tokio::test]
    async fn test_bls_aggregate_verifies_against_signer_keys() {
        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(&config(CurveType::Bls12381), store, None);
        let TaskOutcome::Completed(certificate) =
            stack.aggregator.process_task(task("t1", 100)).await.unwrap()
        else {
            panic!("expected a certificate");
        };

        let AggregateSignature::Bls12381 {
            signature,
            aggregate_public_key,
            ..
        } = &certificate.aggregate
        else {
            panic!("expected a BLS aggregate");
        };
        let message = result_signing_message(&certificate.task_id, &certificate.response_digest);
        let scheme = scheme_for(CurveType::Bls12381);
        assert!(scheme
            .verify(
                &message,
                &SignatureBytes(signature.bytes.to_vec()),
                &PublicKeyBytes(aggregate_public_key.bytes.to_vec()),
            )
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_of_four_fails_at_deadline() {
        let config = config(CurveType::Ecdsa);
        let network =
            Arc::new(LoopbackNetwork::new(&config.avs, &config.loopback).unwrap());
        let peers = network.get_operator_peers(&avs(), 1, 0).await.unwrap();
        let responders: HashSet<_> = peers.iter().take(2).map(|p| p.operator_address).collect();
        let transport = Arc::new(SelectiveTransport {
            inner: network,
            responders,
        });

        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(&config, store.clone(), Some(transport));
        let mut t1 = task("t1", 100);
        t1.deadline_unix_seconds = Some(unix_now() + 30);

        let outcome = stack.aggregator.process_task(t1).await.unwrap();
        assert!(matches!(outcome, TaskOutcome::Failed(reason) if reason.contains("Deadline")));
        assert_eq!(
            store.get_task(&TaskId::new("t1")).unwrap().status,
            TaskStatus::Failed
        );
        assert!(stack.sink.certificates.lock().is_empty());
    }

    #[tokio::test]
    async fn test_tasks_in_one_block_run_independently() {
        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(&config(CurveType::Ecdsa), store.clone(), None);

        let (a, b) = tokio::join!(
            stack.aggregator.process_task(task("a", 100)),
            stack.aggregator.process_task(task("b", 100)),
        );
        assert!(matches!(a.unwrap(), TaskOutcome::Completed(_)));
        assert!(matches!(b.unwrap(), TaskOutcome::Completed(_)));
        assert_eq!(stack.sink.task_ids(), vec![TaskId::new("a"), TaskId::new("b")]);
        assert!(store.list_pending_tasks().unwrap().is_empty());
    }
}
