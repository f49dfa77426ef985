//! # Restart Recovery Flows
//!
//! State left behind by a stopped aggregator is picked up from a durable
//! store on the next start.

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use shared_types::{CurveType, TaskId, TaskStatus};
    use std::sync::Arc;
    use tc_01_state_store::{RocksDbConfig, RocksDbStateStore, StateStore};
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn open(dir: &TempDir) -> Arc<RocksDbStateStore> {
        Arc::new(RocksDbStateStore::open(RocksDbConfig::for_testing(dir.path())).unwrap())
    }

    /// Leave one task stranded mid-session and one never started.
    fn leave_unfinished_work(dir: &TempDir) {
        let store = open(dir);
        store.save_pending_task(&task("stranded", 100)).unwrap();
        store
            .update_task_status(&TaskId::new("stranded"), TaskStatus::Processing)
            .unwrap();
        store.save_pending_task(&task("waiting", 100)).unwrap();
        store.save_block(&avs(), &block(100, 1)).unwrap();
        store.close().unwrap();
    }

    #[tokio::test]
    async fn test_restart_fails_stranded_and_resumes_pending() {
        let dir = TempDir::new().unwrap();
        leave_unfinished_work(&dir);

        let stack = stack(&config(CurveType::Ecdsa), open(&dir), None);
        let (tx, rx) = mpsc::channel(8);
        drop(tx);
        stack
            .aggregator
            .clone()
            .run(rx, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(stack.sink.task_ids(), vec![TaskId::new("waiting")]);

        let store = open(&dir);
        let status = |id: &str| store.get_task(&TaskId::new(id)).unwrap().status;
        assert_eq!(status("stranded"), TaskStatus::Failed);
        assert_eq!(status("waiting"), TaskStatus::Completed);
        assert!(store.list_pending_tasks().unwrap().is_empty());
        assert_eq!(
            store.get_last_processed_block(&avs(), CHAIN).unwrap(),
            block(100, 1)
        );
    }

    #[tokio::test]
    async fn test_shutdown_then_restart_does_not_rerun_failed_tasks() {
        let dir = TempDir::new().unwrap();
        let stack1 = stack(
            &config(CurveType::Bls12381),
            open(&dir),
            Some(Arc::new(SilentTransport)),
        );
        let (tx, rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(stack1.aggregator.clone().run(rx, shutdown.clone()));
        tx.send(aggregator_runtime::ChainEvent::TaskCreated(task("t1", 100)))
            .await
            .unwrap();

        let store = Arc::clone(stack1.aggregator.store());
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
        while store.get_task(&TaskId::new("t1")).map(|r| r.status).ok()
            != Some(TaskStatus::Processing)
        {
            assert!(tokio::time::Instant::now() < deadline, "t1 never started");
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        shutdown.cancel();
        runner.await.unwrap().unwrap();
        drop(store);
        drop(stack1);

        let stack2 = stack(&config(CurveType::Bls12381), open(&dir), None);
        let (tx, rx) = mpsc::channel(8);
        drop(tx);
        stack2
            .aggregator
            .clone()
            .run(rx, CancellationToken::new())
            .await
            .unwrap();
        assert!(stack2.sink.certificates.lock().is_empty());

        let store = open(&dir);
        assert_eq!(
            store.get_task(&TaskId::new("t1")).unwrap().status,
            TaskStatus::Failed
        );
    }
}
