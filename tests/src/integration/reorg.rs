//! # Reorg Flows
//!
//! Blocks arrive through the runtime event loop while tasks are in
//! flight. A replaced block cancels every session bound to it.

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use aggregator_runtime::ChainEvent;
    use shared_types::{CurveType, TaskId, TaskStatus};
    use std::sync::Arc;
    use std::time::Duration;
    use tc_01_state_store::{InMemoryStateStore, StateStore};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn new_block(number: u64, fork: u8) -> ChainEvent {
        ChainEvent::NewBlock {
            avs: avs(),
            block: block(number, fork),
        }
    }

    async fn wait_for_status(store: &InMemoryStateStore, id: &str, status: TaskStatus) {
        let id = TaskId::new(id);
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if store.get_task(&id).map(|r| r.status).ok() == Some(status) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("task {id} never reached {status:?}"));
    }

    #[tokio::test]
    async fn test_replaced_block_cancels_running_task() {
        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(
            &config(CurveType::Ecdsa),
            store.clone(),
            Some(Arc::new(SilentTransport)),
        );
        let (tx, rx) = mpsc::channel(64);
        let runner = tokio::spawn(stack.aggregator.clone().run(rx, CancellationToken::new()));

        for number in 100..=105 {
            tx.send(new_block(number, 1)).await.unwrap();
        }
        tx.send(ChainEvent::TaskCreated(task("t105", 105))).await.unwrap();
        wait_for_status(&store, "t105", TaskStatus::Processing).await;

        tx.send(new_block(105, 2)).await.unwrap();
        wait_for_status(&store, "t105", TaskStatus::Failed).await;

        let head = store.get_last_processed_block(&avs(), CHAIN).unwrap();
        assert_eq!(head.hash, block(105, 2).hash);
        assert!(stack.sink.certificates.lock().is_empty());

        drop(tx);
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_deep_reorg_reaches_back_to_mismatched_parent() {
        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(
            &config(CurveType::Ecdsa),
            store.clone(),
            Some(Arc::new(SilentTransport)),
        );
        let (tx, rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(stack.aggregator.clone().run(rx, shutdown.clone()));

        for number in 100..=105 {
            tx.send(new_block(number, 1)).await.unwrap();
        }
        for (id, number) in [("t102", 102), ("t103", 103), ("t105", 105)] {
            tx.send(ChainEvent::TaskCreated(task(id, number))).await.unwrap();
        }
        wait_for_status(&store, "t102", TaskStatus::Processing).await;

        // fork 2 replaces 104 and 105, and its parent 103 no longer matches
        tx.send(new_block(104, 2)).await.unwrap();
        wait_for_status(&store, "t103", TaskStatus::Failed).await;
        wait_for_status(&store, "t105", TaskStatus::Failed).await;

        assert_eq!(
            store.get_task(&TaskId::new("t102")).unwrap().status,
            TaskStatus::Processing
        );
        let manager = stack.aggregator.context_manager(CHAIN).unwrap();
        assert!(manager.contains(102));
        assert!(store.get_block(&avs(), CHAIN, 103).unwrap_err().is_not_found());
        assert!(store.get_block(&avs(), CHAIN, 105).unwrap_err().is_not_found());
        assert_eq!(
            store.get_block(&avs(), CHAIN, 104).unwrap().hash,
            block(104, 2).hash
        );

        // cancelling the root reaches the surviving block as well
        stack.aggregator.root_token().cancel();
        wait_for_status(&store, "t102", TaskStatus::Failed).await;

        shutdown.cancel();
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_repeated_block_leaves_tasks_running() {
        let store = Arc::new(InMemoryStateStore::new());
        let stack = stack(
            &config(CurveType::Ecdsa),
            store.clone(),
            Some(Arc::new(SilentTransport)),
        );
        let (tx, rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let runner = tokio::spawn(stack.aggregator.clone().run(rx, shutdown.clone()));

        tx.send(new_block(100, 1)).await.unwrap();
        tx.send(ChainEvent::TaskCreated(task("t100", 100))).await.unwrap();
        wait_for_status(&store, "t100", TaskStatus::Processing).await;
        tx.send(new_block(100, 1)).await.unwrap();
        tx.send(new_block(101, 1)).await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while store.get_last_processed_block(&avs(), CHAIN).map(|b| b.number).ok() != Some(101) {
            assert!(tokio::time::Instant::now() < deadline, "block 101 never stored");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(stack.aggregator.context_manager(CHAIN).unwrap().contains(100));

        shutdown.cancel();
        runner.await.unwrap().unwrap();
    }
}
