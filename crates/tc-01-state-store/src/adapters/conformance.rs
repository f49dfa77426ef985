//! Behaviour shared by every backend, run against each adapter's tests.

use crate::domain::errors::StoreError;
use crate::ports::inbound::StateStore;
use shared_types::{BlockRecord, ChainId, Task, TaskId, TaskStatus};
use std::sync::Arc;
use std::thread;

pub fn sample_task(id: &str, avs: &str) -> Task {
    Task {
        task_id: TaskId::new(id),
        avs_address: avs.to_string(),
        operator_set_id: 1,
        chain_id: ChainId(17000),
        source_block_number: 100,
        source_block_hash: [7u8; 32],
        reference_timestamp: 1_700_000_000,
        payload: b"payload".to_vec(),
        threshold_bips: 6_700,
        deadline_unix_seconds: None,
        callback_addr: "0xcallback".to_string(),
    }
}

pub fn block(chain: u64, number: u64) -> BlockRecord {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&number.to_be_bytes());
    let mut parent_hash = [0u8; 32];
    parent_hash[..8].copy_from_slice(&number.saturating_sub(1).to_be_bytes());
    BlockRecord {
        chain_id: ChainId(chain),
        number,
        hash,
        parent_hash,
        timestamp: 1_700_000_000 + number * 12,
    }
}

pub fn task_lifecycle(store: &dyn StateStore) {
    let task = sample_task("0x01", "0xAVS");
    store.save_pending_task(&task).unwrap();

    let record = store.get_task(&task.task_id).unwrap();
    assert_eq!(record.status, TaskStatus::Pending);
    assert_eq!(record.task, task);

    let record = store
        .update_task_status(&task.task_id, TaskStatus::Processing)
        .unwrap();
    assert_eq!(record.status, TaskStatus::Processing);
    assert!(store.list_pending_tasks().unwrap().is_empty());
    assert_eq!(
        store.list_tasks_with_status(TaskStatus::Processing).unwrap().len(),
        1
    );

    store
        .update_task_status(&task.task_id, TaskStatus::Completed)
        .unwrap();
    assert_eq!(
        store.get_task(&task.task_id).unwrap().status,
        TaskStatus::Completed
    );
    assert!(store
        .list_tasks_with_status(TaskStatus::Processing)
        .unwrap()
        .is_empty());

    store.delete_task(&task.task_id).unwrap();
    assert!(store.get_task(&task.task_id).unwrap_err().is_not_found());
    assert!(store.delete_task(&task.task_id).unwrap_err().is_not_found());
    assert!(store
        .list_tasks_with_status(TaskStatus::Completed)
        .unwrap()
        .is_empty());
}

pub fn duplicate_pending_task(store: &dyn StateStore) {
    let task = sample_task("0x02", "0xavs");
    store.save_pending_task(&task).unwrap();
    store
        .update_task_status(&task.task_id, TaskStatus::Processing)
        .unwrap();

    let mut again = task.clone();
    again.payload = b"different".to_vec();
    assert_eq!(
        store.save_pending_task(&again),
        Err(StoreError::AlreadyExists(task.task_id.clone()))
    );

    let record = store.get_task(&task.task_id).unwrap();
    assert_eq!(record.status, TaskStatus::Processing);
    assert_eq!(record.task.payload, b"payload".to_vec());
}

pub fn invalid_transitions(store: &dyn StateStore) {
    let task = sample_task("0x03", "0xavs");
    store.save_pending_task(&task).unwrap();

    assert_eq!(
        store.update_task_status(&task.task_id, TaskStatus::Completed),
        Err(StoreError::InvalidTaskStatus {
            task_id: task.task_id.clone(),
            from: TaskStatus::Pending,
            to: TaskStatus::Completed,
        })
    );

    store
        .update_task_status(&task.task_id, TaskStatus::Failed)
        .unwrap();
    for next in TaskStatus::ALL {
        assert!(matches!(
            store.update_task_status(&task.task_id, next),
            Err(StoreError::InvalidTaskStatus { from: TaskStatus::Failed, .. })
        ));
    }
    assert_eq!(store.get_task(&task.task_id).unwrap().status, TaskStatus::Failed);

    assert!(store
        .update_task_status(&TaskId::new("0xmissing"), TaskStatus::Processing)
        .unwrap_err()
        .is_not_found());
}

pub fn pending_listing_by_avs(store: &dyn StateStore) {
    store.save_pending_task(&sample_task("0x10", "0xAbC")).unwrap();
    store.save_pending_task(&sample_task("0x11", "0xabc")).unwrap();
    store.save_pending_task(&sample_task("0x12", "0xdef")).unwrap();
    store
        .update_task_status(&TaskId::new("0x11"), TaskStatus::Processing)
        .unwrap();

    let for_abc: Vec<_> = store
        .list_pending_tasks_for_avs("0xABC")
        .unwrap()
        .into_iter()
        .map(|r| r.task.task_id)
        .collect();
    assert_eq!(for_abc, vec![TaskId::new("0x10")]);

    assert_eq!(store.list_pending_tasks().unwrap().len(), 2);
    assert!(store.list_pending_tasks_for_avs("0x999").unwrap().is_empty());
}

pub fn block_ledger(store: &dyn StateStore) {
    let b = block(1, 42);
    store.save_block("0xAVS", &b).unwrap();
    assert_eq!(store.get_block("0xavs", ChainId(1), 42).unwrap(), b);

    // same number in another AVS or chain does not alias
    assert!(store.get_block("0xother", ChainId(1), 42).unwrap_err().is_not_found());
    assert!(store.get_block("0xavs", ChainId(2), 42).unwrap_err().is_not_found());

    let mut replacement = b.clone();
    replacement.hash = [0xEE; 32];
    store.save_block("0xavs", &replacement).unwrap();
    assert_eq!(store.get_block("0xAVS", ChainId(1), 42).unwrap(), replacement);

    store.delete_block("0xavs", ChainId(1), 42).unwrap();
    assert!(store.get_block("0xavs", ChainId(1), 42).unwrap_err().is_not_found());
    assert!(store.delete_block("0xavs", ChainId(1), 42).unwrap_err().is_not_found());

    assert_eq!(
        store.save_block("0xavs", &block(0, 1)),
        Err(StoreError::InvalidChainId(0))
    );
    assert_eq!(
        store.get_last_processed_block("0xavs", ChainId(0)),
        Err(StoreError::InvalidChainId(0))
    );
}

pub fn last_processed_block_is_highest(store: &dyn StateStore) {
    assert!(store
        .get_last_processed_block("0xavs", ChainId(1))
        .unwrap_err()
        .is_not_found());

    for number in [5, 300, 7, 299] {
        store.save_block("0xavs", &block(1, number)).unwrap();
    }
    store.save_block("0xavs", &block(2, 1_000)).unwrap();
    store.save_block("0xb", &block(1, 5_000)).unwrap();

    assert_eq!(
        store.get_last_processed_block("0xAVS", ChainId(1)).unwrap().number,
        300
    );

    store.delete_block("0xavs", ChainId(1), 300).unwrap();
    assert_eq!(
        store.get_last_processed_block("0xavs", ChainId(1)).unwrap().number,
        299
    );
    assert_eq!(
        store.get_last_processed_block("0xavs", ChainId(2)).unwrap().number,
        1_000
    );
}

pub fn prune_blocks(store: &dyn StateStore) {
    for number in 1..=10 {
        store.save_block("0xavs", &block(1, number)).unwrap();
    }
    store.save_block("0xother", &block(1, 2)).unwrap();

    assert_eq!(store.prune_blocks_before("0xavs", ChainId(1), 8).unwrap(), 7);
    assert!(store.get_block("0xavs", ChainId(1), 7).unwrap_err().is_not_found());
    assert!(store.get_block("0xavs", ChainId(1), 8).is_ok());
    assert!(store.get_block("0xother", ChainId(1), 2).is_ok());
    assert_eq!(store.prune_blocks_before("0xavs", ChainId(1), 8).unwrap(), 0);
    assert_eq!(store.prune_blocks_before("0xnone", ChainId(1), 8).unwrap(), 0);
}

pub fn closed_store(store: &dyn StateStore) {
    let task = sample_task("0x20", "0xavs");
    store.save_pending_task(&task).unwrap();
    store.close().unwrap();
    store.close().unwrap();

    assert_eq!(store.get_task(&task.task_id), Err(StoreError::StoreClosed));
    assert_eq!(
        store.save_pending_task(&sample_task("0x21", "0xavs")),
        Err(StoreError::StoreClosed)
    );
    assert_eq!(store.list_pending_tasks(), Err(StoreError::StoreClosed));
    assert_eq!(
        store.update_task_status(&task.task_id, TaskStatus::Processing),
        Err(StoreError::StoreClosed)
    );
    assert_eq!(
        store.save_block("0xavs", &block(1, 1)),
        Err(StoreError::StoreClosed)
    );
    assert_eq!(
        store.get_last_processed_block("0xavs", ChainId(1)),
        Err(StoreError::StoreClosed)
    );
}

/// Many threads race the same `pending -> processing` edge; exactly one wins.
pub fn concurrent_transitions<S: StateStore + 'static>(store: Arc<S>) {
    let task = sample_task("0x30", "0xavs");
    store.save_pending_task(&task).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = task.task_id.clone();
            thread::spawn(move || store.update_task_status(&id, TaskStatus::Processing))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(StoreError::InvalidTaskStatus { from: TaskStatus::Processing, .. })
        ));
    }

    // concurrent inserts of distinct ids all land
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.save_pending_task(&sample_task(&format!("0xc{i}"), "0xavs")))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(store.list_pending_tasks().unwrap().len(), 16);
}
