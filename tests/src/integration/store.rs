//! # Store Backend Parity
//!
//! The same observable behaviour from both state store backends.

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{TaskId, TaskStatus};
    use std::collections::HashSet;
    use std::sync::Arc;
    use tc_01_state_store::{
        open_state_store, InMemoryStateStore, RocksDbConfig, RocksDbStateStore, StateStore,
        StoreError,
    };
    use tempfile::TempDir;

    fn with_each_backend(check: impl Fn(&dyn StateStore)) {
        check(&InMemoryStateStore::new());

        let dir = TempDir::new().unwrap();
        let rocks = RocksDbStateStore::open(RocksDbConfig::for_testing(dir.path())).unwrap();
        check(&rocks);
        rocks.close().unwrap();
    }

    #[test]
    fn test_pending_by_avs_is_case_insensitive_subset() {
        with_each_backend(|store| {
            let mut rng = StdRng::seed_from_u64(0x7c01);
            let avs_pool = ["0xAbC1", "0xdef2", "0x0303"];
            for i in 0..48 {
                let mut t = task(&format!("t{i}"), 100);
                let avs = avs_pool[rng.gen_range(0..avs_pool.len())];
                t.avs_address = if rng.gen_bool(0.5) {
                    avs.to_uppercase()
                } else {
                    avs.to_lowercase()
                };
                store.save_pending_task(&t).unwrap();
                match rng.gen_range(0..3) {
                    0 => {}
                    1 => {
                        store
                            .update_task_status(&t.task_id, TaskStatus::Processing)
                            .unwrap();
                    }
                    _ => {
                        store.update_task_status(&t.task_id, TaskStatus::Failed).unwrap();
                    }
                }
            }

            let pending: HashSet<TaskId> = store
                .list_pending_tasks()
                .unwrap()
                .into_iter()
                .map(|r| r.task.task_id)
                .collect();
            let mut union = HashSet::new();
            for avs in avs_pool {
                let query = avs.to_uppercase();
                for record in store.list_pending_tasks_for_avs(&query).unwrap() {
                    assert_eq!(record.status, TaskStatus::Pending);
                    assert!(record.task.avs_address.eq_ignore_ascii_case(avs));
                    assert!(pending.contains(&record.task.task_id));
                    assert!(union.insert(record.task.task_id));
                }
            }
            assert_eq!(union, pending);
        });
    }

    #[test]
    fn test_block_ledgers_isolated_per_avs() {
        with_each_backend(|store| {
            for number in 10..=12 {
                store.save_block("0xAAA", &block(number, 1)).unwrap();
            }
            store.save_block("0xbbb", &block(50, 2)).unwrap();

            assert_eq!(store.get_last_processed_block("0xaaa", CHAIN).unwrap().number, 12);
            assert_eq!(store.get_last_processed_block("0xBBB", CHAIN).unwrap().number, 50);
            assert!(store.get_block("0xbbb", CHAIN, 10).unwrap_err().is_not_found());

            store.delete_block("0xaaa", CHAIN, 12).unwrap();
            assert_eq!(store.get_last_processed_block("0xAAA", CHAIN).unwrap().number, 11);
            assert!(store.delete_block("0xaaa", CHAIN, 12).unwrap_err().is_not_found());

            assert_eq!(store.prune_blocks_before("0xaaa", CHAIN, 11).unwrap(), 1);
            assert_eq!(store.get_block("0xAAA", CHAIN, 11).unwrap(), block(11, 1));
            assert_eq!(store.get_last_processed_block("0xbbb", CHAIN).unwrap().number, 50);
        });
    }

    #[test]
    fn test_replacing_block_at_same_height() {
        with_each_backend(|store| {
            store.save_block(&avs(), &block(7, 1)).unwrap();
            store.save_block(&avs(), &block(7, 2)).unwrap();
            assert_eq!(store.get_block(&avs(), CHAIN, 7).unwrap(), block(7, 2));
            assert_eq!(store.get_last_processed_block(&avs(), CHAIN).unwrap(), block(7, 2));
        });
    }

    #[test]
    fn test_closed_store_rejects_everything_but_close() {
        with_each_backend(|store| {
            store.save_pending_task(&task("t1", 1)).unwrap();
            store.close().unwrap();
            assert!(matches!(store.get_task(&TaskId::new("t1")), Err(StoreError::StoreClosed)));
            assert!(matches!(
                store.save_block(&avs(), &block(1, 1)),
                Err(StoreError::StoreClosed)
            ));
            store.close().unwrap();
        });
    }

    #[test]
    fn test_open_state_store_selects_backend() {
        let dir = TempDir::new().unwrap();
        let config = tc_01_state_store::StoreConfig::rocksdb(dir.path().join("state"));
        let store: Arc<dyn StateStore> = open_state_store(&config).unwrap();
        store.save_pending_task(&task("durable", 1)).unwrap();
        store.close().unwrap();
        drop(store);

        let reopened = open_state_store(&config).unwrap();
        assert_eq!(
            reopened.get_task(&TaskId::new("durable")).unwrap().status,
            TaskStatus::Pending
        );
        reopened.close().unwrap();
    }
}
