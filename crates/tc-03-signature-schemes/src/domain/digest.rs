//! # Digests
//!
//! Everything that gets signed is a 32-byte keccak256 digest. Variable-length
//! fields are length-prefixed so distinct tasks never share an encoding.

use sha3::{Digest, Keccak256};
use shared_types::{normalize_avs, Hash, Task, TaskId};

const TASK_DOMAIN: &[u8] = b"tc-task-v1";
const RESULT_DOMAIN: &[u8] = b"tc-result-v1";

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn update_prefixed(hasher: &mut Keccak256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Digest the aggregator signs to authorize broadcasting `task`.
pub fn task_payload_digest(task: &Task) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(TASK_DOMAIN);
    update_prefixed(&mut hasher, task.task_id.as_str().as_bytes());
    update_prefixed(&mut hasher, normalize_avs(&task.avs_address).as_bytes());
    hasher.update(task.operator_set_id.to_be_bytes());
    hasher.update(task.chain_id.0.to_be_bytes());
    hasher.update(task.source_block_number.to_be_bytes());
    hasher.update(task.source_block_hash);
    hasher.update(task.reference_timestamp.to_be_bytes());
    update_prefixed(&mut hasher, &task.payload);
    hasher.update(task.threshold_bips.to_be_bytes());
    match task.deadline_unix_seconds {
        Some(deadline) => {
            hasher.update([1u8]);
            hasher.update(deadline.to_be_bytes());
        }
        None => hasher.update([0u8]),
    }
    update_prefixed(&mut hasher, task.callback_addr.as_bytes());
    hasher.finalize().into()
}

/// Message an operator signs over its result for `task_id`.
pub fn result_signing_message(task_id: &TaskId, output_digest: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(RESULT_DOMAIN);
    update_prefixed(&mut hasher, task_id.as_str().as_bytes());
    hasher.update(output_digest);
    hasher.finalize().into()
}
