//! # Key Layout
//!
//! Byte-key layout shared by ordered KV backends.
//!
//! ```text
//! task:<task_id>                                   -> bincode(TaskRecord)
//! tidx:<status>:<task_id>                          -> ()
//! blk:<avs_lower>:<chain_id be64><number be64>     -> bincode(BlockRecord)
//! ```
//!
//! Big-endian integers keep block keys ordered by number within one
//! `(avs, chain)` pair, so the highest stored block is a single reverse seek.

use shared_types::{normalize_avs, ChainId, TaskId, TaskStatus};

/// Key prefixes for the different record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Task record by id.
    Task,
    /// Status index entry.
    TaskStatus,
    /// Block record by (avs, chain, number).
    Block,
}

impl KeyPrefix {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Task => b"task:",
            KeyPrefix::TaskStatus => b"tidx:",
            KeyPrefix::Block => b"blk:",
        }
    }

    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }
}

pub fn task_key(task_id: &TaskId) -> Vec<u8> {
    KeyPrefix::Task.key(task_id.as_str().as_bytes())
}

/// Prefix covering every index entry of one status.
pub fn status_prefix(status: TaskStatus) -> Vec<u8> {
    let mut key = KeyPrefix::TaskStatus.key(status.as_str().as_bytes());
    key.push(b':');
    key
}

pub fn status_key(status: TaskStatus, task_id: &TaskId) -> Vec<u8> {
    let mut key = status_prefix(status);
    key.extend_from_slice(task_id.as_str().as_bytes());
    key
}

/// Extract the task id from a status index key.
pub fn task_id_from_status_key(status: TaskStatus, key: &[u8]) -> Option<TaskId> {
    let prefix = status_prefix(status);
    let suffix = key.strip_prefix(prefix.as_slice())?;
    std::str::from_utf8(suffix).ok().map(TaskId::new)
}

/// Prefix covering every block of one `(avs, chain)` pair.
pub fn block_prefix(avs_address: &str, chain_id: ChainId) -> Vec<u8> {
    let mut key = KeyPrefix::Block.key(normalize_avs(avs_address).as_bytes());
    key.push(b':');
    key.extend_from_slice(&chain_id.0.to_be_bytes());
    key
}

pub fn block_key(avs_address: &str, chain_id: ChainId, number: u64) -> Vec<u8> {
    let mut key = block_prefix(avs_address, chain_id);
    key.extend_from_slice(&number.to_be_bytes());
    key
}

/// Block number encoded in a block key, if the key belongs to `prefix`.
pub fn block_number_from_key(prefix: &[u8], key: &[u8]) -> Option<u64> {
    let suffix = key.strip_prefix(prefix)?;
    let bytes: [u8; 8] = suffix.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
