//! # Task Lifecycle
//!
//! The persisted task record and the status machine it obeys.
//!
//! ```text
//! pending    -> processing | failed
//! processing -> completed  | failed
//! completed  -> (terminal)
//! failed     -> (terminal)
//! ```

use crate::entities::{unix_now, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a persisted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    /// Whether `self -> next` is an edge of the status machine.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }

    /// Completed and failed records are never mutated again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Stable lowercase name, also used in storage keys.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task together with its lifecycle state, as persisted by the state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: Task,
    pub status: TaskStatus,
    /// Unix seconds when the record was first saved.
    pub created_at: u64,
    /// Unix seconds of the last status change.
    pub updated_at: u64,
}

impl TaskRecord {
    /// Wrap a freshly observed task as a `pending` record.
    pub fn pending(task: Task) -> Self {
        let now = unix_now();
        Self {
            task,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task.task_id
    }

    /// Apply a status change if the status machine allows it.
    ///
    /// On rejection the record is left untouched and the current status is
    /// returned as the error.
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), TaskStatus> {
        if !self.status.can_transition_to(next) {
            return Err(self.status);
        }
        self.status = next;
        self.updated_at = unix_now().max(self.updated_at);
        Ok(())
    }
}
