//! # Block Context Manager (tc-02)
//!
//! Binds every task to a cancellation context scoped to the block the task was
//! observed in. Tasks from the same block share one context, so a reorg
//! cancels all of their consensus sessions with a single call.
//!
//! ## Cancellation Tree
//!
//! ```text
//! process token (parent)
//!   ├── block 104 context ── session T1, session T2
//!   └── block 105 context ── session T3
//! ```
//!
//! Cancelling the parent cancels every block context. Cancelling a block
//! context never touches its siblings or the parent.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | First Writer Wins | An existing block context is returned unchanged |
//! | 2 | Idempotent Cancel | `cancel_block` on an absent block is a no-op |
//! | 3 | Sweep Never Cancels | The sweeper only evicts contexts that are already done |
//! | 4 | First Cause Wins | A context reports the first of cancel/deadline that hit it |

pub mod domain;
pub mod service;

pub use domain::config::BlockContextConfig;
pub use domain::context::BlockContext;
pub use domain::errors::{ContextError, ContextResult};
pub use service::BlockContextManager;
