//! # Task Consensus Session (tc-04)
//!
//! One session per task attempt. The session broadcasts the task to every
//! operator of the task's operator set, accumulates signed results and
//! resolves once either the stake-weighted threshold is met or its block
//! context ends.
//!
//! ```text
//! created -> broadcasting -> { threshold-met | deadline-exceeded | cancelled }
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Exact Threshold | `signed * 10000 >= total * bips`, integer arithmetic only |
//! | 2 | One Vote Per Operator | Duplicate results never add weight |
//! | 3 | Scoped Results | Results must name this task, a member, and the pinned response |
//! | 4 | No Certificate On Expiry | A done context yields an error, never a partial certificate |
//! | 5 | Single Use | `process()` runs at most once |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Operator set, threshold, results, certificate, errors
//! - `ports/` - Outbound transport and operator directory
//! - `session` - `ConsensusSession`

pub mod domain;
pub mod ports;
pub mod session;

pub use domain::certificate::Certificate;
pub use domain::errors::{ConsensusError, ConsensusResult};
pub use domain::operator::{Operator, OperatorPeer, OperatorSet, OperatorSetMembership};
pub use domain::result::{RecordOutcome, RejectReason, TaskResult, TaskSubmission};
pub use domain::threshold::Threshold;
pub use ports::outbound::{DirectoryError, OperatorDirectory, OperatorTransport, TransportError};
pub use session::{ConsensusSession, SessionPhase};
