//! # Domain Layer
//!
//! - `operator` - Peers, memberships and the resolved operator set
//! - `threshold` - Basis-point threshold arithmetic
//! - `result` - Submissions, results and record outcomes
//! - `certificate` - Proof that the threshold was reached
//! - `errors` - Session errors

pub mod certificate;
pub mod errors;
pub mod operator;
pub mod result;
pub mod threshold;
