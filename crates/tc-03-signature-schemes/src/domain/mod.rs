//! # Domain Layer
//!
//! - `types` - Signature and key carriers
//! - `digest` - Keccak digests of tasks and results
//! - `errors` - Signature error taxonomy

pub mod digest;
pub mod errors;
pub mod types;
