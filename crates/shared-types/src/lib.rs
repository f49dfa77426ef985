//! # Shared Types Crate
//!
//! This crate contains the domain entities passed between the task consensus
//! crates: the chain poller's `Task`, the persisted `TaskRecord` with its
//! status machine, `BlockRecord`, and the signature curve selector.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Strict Lifecycle**: `TaskStatus` owns the transition table; no other
//!   crate re-implements it.
//! - **Case-Insensitive AVS Identity**: AVS addresses are compared with
//!   [`avs_matches`] and keyed with [`normalize_avs`].

pub mod entities;
pub mod errors;
pub mod status;

pub use entities::*;
pub use errors::*;
pub use status::*;
