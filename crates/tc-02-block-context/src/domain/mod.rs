//! # Domain Layer
//!
//! - `context` - The `BlockContext` handle
//! - `errors` - Why a context ended
//! - `config` - Sweep interval

pub mod config;
pub mod context;
pub mod errors;
