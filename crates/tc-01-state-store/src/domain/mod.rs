//! # Domain Layer
//!
//! - `errors` - Store error taxonomy
//! - `keys` - Key prefixes and key builders for the KV backend
//! - `config` - Backend selection and tuning

pub mod config;
pub mod errors;
pub mod keys;
