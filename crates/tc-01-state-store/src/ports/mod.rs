//! # Ports Layer
//!
//! - `inbound` - The `StateStore` API offered to the aggregator runtime

pub mod inbound;
