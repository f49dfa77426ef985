//! # Ports Layer
//!
//! - `inbound` - The signing capability consumed by sessions and the runtime

pub mod inbound;
