//! # Ports Layer
//!
//! - `outbound` - Transport to operators, operator directory

pub mod outbound;
