//! Cross-crate integration flows.

pub mod support;

mod pipeline;
mod recovery;
mod reorg;
mod store;
