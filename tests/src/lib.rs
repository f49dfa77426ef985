//! # Task Consensus Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs       # Shared fixtures and mock ports
//!     ├── pipeline.rs      # Task -> session -> certificate -> store
//!     ├── reorg.rs         # Block cancellation across the stack
//!     ├── recovery.rs      # Restart over a durable store
//!     └── store.rs         # Backend-agnostic store properties
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tc-tests
//! cargo test -p tc-tests integration::reorg::
//! ```

#![allow(dead_code)]

pub mod integration;
