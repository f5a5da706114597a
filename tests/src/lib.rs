//! # Bridge Context Test Suite
//!
//! Unified test crate for flows that cross module boundaries of the bridge
//! context: configuration loading, directory rebinding, token resolution and
//! transfers against the in-memory ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # End-to-end flows
//!     ├── fixtures.rs   # Shared world setup, tracing init
//!     └── bridge_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//!
//! # With logs
//! RUST_LOG=qc_15_bridge_context=debug cargo test -p qc-tests -- --nocapture
//! ```

#![allow(dead_code)]

pub mod integration;
