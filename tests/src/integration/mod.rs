//! # Integration Tests
//!
//! End-to-end flows through the public API of `qc-15-bridge-context`.

pub mod bridge_flows;
pub mod fixtures;
