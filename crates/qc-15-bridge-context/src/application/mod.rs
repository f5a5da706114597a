//! # Application Layer
//!
//! The bridge context service: contract directory, token resolver and
//! transfer orchestrator.

mod context;
mod contracts;
mod resolver;
mod transfer;

pub use context::BridgeContext;
pub use contracts::{BridgeContracts, CoreContracts, Representation, ResolvedTokenInfo};
