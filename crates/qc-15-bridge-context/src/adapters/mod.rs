//! # Adapters Module
//!
//! In-memory implementations of the outbound ports.

mod contracts;
mod ledger;
mod registry;

pub use contracts::{
    InMemoryBridgeRouter, InMemoryHome, InMemoryNativeHelper, InMemoryReplica, InMemoryToken,
};
pub use ledger::{InMemoryLedger, InMemoryProvider, SubmittedTx, TxKind};
pub use registry::{InMemoryRegistry, LocalSigner};
