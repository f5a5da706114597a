//! # QC-15 Bridge Context
//!
//! Client-side directory and orchestration layer for a multi-domain asset
//! bridge.
//!
//! **Subsystem ID:** 15
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Track the protocol contracts deployed on every connected domain and act
//! on them:
//! - Contract directory kept bound to each domain's current connection
//! - Token identity resolution between canonical ids and local representations
//! - Cross-domain transfers packaged into trackable transfer messages
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | No stale bindings | Every registry mutation rebinds the affected domains |
//! | Serialized rebinds | Directory mutators take `&mut self` |
//! | Canonical keys | Addresses widened to 32 bytes, narrowed only at call time |
//! | Approve before send | Allowance checked and approval finalized first |
//!
//! ## Module Structure
//!
//! ```text
//! qc-15-bridge-context/
//! ├── domain/          # Domain ids, token identifiers, messages, errors
//! ├── algorithms/      # Canonicalization, message codec
//! ├── ports/           # Directory/resolver/transfer APIs, chain traits
//! ├── application/     # BridgeContext
//! ├── adapters/        # In-memory registry and ledger
//! └── config.rs        # Per-domain deployments
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryLedger, InMemoryProvider, InMemoryRegistry, LocalSigner};
pub use algorithms::{canonize, canonize_bytes, evm_id, parse_canonical_id, strip_0x_prefix};
pub use application::{
    BridgeContext, BridgeContracts, CoreContracts, Representation, ResolvedTokenInfo,
};
pub use config::{BridgeConfig, BridgeContextConfig, DomainConfig, ReplicaConfig};
pub use domain::{
    BridgeError, BridgeResult, ChainError, Domain, DomainId, DomainRef, MessageStatus,
    TokenIdentifier, TransferMessage, TxOverrides,
};
pub use ports::{
    BoundContract, Connection, ConnectionRegistry, ContractDirectoryApi, ContractFactory,
    NativeTransferRequest, Provider, Signer, TokenResolverApi, TransferApi, TransferRequest,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
