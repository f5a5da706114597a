//! # Domain Errors
//!
//! Error types for the bridge context.
//!
//! Two layers, as with the rest of the subsystem: [`ChainError`] is what a
//! connection or contract call reports, [`BridgeError`] is what callers of the
//! context see. Chain faults are wrapped with the domain and the operation
//! that hit them.

use primitive_types::{H160, H256};
use thiserror::Error;

use super::value_objects::DomainId;

/// Errors reported by a chain connection or a contract binding.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Contract handle has no connection bound.
    #[error("Contract is not connected")]
    NotConnected,

    /// Write call attempted on a read-only connection.
    #[error("Connection has no signer")]
    NoSigner,

    /// Transport or node error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction was mined but reverted.
    #[error("Transaction reverted: {0:?}")]
    Reverted(H256),

    /// Transaction disappeared from the node before finalizing.
    #[error("Transaction dropped: {0:?}")]
    Dropped(H256),

    /// Finalization wait ran past its deadline.
    #[error("Timed out waiting for {0:?}")]
    Timeout(H256),
}

/// Bridge context error types.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Domain name or id is not registered.
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// Domain id or name registered twice.
    #[error("Duplicate domain: {0}")]
    DuplicateDomain(String),

    /// No core or bridge contracts for the domain.
    #[error("Missing contracts for domain {0}")]
    MissingContracts(DomainId),

    /// No replica of `home` deployed on `remote`.
    #[error("Missing replica of home {home} on domain {remote}")]
    MissingReplica {
        /// Domain whose home is replicated
        home: DomainId,
        /// Domain the replica lives on
        remote: DomainId,
    },

    /// Token has no representation on the domain.
    #[error("Token {token} unavailable on domain {domain}")]
    TokenUnavailable {
        /// Domain that was queried
        domain: DomainId,
        /// Canonical identity of the token, rendered
        token: String,
    },

    /// No signer registered for the domain.
    #[error("No signer registered for domain {0}")]
    NoSigner(DomainId),

    /// No provider registered for the domain.
    #[error("No connection registered for domain {0}")]
    NotConnected(DomainId),

    /// Bridge on the domain has no native asset helper.
    #[error("No native asset helper on domain {0}")]
    NoNativeHelper(DomainId),

    /// Address is not a known representation or canonical token.
    #[error("Token not found: {address:?} on domain {domain}")]
    TokenNotFound {
        /// Domain that was queried
        domain: DomainId,
        /// Address that was looked up
        address: H160,
    },

    /// A protocol invariant failed to hold.
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    /// Address could not be converted losslessly.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Amount is not transferable.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Dispatched message bytes could not be decoded.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Configuration rejected by validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// One domain of a fan-out query failed.
    #[error("Query on domain {domain} failed: {source}")]
    DomainQueryFailed {
        /// Domain whose query failed
        domain: DomainId,
        /// Underlying failure
        #[source]
        source: Box<BridgeError>,
    },

    /// Chain call failed.
    #[error("{operation} on domain {domain} failed: {source}")]
    Chain {
        /// Domain the call was issued against
        domain: DomainId,
        /// Operation name
        operation: &'static str,
        /// Underlying chain failure
        #[source]
        source: ChainError,
    },
}

impl BridgeError {
    /// Wrap a chain failure with its domain and operation.
    pub fn chain(domain: DomainId, operation: &'static str, source: ChainError) -> Self {
        Self::Chain {
            domain,
            operation,
            source,
        }
    }

    /// Domain this error is about, when there is one.
    pub fn domain(&self) -> Option<DomainId> {
        match self {
            Self::MissingContracts(d)
            | Self::NoSigner(d)
            | Self::NotConnected(d)
            | Self::NoNativeHelper(d) => Some(*d),
            Self::MissingReplica { remote, .. } => Some(*remote),
            Self::TokenUnavailable { domain, .. }
            | Self::TokenNotFound { domain, .. }
            | Self::DomainQueryFailed { domain, .. }
            | Self::Chain { domain, .. } => Some(*domain),
            _ => None,
        }
    }
}

/// Result alias used across the crate.
pub type BridgeResult<T> = Result<T, BridgeError>;
