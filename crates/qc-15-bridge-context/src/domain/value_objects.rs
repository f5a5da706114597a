//! # Domain Value Objects
//!
//! Immutable value types for the bridge context.

use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric domain identifier.
pub type DomainId = u32;

/// A registered domain: unique id plus human name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    /// Domain id, unique within a context.
    pub id: DomainId,
    /// Human-readable name, unique within a context.
    pub name: String,
}

impl Domain {
    /// Create a new domain.
    pub fn new(id: DomainId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Reference to a domain by id or by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DomainRef {
    /// Numeric id.
    Id(DomainId),
    /// Registered name.
    Name(String),
}

impl fmt::Display for DomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRef::Id(id) => write!(f, "{}", id),
            DomainRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<DomainId> for DomainRef {
    fn from(id: DomainId) -> Self {
        DomainRef::Id(id)
    }
}

impl From<&str> for DomainRef {
    fn from(name: &str) -> Self {
        DomainRef::Name(name.to_string())
    }
}

impl From<String> for DomainRef {
    fn from(name: String) -> Self {
        DomainRef::Name(name)
    }
}

impl From<&Domain> for DomainRef {
    fn from(domain: &Domain) -> Self {
        DomainRef::Id(domain.id)
    }
}

/// Canonical identity of an asset: the domain it originates on plus its
/// 32-byte id there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenIdentifier {
    /// Canonical domain.
    pub domain: DomainId,
    /// Canonical id (left-padded address on the canonical domain).
    pub id: H256,
}

impl TokenIdentifier {
    /// Create a new token identifier.
    pub fn new(domain: DomainId, id: H256) -> Self {
        Self { domain, id }
    }

    /// Identifier of a token whose canonical contract lives at `address`.
    pub fn from_address(domain: DomainId, address: H160) -> Self {
        Self::new(domain, crate::algorithms::canonize(address))
    }
}

impl fmt::Display for TokenIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.domain, self.id)
    }
}

/// Per-transaction overrides forwarded to the connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxOverrides {
    /// Gas limit.
    pub gas_limit: Option<U256>,
    /// Gas price.
    pub gas_price: Option<U256>,
    /// Explicit nonce.
    pub nonce: Option<U256>,
}

/// Delivery state of a dispatched message as seen by a replica.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Replica has not seen the message.
    #[default]
    None,
    /// Message proven against a confirmed root.
    Proven,
    /// Message processed on the destination.
    Processed,
}

impl MessageStatus {
    /// Decode the on-chain status enum.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Proven),
            2 => Some(Self::Processed),
            _ => None,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_ref_conversions() {
        assert_eq!(DomainRef::from(1u32), DomainRef::Id(1));
        assert_eq!(DomainRef::from("alpha"), DomainRef::Name("alpha".into()));
        let domain = Domain::new(2, "beta");
        assert_eq!(DomainRef::from(&domain), DomainRef::Id(2));
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::new(1, "alpha").to_string(), "alpha (1)");
        assert_eq!(DomainRef::Name("beta".into()).to_string(), "beta");
    }

    #[test]
    fn test_token_identifier_from_address() {
        let address = H160::from_low_u64_be(0xbeef);
        let token = TokenIdentifier::from_address(1, address);
        assert_eq!(token.domain, 1);
        assert_eq!(token.id, H256::from_low_u64_be(0xbeef));
    }

    #[test]
    fn test_message_status_decode() {
        assert_eq!(MessageStatus::from_u8(2), Some(MessageStatus::Processed));
        assert_eq!(MessageStatus::from_u8(7), None);
        assert!(MessageStatus::Processed.is_terminal());
        assert!(!MessageStatus::Proven.is_terminal());
    }
}
