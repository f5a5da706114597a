//! # Domain Invariants
//!
//! Rules the directory and resolver rely on.

use std::collections::HashSet;

use primitive_types::H160;

use super::errors::{BridgeError, BridgeResult};
use super::value_objects::{Domain, DomainId, TokenIdentifier};
use crate::algorithms::canonize;

/// Invariant: domain ids and names are unique.
pub fn invariant_unique_domains(domains: &[Domain]) -> BridgeResult<()> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for domain in domains {
        if !ids.insert(domain.id) {
            return Err(BridgeError::DuplicateDomain(domain.id.to_string()));
        }
        if !names.insert(domain.name.as_str()) {
            return Err(BridgeError::DuplicateDomain(domain.name.clone()));
        }
    }
    Ok(())
}

/// Invariant: a domain never holds a replica of its own home.
pub fn invariant_replica_remote(local: DomainId, remote: DomainId) -> BridgeResult<()> {
    if local == remote {
        return Err(BridgeError::InvalidConfig(format!(
            "domain {} lists a replica of itself",
            local
        )));
    }
    Ok(())
}

/// Invariant: on its canonical domain, a token's local address and its
/// canonical identifier resolve to each other.
pub fn invariant_canonical_round_trip(
    domain: DomainId,
    local_address: H160,
    resolved: &TokenIdentifier,
) -> bool {
    resolved.domain == domain && resolved.id == canonize(local_address)
}
