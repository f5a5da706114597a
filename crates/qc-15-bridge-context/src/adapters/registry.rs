//! In-Memory Connection Registry Adapter
//!
//! Implements `ConnectionRegistry` with interior mutability so it can be
//! shared between the bridge context and its owner.

use parking_lot::RwLock;
use primitive_types::H160;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{BridgeError, BridgeResult, Domain, DomainId, DomainRef};
use crate::ports::outbound::{ConnectionRegistry, Provider, Signer};

/// Signer identified only by its address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalSigner {
    address: H160,
}

impl LocalSigner {
    /// Create a signer for `address`.
    pub fn new(address: H160) -> Self {
        Self { address }
    }
}

impl Signer for LocalSigner {
    fn address(&self) -> H160 {
        self.address
    }
}

#[derive(Default)]
struct RegistryState {
    domains: Vec<Domain>,
    providers: HashMap<DomainId, Arc<dyn Provider>>,
    signers: HashMap<DomainId, Arc<dyn Signer>>,
}

/// In-memory connection registry.
#[derive(Default)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionRegistry for InMemoryRegistry {
    fn register_domain(&self, domain: Domain) -> BridgeResult<()> {
        let mut state = self.state.write();
        if state.domains.iter().any(|d| d.id == domain.id) {
            return Err(BridgeError::DuplicateDomain(domain.id.to_string()));
        }
        if state.domains.iter().any(|d| d.name == domain.name) {
            return Err(BridgeError::DuplicateDomain(domain.name));
        }
        debug!("[qc-15] Registered domain {}", domain);
        state.domains.push(domain);
        Ok(())
    }

    fn resolve_domain(&self, domain: &DomainRef) -> BridgeResult<DomainId> {
        let state = self.state.read();
        let found = match domain {
            DomainRef::Id(id) => state.domains.iter().find(|d| d.id == *id),
            DomainRef::Name(name) => state.domains.iter().find(|d| &d.name == name),
        };
        found
            .map(|d| d.id)
            .ok_or_else(|| BridgeError::UnknownDomain(domain.to_string()))
    }

    fn get_domain(&self, domain: DomainId) -> Option<Domain> {
        self.state
            .read()
            .domains
            .iter()
            .find(|d| d.id == domain)
            .cloned()
    }

    fn domain_ids(&self) -> Vec<DomainId> {
        self.state.read().domains.iter().map(|d| d.id).collect()
    }

    fn register_provider(&self, domain: DomainId, provider: Arc<dyn Provider>) {
        self.state.write().providers.insert(domain, provider);
    }

    fn get_provider(&self, domain: DomainId) -> Option<Arc<dyn Provider>> {
        self.state.read().providers.get(&domain).cloned()
    }

    fn register_signer(&self, domain: DomainId, signer: Arc<dyn Signer>) {
        self.state.write().signers.insert(domain, signer);
    }

    fn unregister_signer(&self, domain: DomainId) {
        self.state.write().signers.remove(&domain);
    }

    fn clear_signers(&self) {
        self.state.write().signers.clear();
    }

    fn get_signer(&self, domain: DomainId) -> Option<Arc<dyn Signer>> {
        self.state.read().signers.get(&domain).cloned()
    }
}
