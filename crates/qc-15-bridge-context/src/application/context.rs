//! # Bridge Context
//!
//! Application service owning the per-domain contract directory.
//!
//! Every entry is bound to the registry's connection for its domain at the
//! time of the last rebind. The registry mutators exposed here rebind the
//! affected domains before returning; callers that mutate a shared registry
//! directly must call [`ContractDirectoryApi::rebind`] themselves.

use primitive_types::H256;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::contracts::{BridgeContracts, CoreContracts};
use crate::config::BridgeContextConfig;
use crate::domain::{
    BridgeError, BridgeResult, ChainError, Domain, DomainId, DomainRef, MessageStatus,
    TransferMessage, TxReceipt,
};
use crate::ports::{
    same_binding, ConnectionRegistry, ContractDirectoryApi, ContractFactory, HomeContract,
    Provider, ReplicaContract, Signer,
};

/// Bridge Context - directory, resolver and transfer orchestrator over a set
/// of domains.
pub struct BridgeContext<R: ConnectionRegistry, F: ContractFactory> {
    /// Configuration the context was built from.
    config: BridgeContextConfig,
    /// Connection registry (possibly shared).
    registry: Arc<R>,
    /// Builds contract handles.
    factory: F,
    /// Core contracts per domain.
    cores: HashMap<DomainId, CoreContracts>,
    /// Bridge contracts per domain.
    bridges: HashMap<DomainId, BridgeContracts>,
}

impl<R: ConnectionRegistry, F: ContractFactory> BridgeContext<R, F> {
    /// Build a context from `config`.
    ///
    /// Registers every configured domain with `registry` (domains it already
    /// knows under the same name are accepted) and binds every entry to the
    /// registry's current connection.
    pub fn from_config(
        config: BridgeContextConfig,
        registry: Arc<R>,
        factory: F,
    ) -> BridgeResult<Self> {
        config.validate()?;

        let mut pending = Vec::new();
        for domain in config.domain_list() {
            match registry.get_domain(domain.id) {
                Some(existing) if existing == domain => {}
                Some(_) => return Err(BridgeError::DuplicateDomain(domain.id.to_string())),
                None => {
                    if let Ok(taken) = registry.resolve_domain(&domain.name.as_str().into()) {
                        return Err(BridgeError::DuplicateDomain(format!(
                            "{} (registered as {})",
                            domain.name, taken
                        )));
                    }
                    pending.push(domain);
                }
            }
        }
        for domain in pending {
            registry.register_domain(domain)?;
        }

        let mut cores = HashMap::new();
        let mut bridges = HashMap::new();
        for domain in &config.domains {
            let connection = registry.get_connection(domain.id);
            cores.insert(
                domain.id,
                CoreContracts::new(domain, &factory, connection.clone()),
            );
            if let Some(bridge) = &domain.bridge {
                bridges.insert(
                    domain.id,
                    BridgeContracts::new(domain.id, bridge.clone(), &factory, connection),
                );
            }
        }

        info!(
            "[qc-15] Bridge context '{}' built with {} domains ({} bridges)",
            config.environment,
            cores.len(),
            bridges.len()
        );

        Ok(Self {
            config,
            registry,
            factory,
            cores,
            bridges,
        })
    }

    /// Resolve a name or id to a registered domain id.
    pub fn resolve_domain(&self, domain: impl Into<DomainRef>) -> BridgeResult<DomainId> {
        self.registry.resolve_domain(&domain.into())
    }

    /// Registered domain by name or id.
    pub fn domain(&self, domain: impl Into<DomainRef>) -> BridgeResult<Domain> {
        let domain = domain.into();
        let id = self.registry.resolve_domain(&domain)?;
        self.registry
            .get_domain(id)
            .ok_or_else(|| BridgeError::UnknownDomain(domain.to_string()))
    }

    /// Ids of the domains the context manages, in configuration order.
    pub fn domains(&self) -> Vec<DomainId> {
        self.config.domains.iter().map(|d| d.id).collect()
    }

    /// Configuration the context was built from.
    pub fn config(&self) -> &BridgeContextConfig {
        &self.config
    }

    /// Connection registry.
    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub(crate) fn factory(&self) -> &F {
        &self.factory
    }

    /// Home contract on a domain.
    pub fn get_home(&self, domain: impl Into<DomainRef>) -> Option<&Arc<dyn HomeContract>> {
        self.get_core(domain.into()).map(|core| core.home())
    }

    /// Check that the domain's entries are bound to the registry's current
    /// connection.
    pub fn binding_is_current(&self, domain: impl Into<DomainRef>) -> BridgeResult<bool> {
        let id = self.resolve_domain(domain)?;
        let current = self.registry.get_connection(id);
        let core_current = self
            .cores
            .get(&id)
            .map_or(true, |core| same_binding(core.connection(), current.as_ref()));
        let bridge_current = self
            .bridges
            .get(&id)
            .map_or(true, |bridge| same_binding(bridge.connection(), current.as_ref()));
        Ok(core_current && bridge_current)
    }

    /// Wait for `tx_hash` on `domain` to finalize.
    ///
    /// Uses the domain's configured confirmations, bounded by the context's
    /// receipt timeout. A reverted receipt is an error.
    pub(crate) async fn confirm(
        &self,
        domain: DomainId,
        operation: &'static str,
        tx_hash: H256,
    ) -> BridgeResult<TxReceipt> {
        let provider: Arc<dyn Provider> = self
            .registry
            .get_provider(domain)
            .ok_or(BridgeError::NotConnected(domain))?;
        let confirmations = self
            .config
            .domain_config(domain)
            .map(|d| d.confirmations)
            .ok_or(BridgeError::MissingContracts(domain))?;
        let deadline = Duration::from_secs(self.config.receipt_timeout_secs);

        debug!(
            "[qc-15] Waiting for {:?} on domain {} ({} confirmations)",
            tx_hash, domain, confirmations
        );
        let receipt = tokio::time::timeout(
            deadline,
            provider.wait_for_receipt(tx_hash, confirmations),
        )
        .await
        .map_err(|_| BridgeError::chain(domain, operation, ChainError::Timeout(tx_hash)))?
        .map_err(|e| BridgeError::chain(domain, operation, e))?;

        if !receipt.status {
            return Err(BridgeError::chain(
                domain,
                operation,
                ChainError::Reverted(tx_hash),
            ));
        }
        Ok(receipt)
    }

    /// Delivery status of `message` on its destination.
    ///
    /// Read from the destination's replica of the origin's home.
    pub async fn message_status(&self, message: &TransferMessage) -> BridgeResult<MessageStatus> {
        let (origin, destination) = (message.origin(), message.destination());
        let replica = self.must_get_replica(origin.into(), destination.into())?;
        replica
            .message_status(message.leaf())
            .await
            .map_err(|e| BridgeError::chain(destination, "message_status", e))
    }

    /// Check if `message` has been processed on its destination.
    pub async fn delivered(&self, message: &TransferMessage) -> BridgeResult<bool> {
        Ok(self.message_status(message).await? == MessageStatus::Processed)
    }

    /// Directory key for `domain`: ids are taken as-is, names go through
    /// the registry.
    fn directory_id(&self, domain: &DomainRef) -> BridgeResult<DomainId> {
        match domain {
            DomainRef::Id(id) => Ok(*id),
            DomainRef::Name(_) => self.registry.resolve_domain(domain),
        }
    }

    fn rebind_id(&mut self, domain: DomainId) {
        let connection = self.registry.get_connection(domain);
        if let Some(core) = self.cores.get_mut(&domain) {
            core.connect(&self.factory, connection.clone());
        }
        if let Some(bridge) = self.bridges.get_mut(&domain) {
            bridge.connect(&self.factory, connection.clone());
        }
        info!(
            "[qc-15] Rebound domain {} to {:?}",
            domain,
            connection.as_ref().map(|c| c.provider().endpoint())
        );
    }
}

impl<R: ConnectionRegistry, F: ContractFactory> ContractDirectoryApi for BridgeContext<R, F> {
    fn register_provider(
        &mut self,
        domain: DomainRef,
        provider: Arc<dyn Provider>,
    ) -> BridgeResult<()> {
        let id = self.registry.resolve_domain(&domain)?;
        info!(
            "[qc-15] Registering provider {} for domain {}",
            provider.endpoint(),
            id
        );
        self.registry.register_provider(id, provider);
        self.rebind(id.into())
    }

    fn register_signer(
        &mut self,
        domain: DomainRef,
        signer: Arc<dyn Signer>,
    ) -> BridgeResult<()> {
        let id = self.registry.resolve_domain(&domain)?;
        info!(
            "[qc-15] Registering signer {:?} for domain {}",
            signer.address(),
            id
        );
        self.registry.register_signer(id, signer);
        self.rebind(id.into())
    }

    fn unregister_signer(&mut self, domain: DomainRef) -> BridgeResult<()> {
        let id = self.registry.resolve_domain(&domain)?;
        info!("[qc-15] Unregistering signer for domain {}", id);
        self.registry.unregister_signer(id);
        self.rebind(id.into())
    }

    fn clear_signers(&mut self) -> BridgeResult<()> {
        info!("[qc-15] Clearing all signers");
        self.registry.clear_signers();
        self.rebind_all()
    }

    fn rebind(&mut self, domain: DomainRef) -> BridgeResult<()> {
        let id = self.registry.resolve_domain(&domain)?;
        self.rebind_id(id);
        Ok(())
    }

    fn rebind_all(&mut self) -> BridgeResult<()> {
        for id in self.registry.domain_ids() {
            self.rebind_id(id);
        }
        Ok(())
    }

    fn get_core(&self, domain: DomainRef) -> Option<&CoreContracts> {
        let id = self.directory_id(&domain).ok()?;
        self.cores.get(&id)
    }

    fn must_get_core(&self, domain: DomainRef) -> BridgeResult<&CoreContracts> {
        let id = self.directory_id(&domain)?;
        self.cores
            .get(&id)
            .ok_or(BridgeError::MissingContracts(id))
    }

    fn get_bridge(&self, domain: DomainRef) -> Option<&BridgeContracts> {
        let id = self.directory_id(&domain).ok()?;
        self.bridges.get(&id)
    }

    fn must_get_bridge(&self, domain: DomainRef) -> BridgeResult<&BridgeContracts> {
        let id = self.directory_id(&domain)?;
        self.bridges
            .get(&id)
            .ok_or(BridgeError::MissingContracts(id))
    }

    fn get_replica(
        &self,
        home: DomainRef,
        remote: DomainRef,
    ) -> Option<&Arc<dyn ReplicaContract>> {
        let home = self.directory_id(&home).ok()?;
        self.get_core(remote)?.replica(home)
    }

    fn must_get_replica(
        &self,
        home: DomainRef,
        remote: DomainRef,
    ) -> BridgeResult<&Arc<dyn ReplicaContract>> {
        let home = self.directory_id(&home)?;
        let remote = self.directory_id(&remote)?;
        self.cores
            .get(&remote)
            .and_then(|core| core.replica(home))
            .ok_or(BridgeError::MissingReplica { home, remote })
    }
}
