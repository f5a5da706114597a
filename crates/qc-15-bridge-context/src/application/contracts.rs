//! # Directory Entries
//!
//! Per-domain contract handles. Each entry keeps the addresses it was built
//! from so it can be rebuilt against a new connection.

use primitive_types::H160;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{BridgeConfig, DomainConfig};
use crate::domain::{DomainId, TokenIdentifier};
use crate::ports::{
    BoundContract, BridgeRouterContract, Connection, ContractFactory, HomeContract,
    NativeHelperContract, ReplicaContract, TokenContract,
};

/// A token representation contract bound to its domain's connection.
pub type Representation = Arc<dyn TokenContract>;

/// Core protocol contracts on one domain: the home and the replicas of every
/// other domain's home.
#[derive(Clone, Debug)]
pub struct CoreContracts {
    domain: DomainId,
    home_address: H160,
    replica_addresses: HashMap<DomainId, H160>,
    home: Arc<dyn HomeContract>,
    replicas: HashMap<DomainId, Arc<dyn ReplicaContract>>,
}

impl CoreContracts {
    /// Build handles from the domain config, bound to `connection`.
    pub fn new(
        config: &DomainConfig,
        factory: &dyn ContractFactory,
        connection: Option<Connection>,
    ) -> Self {
        let replica_addresses: HashMap<DomainId, H160> = config
            .replicas
            .iter()
            .map(|r| (r.domain, r.address))
            .collect();
        let mut core = Self {
            domain: config.id,
            home_address: config.home,
            home: factory.home(config.id, config.home, connection.clone()),
            replica_addresses,
            replicas: HashMap::new(),
        };
        core.build_replicas(factory, connection);
        core
    }

    fn build_replicas(&mut self, factory: &dyn ContractFactory, connection: Option<Connection>) {
        self.replicas = self
            .replica_addresses
            .iter()
            .map(|(remote, address)| {
                (
                    *remote,
                    factory.replica(self.domain, *remote, *address, connection.clone()),
                )
            })
            .collect();
    }

    /// Rebuild every handle against `connection`.
    pub fn connect(&mut self, factory: &dyn ContractFactory, connection: Option<Connection>) {
        self.home = factory.home(self.domain, self.home_address, connection.clone());
        self.build_replicas(factory, connection);
    }

    /// Domain the contracts live on.
    pub fn domain(&self) -> DomainId {
        self.domain
    }

    /// Home handle.
    pub fn home(&self) -> &Arc<dyn HomeContract> {
        &self.home
    }

    /// Replica of `remote`'s home on this domain.
    pub fn replica(&self, remote: DomainId) -> Option<&Arc<dyn ReplicaContract>> {
        self.replicas.get(&remote)
    }

    /// Remote domains with a replica here.
    pub fn replica_domains(&self) -> Vec<DomainId> {
        let mut domains: Vec<DomainId> = self.replicas.keys().copied().collect();
        domains.sort_unstable();
        domains
    }

    /// Connection the entry is bound to.
    pub fn connection(&self) -> Option<&Connection> {
        self.home.connection()
    }
}

/// Bridge contracts on one domain.
#[derive(Clone, Debug)]
pub struct BridgeContracts {
    domain: DomainId,
    addresses: BridgeConfig,
    router: Arc<dyn BridgeRouterContract>,
    native_helper: Option<Arc<dyn NativeHelperContract>>,
}

impl BridgeContracts {
    /// Build handles from the bridge config, bound to `connection`.
    pub fn new(
        domain: DomainId,
        addresses: BridgeConfig,
        factory: &dyn ContractFactory,
        connection: Option<Connection>,
    ) -> Self {
        let router = factory.bridge_router(domain, addresses.router, connection.clone());
        let native_helper = addresses
            .native_helper
            .map(|address| factory.native_helper(domain, address, connection));
        Self {
            domain,
            addresses,
            router,
            native_helper,
        }
    }

    /// Rebuild every handle against `connection`.
    pub fn connect(&mut self, factory: &dyn ContractFactory, connection: Option<Connection>) {
        *self = Self::new(self.domain, self.addresses.clone(), factory, connection);
    }

    /// Domain the contracts live on.
    pub fn domain(&self) -> DomainId {
        self.domain
    }

    /// Bridge router handle.
    pub fn router(&self) -> &Arc<dyn BridgeRouterContract> {
        &self.router
    }

    /// Native-asset helper handle, if deployed.
    pub fn native_helper(&self) -> Option<&Arc<dyn NativeHelperContract>> {
        self.native_helper.as_ref()
    }

    /// Connection the entry is bound to.
    pub fn connection(&self) -> Option<&Connection> {
        self.router.connection()
    }
}

/// A canonical token and its representations, keyed by domain.
#[derive(Clone)]
pub struct ResolvedTokenInfo {
    /// Canonical identity.
    pub token: TokenIdentifier,
    representations: HashMap<DomainId, Representation>,
}

impl ResolvedTokenInfo {
    /// Create from resolved representations.
    pub fn new(token: TokenIdentifier, representations: HashMap<DomainId, Representation>) -> Self {
        Self {
            token,
            representations,
        }
    }

    /// Representation on `domain`.
    pub fn get(&self, domain: DomainId) -> Option<&Representation> {
        self.representations.get(&domain)
    }

    /// Domains with a representation, sorted.
    pub fn domains(&self) -> Vec<DomainId> {
        let mut domains: Vec<DomainId> = self.representations.keys().copied().collect();
        domains.sort_unstable();
        domains
    }

    /// Number of representations.
    pub fn len(&self) -> usize {
        self.representations.len()
    }

    /// Check if the token has no representation anywhere.
    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }
}

impl fmt::Debug for ResolvedTokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addresses: HashMap<DomainId, H160> = self
            .representations
            .iter()
            .map(|(domain, token)| (*domain, token.address()))
            .collect();
        f.debug_struct("ResolvedTokenInfo")
            .field("token", &self.token)
            .field("representations", &addresses)
            .finish()
    }
}
