//! # Outbound Ports
//!
//! Traits for external dependencies: the connection registry, chain
//! providers and signers, and one capability trait per contract kind.
//!
//! Contract handles are produced by a [`ContractFactory`] bound to a
//! [`Connection`]; the directory stores them as trait objects and rebuilds
//! them whenever the domain's connection changes.

use async_trait::async_trait;
use primitive_types::{H160, H256, U256};
use std::fmt;
use std::sync::Arc;

use crate::domain::{
    BridgeResult, ChainError, Domain, DomainId, DomainRef, MessageStatus, TxOverrides, TxReceipt,
};

/// Read access to a chain.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// Endpoint identifier, for logging.
    fn endpoint(&self) -> &str;

    /// Wait until `tx_hash` has `confirmations` confirmations and return its
    /// receipt.
    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        confirmations: u64,
    ) -> Result<TxReceipt, ChainError>;
}

/// Transaction-signing identity.
pub trait Signer: Send + Sync + fmt::Debug {
    /// Address transactions are sent from.
    fn address(&self) -> H160;
}

/// A provider, optionally combined with a signer.
#[derive(Clone)]
pub struct Connection {
    provider: Arc<dyn Provider>,
    signer: Option<Arc<dyn Signer>>,
}

impl Connection {
    /// Read-only connection.
    pub fn read_only(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            signer: None,
        }
    }

    /// Connection able to submit transactions.
    pub fn signing(provider: Arc<dyn Provider>, signer: Arc<dyn Signer>) -> Self {
        Self {
            provider,
            signer: Some(signer),
        }
    }

    /// Underlying provider.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Signer, if any.
    pub fn signer(&self) -> Option<&Arc<dyn Signer>> {
        self.signer.as_ref()
    }

    /// Address of the signer, if any.
    pub fn signer_address(&self) -> Option<H160> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Check if transactions can be submitted.
    pub fn is_signing(&self) -> bool {
        self.signer.is_some()
    }

    /// Check if both connections share the same provider and signer instances.
    pub fn same_as(&self, other: &Connection) -> bool {
        let same_signer = match (&self.signer, &other.signer) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        Arc::ptr_eq(&self.provider, &other.provider) && same_signer
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("provider", &self.provider.endpoint())
            .field("signer", &self.signer_address())
            .finish()
    }
}

/// Check that a binding matches the registry's current connection.
pub fn same_binding(bound: Option<&Connection>, current: Option<&Connection>) -> bool {
    match (bound, current) {
        (Some(a), Some(b)) => a.same_as(b),
        (None, None) => true,
        _ => false,
    }
}

/// Connection registry - outbound port.
///
/// Owns domain registration and the provider/signer bindings per domain.
/// Mutators take `&self` so the registry can be shared; the bridge context
/// rebinds its contracts after every mutation it performs.
pub trait ConnectionRegistry: Send + Sync {
    /// Register a domain.
    fn register_domain(&self, domain: Domain) -> BridgeResult<()>;

    /// Resolve a name or id to a registered domain id.
    fn resolve_domain(&self, domain: &DomainRef) -> BridgeResult<DomainId>;

    /// Registered domain by id.
    fn get_domain(&self, domain: DomainId) -> Option<Domain>;

    /// All registered domain ids, in registration order.
    fn domain_ids(&self) -> Vec<DomainId>;

    /// Set the provider for a domain.
    fn register_provider(&self, domain: DomainId, provider: Arc<dyn Provider>);

    /// Provider for a domain.
    fn get_provider(&self, domain: DomainId) -> Option<Arc<dyn Provider>>;

    /// Set the signer for a domain.
    fn register_signer(&self, domain: DomainId, signer: Arc<dyn Signer>);

    /// Remove the signer for a domain.
    fn unregister_signer(&self, domain: DomainId);

    /// Remove every signer.
    fn clear_signers(&self);

    /// Signer for a domain.
    fn get_signer(&self, domain: DomainId) -> Option<Arc<dyn Signer>>;

    /// Current connection for a domain: the provider combined with the
    /// signer when one is registered. `None` without a provider.
    fn get_connection(&self, domain: DomainId) -> Option<Connection> {
        let provider = self.get_provider(domain)?;
        Some(match self.get_signer(domain) {
            Some(signer) => Connection::signing(provider, signer),
            None => Connection::read_only(provider),
        })
    }
}

/// Common surface of every contract handle.
pub trait BoundContract: Send + Sync + fmt::Debug {
    /// Domain the contract is deployed on.
    fn domain(&self) -> DomainId;

    /// Contract address.
    fn address(&self) -> H160;

    /// Connection the handle is bound to.
    fn connection(&self) -> Option<&Connection>;
}

/// Home contract: origin of outbound messages.
#[async_trait]
pub trait HomeContract: BoundContract {
    /// Next nonce for messages to `destination`.
    async fn nonces(&self, destination: DomainId) -> Result<u32, ChainError>;
}

/// Replica contract: local mirror of a remote home.
#[async_trait]
pub trait ReplicaContract: BoundContract {
    /// Domain whose home this replicates.
    fn remote_domain(&self) -> DomainId;

    /// Delivery status of a message leaf.
    async fn message_status(&self, leaf: H256) -> Result<MessageStatus, ChainError>;
}

/// Bridge router: representation lookup and transfer dispatch.
#[async_trait]
pub trait BridgeRouterContract: BoundContract {
    /// Local address of `(token_domain, id)`, zero if none.
    async fn get_local_address(&self, token_domain: DomainId, id: H256)
        -> Result<H160, ChainError>;

    /// Canonical identity of a local representation, `(0, 0)` if the address
    /// is not a representation.
    async fn representation_to_canonical(
        &self,
        representation: H160,
    ) -> Result<(DomainId, H256), ChainError>;

    /// Submit a transfer of `amount` of `token` to `recipient` on `destination`.
    async fn send(
        &self,
        token: H160,
        amount: U256,
        destination: DomainId,
        recipient: H256,
        overrides: TxOverrides,
    ) -> Result<H256, ChainError>;
}

/// Native-asset helper: wraps and sends the chain's native asset.
#[async_trait]
pub trait NativeHelperContract: BoundContract {
    /// Submit a value-bearing transfer to `recipient` on `destination`.
    async fn send(
        &self,
        destination: DomainId,
        recipient: H256,
        value: U256,
        overrides: TxOverrides,
    ) -> Result<H256, ChainError>;
}

/// ERC20-style token.
#[async_trait]
pub trait TokenContract: BoundContract {
    /// Allowance granted by `owner` to `spender`.
    async fn allowance(&self, owner: H160, spender: H160) -> Result<U256, ChainError>;

    /// Approve `spender` for `amount`.
    async fn approve(
        &self,
        spender: H160,
        amount: U256,
        overrides: TxOverrides,
    ) -> Result<H256, ChainError>;

    /// Balance of `owner`.
    async fn balance_of(&self, owner: H160) -> Result<U256, ChainError>;
}

/// Builds contract handles bound to a connection.
pub trait ContractFactory: Send + Sync {
    /// Home handle.
    fn home(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn HomeContract>;

    /// Handle to the replica of `remote`'s home deployed on `domain`.
    fn replica(
        &self,
        domain: DomainId,
        remote: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn ReplicaContract>;

    /// Bridge router handle.
    fn bridge_router(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn BridgeRouterContract>;

    /// Native-asset helper handle.
    fn native_helper(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn NativeHelperContract>;

    /// Token handle.
    fn token(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn TokenContract>;
}
