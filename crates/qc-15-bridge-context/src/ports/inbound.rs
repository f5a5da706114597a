//! # Inbound Ports
//!
//! API traits defining what the bridge context can do. Every domain argument
//! is a [`DomainRef`], so callers may use names and ids interchangeably.

use async_trait::async_trait;
use primitive_types::{H160, U256};
use std::sync::Arc;

use super::outbound::{Provider, ReplicaContract, Signer};
use crate::application::{BridgeContracts, CoreContracts, Representation, ResolvedTokenInfo};
use crate::domain::{BridgeResult, DomainRef, TokenIdentifier, TransferMessage, TxOverrides};

/// Contract directory - inbound port.
///
/// Mutators take `&mut self`: no lookup can run while a domain is being
/// rebound.
pub trait ContractDirectoryApi {
    /// Register a provider, then rebind the domain's contracts.
    fn register_provider(
        &mut self,
        domain: DomainRef,
        provider: Arc<dyn Provider>,
    ) -> BridgeResult<()>;

    /// Register a signer, then rebind the domain's contracts.
    fn register_signer(&mut self, domain: DomainRef, signer: Arc<dyn Signer>)
        -> BridgeResult<()>;

    /// Remove a signer, then rebind the domain's contracts.
    fn unregister_signer(&mut self, domain: DomainRef) -> BridgeResult<()>;

    /// Remove every signer, then rebind every domain.
    fn clear_signers(&mut self) -> BridgeResult<()>;

    /// Rebind one domain's contracts to the registry's current connection.
    fn rebind(&mut self, domain: DomainRef) -> BridgeResult<()>;

    /// Rebind every domain.
    fn rebind_all(&mut self) -> BridgeResult<()>;

    /// Core contracts, if registered.
    fn get_core(&self, domain: DomainRef) -> Option<&CoreContracts>;

    /// Core contracts or `MissingContracts`.
    fn must_get_core(&self, domain: DomainRef) -> BridgeResult<&CoreContracts>;

    /// Bridge contracts, if registered.
    fn get_bridge(&self, domain: DomainRef) -> Option<&BridgeContracts>;

    /// Bridge contracts or `MissingContracts`.
    fn must_get_bridge(&self, domain: DomainRef) -> BridgeResult<&BridgeContracts>;

    /// Replica of `home`'s home contract deployed on `remote`.
    fn get_replica(&self, home: DomainRef, remote: DomainRef)
        -> Option<&Arc<dyn ReplicaContract>>;

    /// Replica or `MissingReplica`.
    fn must_get_replica(
        &self,
        home: DomainRef,
        remote: DomainRef,
    ) -> BridgeResult<&Arc<dyn ReplicaContract>>;
}

/// Token resolver - inbound port.
#[async_trait]
pub trait TokenResolverApi {
    /// Representation of `token` on `domain`, or `None` if it has none there.
    async fn resolve_representation(
        &self,
        domain: DomainRef,
        token: &TokenIdentifier,
    ) -> BridgeResult<Option<Representation>>;

    /// Representations of `token` on every registered domain.
    ///
    /// Queries run concurrently. The first failing domain fails the whole
    /// call with `DomainQueryFailed`.
    async fn resolve_representations(
        &self,
        token: &TokenIdentifier,
    ) -> BridgeResult<ResolvedTokenInfo>;

    /// Canonical identity of the token at `address` on `domain`.
    async fn resolve_canonical_identifier(
        &self,
        domain: DomainRef,
        address: H160,
    ) -> BridgeResult<Option<TokenIdentifier>>;

    /// Canonical token contract for the token at `address` on `domain`.
    async fn resolve_canonical_token(
        &self,
        domain: DomainRef,
        address: H160,
    ) -> BridgeResult<Representation>;
}

/// ERC20-style transfer parameters.
#[derive(Clone, Debug)]
pub struct TransferRequest {
    /// Origin domain.
    pub from: DomainRef,
    /// Destination domain.
    pub to: DomainRef,
    /// Canonical identity of the token to send.
    pub token: TokenIdentifier,
    /// Amount to send.
    pub amount: U256,
    /// Recipient on the destination.
    pub recipient: H160,
    /// Transaction overrides.
    pub overrides: TxOverrides,
}

impl TransferRequest {
    /// Create a new transfer request.
    pub fn new(
        from: impl Into<DomainRef>,
        to: impl Into<DomainRef>,
        token: TokenIdentifier,
        amount: U256,
        recipient: H160,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            token,
            amount,
            recipient,
            overrides: TxOverrides::default(),
        }
    }

    /// Set transaction overrides.
    pub fn with_overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Native-asset transfer parameters.
#[derive(Clone, Debug)]
pub struct NativeTransferRequest {
    /// Origin domain.
    pub from: DomainRef,
    /// Destination domain.
    pub to: DomainRef,
    /// Amount of native asset to send.
    pub amount: U256,
    /// Recipient on the destination.
    pub recipient: H160,
    /// Transaction overrides.
    pub overrides: TxOverrides,
}

impl NativeTransferRequest {
    /// Create a new native transfer request.
    pub fn new(
        from: impl Into<DomainRef>,
        to: impl Into<DomainRef>,
        amount: U256,
        recipient: H160,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            recipient,
            overrides: TxOverrides::default(),
        }
    }

    /// Set transaction overrides.
    pub fn with_overrides(mut self, overrides: TxOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Transfer orchestrator - inbound port.
///
/// Sends are not idempotent: calling again submits a new transfer. Dropping
/// the returned future stops waiting but does not recall transactions already
/// submitted; they stay live on-chain.
#[async_trait]
pub trait TransferApi {
    /// Send an ERC20-style token, approving the router first if needed.
    async fn send(&self, request: TransferRequest) -> BridgeResult<TransferMessage>;

    /// Send the origin's native asset through its helper.
    async fn send_native(&self, request: NativeTransferRequest) -> BridgeResult<TransferMessage>;
}
