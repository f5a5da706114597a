//! In-Memory Contract Handles
//!
//! Handles produced by [`InMemoryLedger`] acting as a [`ContractFactory`].
//! Reads need a connection; writes also need a signer, whose address becomes
//! the transaction sender.

use async_trait::async_trait;
use primitive_types::{H160, H256, U256};
use std::sync::Arc;
use tracing::debug;

use super::ledger::InMemoryLedger;
use crate::domain::{ChainError, DomainId, MessageStatus, TxOverrides};
use crate::ports::outbound::{
    BoundContract, BridgeRouterContract, Connection, ContractFactory, HomeContract,
    NativeHelperContract, ReplicaContract, TokenContract,
};

/// State shared by every in-memory handle.
#[derive(Clone)]
struct Binding {
    ledger: InMemoryLedger,
    domain: DomainId,
    address: H160,
    connection: Option<Connection>,
}

impl Binding {
    fn reader(&self) -> Result<(), ChainError> {
        if self.connection.is_none() {
            return Err(ChainError::NotConnected);
        }
        self.ledger.check_available(self.domain)
    }

    fn sender(&self) -> Result<H160, ChainError> {
        let connection = self.connection.as_ref().ok_or(ChainError::NotConnected)?;
        connection.signer_address().ok_or(ChainError::NoSigner)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("domain", &self.domain)
            .field("address", &self.address)
            .field("connection", &self.connection)
            .finish()
    }
}

macro_rules! bound_contract {
    ($ty:ty) => {
        impl BoundContract for $ty {
            fn domain(&self) -> DomainId {
                self.binding.domain
            }

            fn address(&self) -> H160 {
                self.binding.address
            }

            fn connection(&self) -> Option<&Connection> {
                self.binding.connection.as_ref()
            }
        }
    };
}

/// In-memory home handle.
#[derive(Clone, Debug)]
pub struct InMemoryHome {
    binding: Binding,
}

bound_contract!(InMemoryHome);

#[async_trait]
impl HomeContract for InMemoryHome {
    async fn nonces(&self, destination: DomainId) -> Result<u32, ChainError> {
        self.binding.reader()?;
        self.binding.ledger.nonces(self.binding.domain, destination)
    }
}

/// In-memory replica handle.
#[derive(Clone, Debug)]
pub struct InMemoryReplica {
    binding: Binding,
    remote: DomainId,
}

bound_contract!(InMemoryReplica);

#[async_trait]
impl ReplicaContract for InMemoryReplica {
    fn remote_domain(&self) -> DomainId {
        self.remote
    }

    async fn message_status(&self, leaf: H256) -> Result<MessageStatus, ChainError> {
        self.binding.reader()?;
        self.binding
            .ledger
            .message_status(self.binding.domain, self.remote, leaf)
    }
}

/// In-memory bridge router handle.
#[derive(Clone, Debug)]
pub struct InMemoryBridgeRouter {
    binding: Binding,
}

bound_contract!(InMemoryBridgeRouter);

#[async_trait]
impl BridgeRouterContract for InMemoryBridgeRouter {
    async fn get_local_address(
        &self,
        token_domain: DomainId,
        id: H256,
    ) -> Result<H160, ChainError> {
        self.binding.reader()?;
        self.binding
            .ledger
            .get_local_address(self.binding.domain, token_domain, id)
    }

    async fn representation_to_canonical(
        &self,
        representation: H160,
    ) -> Result<(DomainId, H256), ChainError> {
        self.binding.reader()?;
        self.binding
            .ledger
            .representation_to_canonical(self.binding.domain, representation)
    }

    async fn send(
        &self,
        token: H160,
        amount: U256,
        destination: DomainId,
        recipient: H256,
        overrides: TxOverrides,
    ) -> Result<H256, ChainError> {
        let sender = self.binding.sender()?;
        debug!(
            "[qc-15] router send on domain {} (gas limit {:?})",
            self.binding.domain, overrides.gas_limit
        );
        self.binding.ledger.router_send(
            self.binding.domain,
            sender,
            token,
            amount,
            destination,
            recipient,
        )
    }
}

/// In-memory native helper handle.
#[derive(Clone, Debug)]
pub struct InMemoryNativeHelper {
    binding: Binding,
}

bound_contract!(InMemoryNativeHelper);

#[async_trait]
impl NativeHelperContract for InMemoryNativeHelper {
    async fn send(
        &self,
        destination: DomainId,
        recipient: H256,
        value: U256,
        _overrides: TxOverrides,
    ) -> Result<H256, ChainError> {
        let sender = self.binding.sender()?;
        self.binding
            .ledger
            .native_send(self.binding.domain, sender, destination, recipient, value)
    }
}

/// In-memory token handle.
#[derive(Clone, Debug)]
pub struct InMemoryToken {
    binding: Binding,
}

bound_contract!(InMemoryToken);

#[async_trait]
impl TokenContract for InMemoryToken {
    async fn allowance(&self, owner: H160, spender: H160) -> Result<U256, ChainError> {
        self.binding.reader()?;
        self.binding
            .ledger
            .allowance(self.binding.domain, self.binding.address, owner, spender)
    }

    async fn approve(
        &self,
        spender: H160,
        amount: U256,
        _overrides: TxOverrides,
    ) -> Result<H256, ChainError> {
        let owner = self.binding.sender()?;
        self.binding.ledger.approve(
            self.binding.domain,
            self.binding.address,
            owner,
            spender,
            amount,
        )
    }

    async fn balance_of(&self, owner: H160) -> Result<U256, ChainError> {
        self.binding.reader()?;
        self.binding
            .ledger
            .token_balance(self.binding.domain, self.binding.address, owner)
    }
}

impl InMemoryLedger {
    fn bind(&self, domain: DomainId, address: H160, connection: Option<Connection>) -> Binding {
        Binding {
            ledger: self.clone(),
            domain,
            address,
            connection,
        }
    }
}

impl ContractFactory for InMemoryLedger {
    fn home(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn HomeContract> {
        Arc::new(InMemoryHome {
            binding: self.bind(domain, address, connection),
        })
    }

    fn replica(
        &self,
        domain: DomainId,
        remote: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn ReplicaContract> {
        Arc::new(InMemoryReplica {
            binding: self.bind(domain, address, connection),
            remote,
        })
    }

    fn bridge_router(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn BridgeRouterContract> {
        Arc::new(InMemoryBridgeRouter {
            binding: self.bind(domain, address, connection),
        })
    }

    fn native_helper(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn NativeHelperContract> {
        Arc::new(InMemoryNativeHelper {
            binding: self.bind(domain, address, connection),
        })
    }

    fn token(
        &self,
        domain: DomainId,
        address: H160,
        connection: Option<Connection>,
    ) -> Arc<dyn TokenContract> {
        Arc::new(InMemoryToken {
            binding: self.bind(domain, address, connection),
        })
    }
}
