//! In-Memory Ledger Adapter
//!
//! Simulates the deployed contracts of every domain in one shared state:
//! homes, bridge routers, native helpers, tokens and replicas. Transactions
//! are mined immediately and their receipts kept for providers to return.
//!
//! Used by tests and local simulation; a chain-backed adapter would make RPC
//! calls instead.

use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::{H160, H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::algorithms::{
    canonize, destination_and_nonce, encode_message, encode_transfer_action, evm_id, leaf_hash,
};
use crate::config::BridgeContextConfig;
use crate::domain::{
    BridgeMessage, ChainError, ContractEvent, DispatchEvent, DomainId, MessageStatus, ReceiptLog,
    TokenIdentifier, TransferAction, TxReceipt,
};
use crate::ports::outbound::Provider;

/// Kind of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxKind {
    /// Token approval.
    Approve {
        /// Token contract
        token: H160,
        /// Approved spender
        spender: H160,
        /// Approved amount
        amount: U256,
    },
    /// Bridge router send.
    Send {
        /// Token contract
        token: H160,
        /// Amount sent
        amount: U256,
        /// Destination domain
        destination: DomainId,
    },
    /// Native helper send.
    SendNative {
        /// Value sent
        value: U256,
        /// Destination domain
        destination: DomainId,
    },
}

/// A transaction submitted to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedTx {
    /// Domain it was submitted on.
    pub domain: DomainId,
    /// Transaction hash.
    pub hash: H256,
    /// Sender.
    pub from: H160,
    /// What it did.
    pub kind: TxKind,
}

#[derive(Default)]
struct RouterState {
    address: H160,
    local: HashMap<(DomainId, H256), H160>,
    canonical: HashMap<H160, (DomainId, H256)>,
}

#[derive(Default)]
struct TokenState {
    allowances: HashMap<(H160, H160), U256>,
    balances: HashMap<H160, U256>,
}

#[derive(Default)]
struct HomeState {
    address: H160,
    nonces: HashMap<DomainId, u32>,
    leaf_count: u64,
}

#[derive(Default)]
struct LedgerState {
    homes: HashMap<DomainId, HomeState>,
    routers: HashMap<DomainId, RouterState>,
    native_tokens: HashMap<DomainId, H160>,
    native_balances: HashMap<(DomainId, H160), U256>,
    tokens: HashMap<(DomainId, H160), TokenState>,
    replica_status: HashMap<(DomainId, DomainId, H256), MessageStatus>,
    receipts: HashMap<H256, TxReceipt>,
    submitted: Vec<SubmittedTx>,
    failing: HashSet<DomainId>,
    reverting: HashSet<DomainId>,
    tx_count: u64,
    block: u64,
}

fn revert(reason: &str) -> ChainError {
    ChainError::Rpc(format!("execution reverted: {}", reason))
}

impl LedgerState {
    fn check_available(&self, domain: DomainId) -> Result<(), ChainError> {
        if self.failing.contains(&domain) {
            return Err(ChainError::Rpc(format!("domain {} unreachable", domain)));
        }
        Ok(())
    }

    fn mine(
        &mut self,
        domain: DomainId,
        from: H160,
        kind: TxKind,
        logs: Vec<ReceiptLog>,
    ) -> H256 {
        self.tx_count += 1;
        self.block += 1;
        let hash = leaf_hash(&[&domain.to_be_bytes()[..], &self.tx_count.to_be_bytes()[..]].concat());
        let receipt = TxReceipt {
            transaction_hash: hash,
            block_number: self.block,
            status: !self.reverting.contains(&domain),
            logs,
        };
        self.receipts.insert(hash, receipt);
        self.submitted.push(SubmittedTx {
            domain,
            hash,
            from,
            kind,
        });
        hash
    }

    fn dispatch(
        &mut self,
        origin: DomainId,
        destination: DomainId,
        token: TokenIdentifier,
        to: H256,
        amount: U256,
    ) -> Result<ReceiptLog, ChainError> {
        let sender = self
            .routers
            .get(&origin)
            .map(|r| canonize(r.address))
            .ok_or_else(|| revert("!router"))?;
        let recipient = self
            .routers
            .get(&destination)
            .map(|r| canonize(r.address))
            .ok_or_else(|| revert("!remote"))?;
        let home = self.homes.get_mut(&origin).ok_or_else(|| revert("!home"))?;

        let nonce = home.nonces.entry(destination).or_insert(0);
        let current = *nonce;
        *nonce += 1;
        let leaf_index = U256::from(home.leaf_count);
        home.leaf_count += 1;

        let message = encode_message(&BridgeMessage {
            origin,
            sender,
            nonce: current,
            destination,
            recipient,
            body: encode_transfer_action(&TransferAction { token, to, amount }),
        });
        Ok(ReceiptLog {
            address: home.address,
            event: ContractEvent::Dispatch(DispatchEvent {
                message_hash: leaf_hash(&message),
                leaf_index,
                destination_and_nonce: destination_and_nonce(destination, current),
                committed_root: H256::zero(),
                message,
            }),
        })
    }

    fn canonical_of(&self, domain: DomainId, token: H160) -> Result<TokenIdentifier, ChainError> {
        let router = self.routers.get(&domain).ok_or_else(|| revert("!router"))?;
        if let Some((canonical_domain, id)) = router.canonical.get(&token) {
            return Ok(TokenIdentifier::new(*canonical_domain, *id));
        }
        let id = canonize(token);
        match router.local.get(&(domain, id)) {
            Some(local) if *local == token => Ok(TokenIdentifier::new(domain, id)),
            _ => Err(revert("!token")),
        }
    }
}

/// Shared simulated state of every domain.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy the homes and bridges described by `config`.
    pub fn from_config(config: &BridgeContextConfig) -> Self {
        let ledger = Self::new();
        {
            let mut state = ledger.state.write();
            for domain in &config.domains {
                state.homes.insert(
                    domain.id,
                    HomeState {
                        address: domain.home,
                        ..Default::default()
                    },
                );
                if let Some(bridge) = &domain.bridge {
                    state.routers.insert(
                        domain.id,
                        RouterState {
                            address: bridge.router,
                            ..Default::default()
                        },
                    );
                }
            }
        }
        ledger
    }

    /// Provider reading from this ledger.
    pub fn provider(&self, endpoint: impl Into<String>) -> Arc<InMemoryProvider> {
        Arc::new(InMemoryProvider {
            endpoint: endpoint.into(),
            ledger: self.clone(),
        })
    }

    /// Deploy a token canonical on `domain` at `address`.
    pub fn register_canonical_token(&self, domain: DomainId, address: H160) -> TokenIdentifier {
        let mut state = self.state.write();
        let id = canonize(address);
        if let Some(router) = state.routers.get_mut(&domain) {
            router.local.insert((domain, id), address);
        }
        state.tokens.entry((domain, address)).or_default();
        TokenIdentifier::new(domain, id)
    }

    /// Deploy a representation of `token` on `domain` at `address`.
    pub fn deploy_representation(&self, domain: DomainId, token: TokenIdentifier, address: H160) {
        let mut state = self.state.write();
        if let Some(router) = state.routers.get_mut(&domain) {
            router.local.insert((token.domain, token.id), address);
            router.canonical.insert(address, (token.domain, token.id));
        }
        state.tokens.entry((domain, address)).or_default();
    }

    /// Deploy the wrapped native token used by `domain`'s native helper.
    pub fn register_native_token(&self, domain: DomainId, address: H160) -> TokenIdentifier {
        let token = self.register_canonical_token(domain, address);
        self.state.write().native_tokens.insert(domain, address);
        token
    }

    /// Credit `owner` with `amount` of the token at `token` on `domain`.
    pub fn mint(&self, domain: DomainId, token: H160, owner: H160, amount: U256) {
        let mut state = self.state.write();
        let balance = state
            .tokens
            .entry((domain, token))
            .or_default()
            .balances
            .entry(owner)
            .or_insert_with(U256::zero);
        *balance = balance.saturating_add(amount);
    }

    /// Credit `owner` with `amount` of `domain`'s native asset.
    pub fn fund_native(&self, domain: DomainId, owner: H160, amount: U256) {
        let mut state = self.state.write();
        let balance = state
            .native_balances
            .entry((domain, owner))
            .or_insert_with(U256::zero);
        *balance = balance.saturating_add(amount);
    }

    /// Set an allowance directly.
    pub fn set_allowance(
        &self,
        domain: DomainId,
        token: H160,
        owner: H160,
        spender: H160,
        amount: U256,
    ) {
        self.state
            .write()
            .tokens
            .entry((domain, token))
            .or_default()
            .allowances
            .insert((owner, spender), amount);
    }

    /// Make every call on `domain` fail with an RPC error.
    pub fn set_failing(&self, domain: DomainId, failing: bool) {
        let mut state = self.state.write();
        if failing {
            state.failing.insert(domain);
        } else {
            state.failing.remove(&domain);
        }
    }

    /// Mine transactions on `domain` with a failed status.
    pub fn set_reverting(&self, domain: DomainId, reverting: bool) {
        let mut state = self.state.write();
        if reverting {
            state.reverting.insert(domain);
        } else {
            state.reverting.remove(&domain);
        }
    }

    /// Record the status of `leaf` on the replica of `remote` deployed on `local`.
    pub fn set_message_status(
        &self,
        local: DomainId,
        remote: DomainId,
        leaf: H256,
        status: MessageStatus,
    ) {
        self.state
            .write()
            .replica_status
            .insert((local, remote, leaf), status);
    }

    /// Transactions submitted so far, in order.
    pub fn submitted(&self) -> Vec<SubmittedTx> {
        self.state.read().submitted.clone()
    }

    /// Token balance.
    pub fn balance(&self, domain: DomainId, token: H160, owner: H160) -> U256 {
        self.state
            .read()
            .tokens
            .get(&(domain, token))
            .and_then(|t| t.balances.get(&owner).copied())
            .unwrap_or_default()
    }

    pub(crate) fn receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError> {
        self.state
            .read()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(ChainError::Dropped(tx_hash))
    }

    pub(crate) fn check_available(&self, domain: DomainId) -> Result<(), ChainError> {
        self.state.read().check_available(domain)
    }

    pub(crate) fn nonces(&self, domain: DomainId, destination: DomainId) -> Result<u32, ChainError> {
        let state = self.state.read();
        state.check_available(domain)?;
        let home = state.homes.get(&domain).ok_or_else(|| revert("!home"))?;
        Ok(home.nonces.get(&destination).copied().unwrap_or(0))
    }

    pub(crate) fn message_status(
        &self,
        local: DomainId,
        remote: DomainId,
        leaf: H256,
    ) -> Result<MessageStatus, ChainError> {
        let state = self.state.read();
        state.check_available(local)?;
        Ok(state
            .replica_status
            .get(&(local, remote, leaf))
            .copied()
            .unwrap_or_default())
    }

    pub(crate) fn get_local_address(
        &self,
        domain: DomainId,
        token_domain: DomainId,
        id: H256,
    ) -> Result<H160, ChainError> {
        let state = self.state.read();
        state.check_available(domain)?;
        let router = state.routers.get(&domain).ok_or_else(|| revert("!router"))?;
        if let Some(address) = router.local.get(&(token_domain, id)) {
            return Ok(*address);
        }
        if token_domain == domain {
            // local tokens unknown to the router still narrow to their address
            if let Ok(address) = evm_id(id) {
                if state.tokens.contains_key(&(domain, address)) {
                    return Ok(address);
                }
            }
        }
        Ok(H160::zero())
    }

    pub(crate) fn representation_to_canonical(
        &self,
        domain: DomainId,
        representation: H160,
    ) -> Result<(DomainId, H256), ChainError> {
        let state = self.state.read();
        state.check_available(domain)?;
        let router = state.routers.get(&domain).ok_or_else(|| revert("!router"))?;
        Ok(router
            .canonical
            .get(&representation)
            .copied()
            .unwrap_or((0, H256::zero())))
    }

    pub(crate) fn allowance(
        &self,
        domain: DomainId,
        token: H160,
        owner: H160,
        spender: H160,
    ) -> Result<U256, ChainError> {
        let state = self.state.read();
        state.check_available(domain)?;
        let token = state.tokens.get(&(domain, token)).ok_or_else(|| revert("!contract"))?;
        Ok(token
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default())
    }

    pub(crate) fn token_balance(
        &self,
        domain: DomainId,
        token: H160,
        owner: H160,
    ) -> Result<U256, ChainError> {
        let state = self.state.read();
        state.check_available(domain)?;
        let token = state.tokens.get(&(domain, token)).ok_or_else(|| revert("!contract"))?;
        Ok(token.balances.get(&owner).copied().unwrap_or_default())
    }

    pub(crate) fn approve(
        &self,
        domain: DomainId,
        token: H160,
        owner: H160,
        spender: H160,
        amount: U256,
    ) -> Result<H256, ChainError> {
        let mut state = self.state.write();
        state.check_available(domain)?;
        state
            .tokens
            .get_mut(&(domain, token))
            .ok_or_else(|| revert("!contract"))?
            .allowances
            .insert((owner, spender), amount);
        let log = ReceiptLog {
            address: token,
            event: ContractEvent::Approval {
                owner,
                spender,
                value: amount,
            },
        };
        let hash = state.mine(
            domain,
            owner,
            TxKind::Approve {
                token,
                spender,
                amount,
            },
            vec![log],
        );
        debug!("[qc-15] ledger: approve on domain {} -> {:?}", domain, hash);
        Ok(hash)
    }

    pub(crate) fn router_send(
        &self,
        domain: DomainId,
        sender: H160,
        token: H160,
        amount: U256,
        destination: DomainId,
        recipient: H256,
    ) -> Result<H256, ChainError> {
        let mut state = self.state.write();
        state.check_available(domain)?;
        if destination == domain || !state.routers.contains_key(&destination) {
            return Err(revert("!remote"));
        }
        let canonical = state.canonical_of(domain, token)?;
        let router = state
            .routers
            .get(&domain)
            .map(|r| r.address)
            .ok_or_else(|| revert("!router"))?;

        let token_state = state
            .tokens
            .get_mut(&(domain, token))
            .ok_or_else(|| revert("!contract"))?;
        let allowance = token_state
            .allowances
            .get(&(sender, router))
            .copied()
            .unwrap_or_default();
        if allowance < amount {
            return Err(revert("ERC20: insufficient allowance"));
        }
        let balance = token_state.balances.get(&sender).copied().unwrap_or_default();
        if balance < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        token_state.allowances.insert((sender, router), allowance - amount);
        token_state.balances.insert(sender, balance - amount);

        let log = state.dispatch(domain, destination, canonical, recipient, amount)?;
        Ok(state.mine(
            domain,
            sender,
            TxKind::Send {
                token,
                amount,
                destination,
            },
            vec![log],
        ))
    }

    pub(crate) fn native_send(
        &self,
        domain: DomainId,
        sender: H160,
        destination: DomainId,
        recipient: H256,
        value: U256,
    ) -> Result<H256, ChainError> {
        let mut state = self.state.write();
        state.check_available(domain)?;
        if destination == domain || !state.routers.contains_key(&destination) {
            return Err(revert("!remote"));
        }
        let wrapped = *state.native_tokens.get(&domain).ok_or_else(|| revert("!weth"))?;
        let balance = state
            .native_balances
            .get(&(domain, sender))
            .copied()
            .unwrap_or_default();
        if balance < value {
            return Err(revert("insufficient funds"));
        }
        state.native_balances.insert((domain, sender), balance - value);

        let token = TokenIdentifier::new(domain, canonize(wrapped));
        let log = state.dispatch(domain, destination, token, recipient, value)?;
        Ok(state.mine(
            domain,
            sender,
            TxKind::SendNative { value, destination },
            vec![log],
        ))
    }
}

/// Provider backed by an [`InMemoryLedger`].
#[derive(Clone)]
pub struct InMemoryProvider {
    endpoint: String,
    ledger: InMemoryLedger,
}

impl std::fmt::Debug for InMemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProvider")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        _confirmations: u64,
    ) -> Result<TxReceipt, ChainError> {
        // transactions are mined on submission
        self.ledger.receipt(tx_hash)
    }
}
