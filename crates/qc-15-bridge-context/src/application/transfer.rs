//! # Transfer Orchestrator
//!
//! Sends assets between domains and packages the send receipt into a
//! [`TransferMessage`].

use async_trait::async_trait;
use primitive_types::{H160, U256};
use tracing::{debug, info};

use super::context::BridgeContext;
use super::contracts::BridgeContracts;
use crate::algorithms::canonize;
use crate::domain::{BridgeError, BridgeResult, DomainId, TransferMessage, TxReceipt};
use crate::ports::{
    BoundContract, Connection, ConnectionRegistry, ContractDirectoryApi, ContractFactory,
    NativeTransferRequest,
    TokenResolverApi, TransferApi, TransferRequest,
};

fn check_amount(amount: U256) -> BridgeResult<()> {
    if amount.is_zero() {
        return Err(BridgeError::InvalidAmount(
            "transfer amount must be non-zero".to_string(),
        ));
    }
    Ok(())
}

impl<R: ConnectionRegistry, F: ContractFactory> BridgeContext<R, F> {
    /// Address that signs through the bridge handles bound on `domain`.
    fn bound_signer(bridge: &BridgeContracts, domain: DomainId) -> BridgeResult<H160> {
        bridge
            .connection()
            .and_then(Connection::signer_address)
            .ok_or(BridgeError::NoSigner(domain))
    }

    fn transfer_message(&self, origin: DomainId, receipt: &TxReceipt) -> BridgeResult<TransferMessage> {
        let home = self.must_get_core(origin.into())?.home().address();
        let message = TransferMessage::single_from_receipt(origin, home, receipt)?;
        info!(
            "[qc-15] Dispatched message {:?}: {} -> {} nonce {}",
            message.leaf(),
            message.origin(),
            message.destination(),
            message.nonce()
        );
        Ok(message)
    }
}

#[async_trait]
impl<R: ConnectionRegistry, F: ContractFactory> TransferApi for BridgeContext<R, F> {
    async fn send(&self, request: TransferRequest) -> BridgeResult<TransferMessage> {
        let from = self.resolve_domain(request.from)?;
        let to = self.resolve_domain(request.to)?;
        check_amount(request.amount)?;
        let token = request.token;

        let bridge = self.must_get_bridge(from.into())?;
        let router = bridge.router();
        let representation = self
            .resolve_representation(from.into(), &token)
            .await?
            .ok_or_else(|| BridgeError::TokenUnavailable {
                domain: from,
                token: token.to_string(),
            })?;
        let owner = Self::bound_signer(bridge, from)?;

        let spender = router.address();
        let allowance = representation
            .allowance(owner, spender)
            .await
            .map_err(|e| BridgeError::chain(from, "allowance", e))?;
        if allowance < request.amount {
            debug!(
                "[qc-15] Allowance {} below {} on domain {}, approving router",
                allowance, request.amount, from
            );
            let approval = representation
                .approve(spender, request.amount, request.overrides)
                .await
                .map_err(|e| BridgeError::chain(from, "approve", e))?;
            info!("[qc-15] Submitted approval {:?} on domain {}", approval, from);
            self.confirm(from, "approve", approval).await?;
        }

        let tx_hash = router
            .send(
                representation.address(),
                request.amount,
                to,
                canonize(request.recipient),
                request.overrides,
            )
            .await
            .map_err(|e| BridgeError::chain(from, "send", e))?;
        info!(
            "[qc-15] Submitted transfer {:?} of {} from domain {} to {}",
            tx_hash, token, from, to
        );
        let receipt = self.confirm(from, "send", tx_hash).await?;

        self.transfer_message(from, &receipt)
    }

    async fn send_native(&self, request: NativeTransferRequest) -> BridgeResult<TransferMessage> {
        let from = self.resolve_domain(request.from)?;
        let to = self.resolve_domain(request.to)?;
        check_amount(request.amount)?;

        let bridge = self.must_get_bridge(from.into())?;
        let helper = bridge
            .native_helper()
            .ok_or(BridgeError::NoNativeHelper(from))?;
        Self::bound_signer(bridge, from)?;

        let tx_hash = helper
            .send(
                to,
                canonize(request.recipient),
                request.amount,
                request.overrides,
            )
            .await
            .map_err(|e| BridgeError::chain(from, "send_native", e))?;
        info!(
            "[qc-15] Submitted native transfer {:?} of {} from domain {} to {}",
            tx_hash, request.amount, from, to
        );
        let receipt = self.confirm(from, "send_native", tx_hash).await?;

        self.transfer_message(from, &receipt)
    }
}
