//! # Domain Entities
//!
//! Receipts, dispatch events and the transfer messages built from them.

use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};

use super::errors::{BridgeError, BridgeResult};
use super::value_objects::{DomainId, TokenIdentifier};
use crate::algorithms::{
    decode_message, decode_transfer_action, leaf_hash, split_destination_and_nonce,
};

/// `Dispatch` event emitted by a Home when a message is enqueued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// keccak256 of `message`.
    pub message_hash: H256,
    /// Index of the leaf in the home's merkle tree.
    pub leaf_index: U256,
    /// `(destination << 32) | nonce`.
    pub destination_and_nonce: u64,
    /// Root committed to before this message.
    pub committed_root: H256,
    /// Raw message bytes.
    pub message: Vec<u8>,
}

/// Decoded contract event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    /// Home dispatched a message.
    Dispatch(DispatchEvent),
    /// Token approval.
    Approval {
        /// Token owner
        owner: H160,
        /// Approved spender
        spender: H160,
        /// Approved amount
        value: U256,
    },
    /// Any event this layer does not interpret.
    Other {
        /// Topic 0
        topic: H256,
    },
}

/// A log entry in a receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    /// Emitting contract.
    pub address: H160,
    /// Decoded event.
    pub event: ContractEvent,
}

/// Finalized transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub transaction_hash: H256,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// `true` if execution succeeded.
    pub status: bool,
    /// Emitted logs, in order.
    pub logs: Vec<ReceiptLog>,
}

/// Header-decoded cross-domain message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeMessage {
    /// Origin domain.
    pub origin: DomainId,
    /// Sender on the origin, canonical form.
    pub sender: H256,
    /// Per-destination nonce.
    pub nonce: u32,
    /// Destination domain.
    pub destination: DomainId,
    /// Recipient on the destination, canonical form.
    pub recipient: H256,
    /// Application payload.
    pub body: Vec<u8>,
}

/// Transfer action carried in a bridge message body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAction {
    /// Canonical identity of the transferred token.
    pub token: TokenIdentifier,
    /// Final recipient of the tokens, canonical form.
    pub to: H256,
    /// Amount transferred.
    pub amount: U256,
}

/// Handle over a cross-domain transfer, built from the send receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMessage {
    /// Dispatch event as emitted by the origin's home.
    pub dispatch: DispatchEvent,
    /// Decoded message header and body.
    pub message: BridgeMessage,
    /// Decoded transfer action.
    pub action: TransferAction,
    /// Receipt of the send transaction.
    pub receipt: TxReceipt,
}

impl TransferMessage {
    /// Build the message from the single dispatch emitted by `home` on
    /// `origin` in `receipt`.
    ///
    /// Returns `InternalConsistency` when the receipt holds no such dispatch,
    /// more than one, or one whose contents disagree with its event fields.
    pub fn single_from_receipt(
        origin: DomainId,
        home: H160,
        receipt: &TxReceipt,
    ) -> BridgeResult<Self> {
        let mut dispatches = receipt.logs.iter().filter_map(|log| match &log.event {
            ContractEvent::Dispatch(event) if log.address == home => Some(event),
            _ => None,
        });

        let dispatch = dispatches.next().ok_or_else(|| {
            BridgeError::InternalConsistency(format!(
                "no dispatch from home {:?} in {:?}",
                home, receipt.transaction_hash
            ))
        })?;
        if dispatches.next().is_some() {
            return Err(BridgeError::InternalConsistency(format!(
                "multiple dispatches in {:?}",
                receipt.transaction_hash
            )));
        }

        if leaf_hash(&dispatch.message) != dispatch.message_hash {
            return Err(BridgeError::InternalConsistency(format!(
                "message hash mismatch in {:?}",
                receipt.transaction_hash
            )));
        }

        let message = decode_message(&dispatch.message)?;
        let (destination, nonce) = split_destination_and_nonce(dispatch.destination_and_nonce);
        if message.origin != origin || message.destination != destination || message.nonce != nonce
        {
            return Err(BridgeError::InternalConsistency(format!(
                "dispatch header disagrees with message in {:?}",
                receipt.transaction_hash
            )));
        }
        let action = decode_transfer_action(&message.body)?;

        Ok(Self {
            dispatch: dispatch.clone(),
            message,
            action,
            receipt: receipt.clone(),
        })
    }

    /// Origin domain.
    pub fn origin(&self) -> DomainId {
        self.message.origin
    }

    /// Destination domain.
    pub fn destination(&self) -> DomainId {
        self.message.destination
    }

    /// Per-destination nonce.
    pub fn nonce(&self) -> u32 {
        self.message.nonce
    }

    /// Leaf hash tracked by replicas.
    pub fn leaf(&self) -> H256 {
        self.dispatch.message_hash
    }

    /// Send transaction hash.
    pub fn transaction_hash(&self) -> H256 {
        self.receipt.transaction_hash
    }

    /// Amount transferred.
    pub fn amount(&self) -> U256 {
        self.action.amount
    }

    /// Canonical identity of the transferred token.
    pub fn token(&self) -> TokenIdentifier {
        self.action.token
    }
}
