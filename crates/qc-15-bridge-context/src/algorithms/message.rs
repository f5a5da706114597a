//! # Message Encoding
//!
//! Wire format of dispatched messages and of the transfer action they carry.
//!
//! ```text
//! message:  origin u32 | sender [32] | nonce u32 | destination u32 | recipient [32] | body
//! transfer: token domain u32 | token id [32] | 0x03 | to [32] | amount u256
//! ```
//!
//! All integers are big-endian.

use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

use crate::domain::{
    BridgeError, BridgeMessage, BridgeResult, DomainId, TokenIdentifier, TransferAction,
};

/// Length of the fixed message header.
pub const MESSAGE_HEADER_LEN: usize = 4 + 32 + 4 + 4 + 32;

/// Action tag of a transfer body.
pub const TRANSFER_ACTION_TAG: u8 = 0x03;

/// Length of an encoded transfer body.
pub const TRANSFER_BODY_LEN: usize = 4 + 32 + 1 + 32 + 32;

/// Destination and destination-specific nonce combined in a single field.
pub fn destination_and_nonce(destination: DomainId, nonce: u32) -> u64 {
    ((destination as u64) << 32) | nonce as u64
}

/// Inverse of [`destination_and_nonce`].
pub fn split_destination_and_nonce(combined: u64) -> (DomainId, u32) {
    ((combined >> 32) as u32, combined as u32)
}

/// keccak256 of the message, the leaf replicas track it by.
pub fn leaf_hash(message: &[u8]) -> H256 {
    H256::from_slice(Keccak256::digest(message).as_slice())
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_be_bytes(word)
}

/// Encode a message.
pub fn encode_message(message: &BridgeMessage) -> Vec<u8> {
    let mut out = Vec::with_capacity(MESSAGE_HEADER_LEN + message.body.len());
    out.extend_from_slice(&message.origin.to_be_bytes());
    out.extend_from_slice(message.sender.as_bytes());
    out.extend_from_slice(&message.nonce.to_be_bytes());
    out.extend_from_slice(&message.destination.to_be_bytes());
    out.extend_from_slice(message.recipient.as_bytes());
    out.extend_from_slice(&message.body);
    out
}

/// Decode a message.
pub fn decode_message(bytes: &[u8]) -> BridgeResult<BridgeMessage> {
    if bytes.len() < MESSAGE_HEADER_LEN {
        return Err(BridgeError::InvalidMessage(format!(
            "message of {} bytes is shorter than its header",
            bytes.len()
        )));
    }
    Ok(BridgeMessage {
        origin: read_u32(bytes, 0),
        sender: H256::from_slice(&bytes[4..36]),
        nonce: read_u32(bytes, 36),
        destination: read_u32(bytes, 40),
        recipient: H256::from_slice(&bytes[44..76]),
        body: bytes[MESSAGE_HEADER_LEN..].to_vec(),
    })
}

/// Encode a transfer body.
pub fn encode_transfer_action(action: &TransferAction) -> Vec<u8> {
    let mut out = Vec::with_capacity(TRANSFER_BODY_LEN);
    out.extend_from_slice(&action.token.domain.to_be_bytes());
    out.extend_from_slice(action.token.id.as_bytes());
    out.push(TRANSFER_ACTION_TAG);
    out.extend_from_slice(action.to.as_bytes());
    let mut amount = [0u8; 32];
    action.amount.to_big_endian(&mut amount);
    out.extend_from_slice(&amount);
    out
}

/// Decode a transfer body.
pub fn decode_transfer_action(body: &[u8]) -> BridgeResult<TransferAction> {
    if body.len() != TRANSFER_BODY_LEN {
        return Err(BridgeError::InvalidMessage(format!(
            "transfer body must be {} bytes, got {}",
            TRANSFER_BODY_LEN,
            body.len()
        )));
    }
    if body[36] != TRANSFER_ACTION_TAG {
        return Err(BridgeError::InvalidMessage(format!(
            "unexpected action tag {:#04x}",
            body[36]
        )));
    }
    Ok(TransferAction {
        token: TokenIdentifier::new(read_u32(body, 0), H256::from_slice(&body[4..36])),
        to: H256::from_slice(&body[37..69]),
        amount: U256::from_big_endian(&body[69..101]),
    })
}
