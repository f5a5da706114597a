//! # Algorithms Module
//!
//! Pure logic: address canonicalization and message encoding.

pub mod canonical;
pub mod message;

pub use canonical::{canonize, canonize_bytes, evm_id, parse_canonical_id, strip_0x_prefix};
pub use message::{
    decode_message, decode_transfer_action, destination_and_nonce, encode_message,
    encode_transfer_action, leaf_hash, split_destination_and_nonce, MESSAGE_HEADER_LEN,
    TRANSFER_ACTION_TAG, TRANSFER_BODY_LEN,
};
