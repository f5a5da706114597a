//! # Address Canonicalization
//!
//! Every address is keyed by its 32-byte canonical form. Native addresses are
//! only produced at the contract-call boundary.

use primitive_types::{H160, H256};

use crate::domain::{BridgeError, BridgeResult};

/// Strips the `0x` prefix off a hex string, if present.
pub fn strip_0x_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Left-pad a 20-byte address into a canonical id.
pub fn canonize(address: H160) -> H256 {
    let mut id = [0u8; 32];
    id[12..].copy_from_slice(address.as_bytes());
    H256(id)
}

/// Left-pad an arbitrary native address (at most 32 bytes) into a canonical id.
pub fn canonize_bytes(bytes: &[u8]) -> BridgeResult<H256> {
    if bytes.len() > 32 {
        return Err(BridgeError::InvalidAddress(format!(
            "{} bytes does not fit a canonical id",
            bytes.len()
        )));
    }
    let mut id = [0u8; 32];
    id[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(H256(id))
}

/// Narrow a canonical id to a 20-byte address.
///
/// Fails if any of the 12 high-order bytes is non-zero.
pub fn evm_id(id: H256) -> BridgeResult<H160> {
    let bytes = id.as_bytes();
    if bytes[..12].iter().any(|b| *b != 0) {
        return Err(BridgeError::InvalidAddress(format!(
            "{:?} has non-zero high bytes",
            id
        )));
    }
    Ok(H160::from_slice(&bytes[12..]))
}

/// Parse a hex string (optionally `0x`-prefixed, at most 32 bytes) into a
/// canonical id.
pub fn parse_canonical_id(s: &str) -> BridgeResult<H256> {
    let stripped = strip_0x_prefix(s);
    // odd-length strings are padded with a leading nibble
    let padded;
    let even = if stripped.len() % 2 == 1 {
        padded = format!("0{}", stripped);
        padded.as_str()
    } else {
        stripped
    };
    let bytes = hex::decode(even)
        .map_err(|e| BridgeError::InvalidAddress(format!("{}: {}", s, e)))?;
    canonize_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_0x_prefix() {
        assert_eq!(strip_0x_prefix("0xbeef"), "beef");
        assert_eq!(strip_0x_prefix("beef"), "beef");
        assert_eq!(strip_0x_prefix("0"), "0");
    }

    #[test]
    fn test_canonize_pads_left() {
        let id = canonize(H160::repeat_byte(0xab));
        assert_eq!(&id.as_bytes()[..12], &[0u8; 12]);
        assert_eq!(&id.as_bytes()[12..], &[0xabu8; 20]);
    }

    #[test]
    fn test_evm_id_rejects_high_bytes() {
        let mut id = [0u8; 32];
        id[0] = 1;
        assert!(matches!(
            evm_id(H256(id)),
            Err(BridgeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_canonize_bytes_too_long() {
        assert!(canonize_bytes(&[1u8; 33]).is_err());
        assert_eq!(canonize_bytes(&[]).unwrap(), H256::zero());
    }

    #[test]
    fn test_parse_canonical_id() {
        assert_eq!(parse_canonical_id("0x01").unwrap(), H256::from_low_u64_be(1));
        assert_eq!(
            parse_canonical_id("0xBEEF").unwrap(),
            H256::from_low_u64_be(0xbeef)
        );
        assert_eq!(parse_canonical_id("abc").unwrap(), H256::from_low_u64_be(0xabc));
        assert!(parse_canonical_id("0xzz").is_err());
    }

    proptest! {
        #[test]
        fn prop_canonize_round_trips(bytes in proptest::array::uniform20(any::<u8>())) {
            let address = H160(bytes);
            prop_assert_eq!(evm_id(canonize(address)).unwrap(), address);
        }

        #[test]
        fn prop_short_native_addresses_are_lossless(bytes in proptest::collection::vec(any::<u8>(), 0..=32)) {
            let id = canonize_bytes(&bytes).unwrap();
            prop_assert_eq!(&id.as_bytes()[32 - bytes.len()..], bytes.as_slice());
        }
    }
}
