//! Account address validation.
//!
//! # Formats
//! - SS58: base-58 encoding of `prefix ++ account_id ++ checksum`, where the
//!   checksum is the first two bytes of `blake2b-512("SS58PRE" ++ prefix ++ account_id)`
//! - EVM: `0x` followed by 40 hex digits, EIP-55 checksum when mixed case

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const SS58_HASH_PREFIX: &[u8] = b"SS58PRE";
const SS58_CHECKSUM_LEN: usize = 2;
const ACCOUNT_ID_LEN: usize = 32;
const SS58_MIN_CHARS: usize = 46;
const SS58_MAX_CHARS: usize = 50;

/// Highest network identifier representable in the two-byte SS58 prefix.
pub const MAX_SS58_FORMAT: u16 = 16_383;

/// Network address format an adapter validates its accounts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AddressFormat {
    /// SS58 with the given network identifier (0 = Polkadot, 2 = Kusama, 42 = generic).
    Ss58 { prefix: u16 },
    /// 20-byte hex address.
    Evm,
}

impl Default for AddressFormat {
    fn default() -> Self {
        Self::Ss58 { prefix: 42 }
    }
}

impl AddressFormat {
    /// Whether the SS58 identifier fits the two-byte prefix encoding.
    pub fn is_encodable(&self) -> bool {
        match self {
            AddressFormat::Ss58 { prefix } => *prefix <= MAX_SS58_FORMAT,
            AddressFormat::Evm => true,
        }
    }
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFormat::Ss58 { prefix } => write!(f, "ss58:{}", prefix),
            AddressFormat::Evm => write!(f, "evm"),
        }
    }
}

impl FromStr for AddressFormat {
    type Err = String;

    /// Parses `evm`, `ss58:<prefix>` or a bare numeric SS58 prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("evm") {
            return Ok(Self::Evm);
        }
        let digits = s
            .strip_prefix("ss58:")
            .or_else(|| s.strip_prefix("SS58:"))
            .unwrap_or(s);
        let prefix: u16 = digits
            .parse()
            .map_err(|_| format!("unknown address format '{}'", s))?;
        let format = Self::Ss58 { prefix };
        if !format.is_encodable() {
            return Err(format!("ss58 prefix {} exceeds {}", prefix, MAX_SS58_FORMAT));
        }
        Ok(format)
    }
}

/// Reasons an account address is refused.
///
/// `Malformed` and `ChecksumMismatch` are reported separately for
/// diagnostics; callers treat them as the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressValidationError {
    #[error("address is empty")]
    Empty,

    #[error("malformed address: {0}")]
    Malformed(String),

    #[error("address checksum mismatch")]
    ChecksumMismatch,

    #[error("address is for network format {actual}, expected {expected}")]
    NetworkMismatch { expected: u16, actual: u16 },
}

/// Validate `address` against the given network format.
pub fn validate_account_address(
    address: &str,
    format: AddressFormat,
) -> Result<(), AddressValidationError> {
    if address.trim().is_empty() {
        return Err(AddressValidationError::Empty);
    }

    match format {
        AddressFormat::Ss58 { prefix } => validate_ss58(address, prefix),
        AddressFormat::Evm => validate_evm(address),
    }
}

fn validate_ss58(address: &str, expected: u16) -> Result<(), AddressValidationError> {
    let len = address.chars().count();
    if !(SS58_MIN_CHARS..=SS58_MAX_CHARS).contains(&len) {
        return Err(AddressValidationError::Malformed(format!(
            "length {} outside {}..={}",
            len, SS58_MIN_CHARS, SS58_MAX_CHARS
        )));
    }
    if let Some(bad) = address.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(AddressValidationError::Malformed(format!(
            "character '{}' is not base-58",
            bad
        )));
    }

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| AddressValidationError::Malformed(e.to_string()))?;

    let (prefix_len, actual) = decode_ss58_prefix(&bytes)?;

    if bytes.len() != prefix_len + ACCOUNT_ID_LEN + SS58_CHECKSUM_LEN {
        return Err(AddressValidationError::Malformed(format!(
            "decoded length {} does not hold a 32-byte account id",
            bytes.len()
        )));
    }

    let (payload, checksum) = bytes.split_at(bytes.len() - SS58_CHECKSUM_LEN);
    let hash = ss58_hash(payload);
    if hash.get(..SS58_CHECKSUM_LEN) != Some(checksum) {
        return Err(AddressValidationError::ChecksumMismatch);
    }

    if actual != expected {
        return Err(AddressValidationError::NetworkMismatch { expected, actual });
    }

    Ok(())
}

/// Returns `(prefix byte length, network identifier)`.
fn decode_ss58_prefix(bytes: &[u8]) -> Result<(usize, u16), AddressValidationError> {
    match bytes {
        [first @ 0..=63, ..] => Ok((1, u16::from(*first))),
        [first @ 64..=127, second, ..] => {
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            Ok((2, u16::from(lower) | (u16::from(upper) << 8)))
        }
        [_, ..] => Err(AddressValidationError::Malformed(
            "reserved ss58 prefix".to_string(),
        )),
        [] => Err(AddressValidationError::Malformed("empty payload".to_string())),
    }
}

fn ss58_hash(payload: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_HASH_PREFIX);
    hasher.update(payload);
    hasher.finalize().to_vec()
}

fn validate_evm(address: &str) -> Result<(), AddressValidationError> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| AddressValidationError::Malformed("missing 0x prefix".to_string()))?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressValidationError::Malformed(
            "expected 40 hex digits".to_string(),
        ));
    }

    let parsed = Address::from_str(address)
        .map_err(|e| AddressValidationError::Malformed(e.to_string()))?;

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && parsed.to_checksum(None) != address {
        return Err(AddressValidationError::ChecksumMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
    const GENERIC: AddressFormat = AddressFormat::Ss58 { prefix: 42 };
    // Alice's account id under two-byte network prefixes.
    const ALICE_2007: &str = "tsYiidXGXmwsjaTrJpA6Z9YuqRipRjVqMrkikExNnpsVoa9cL";
    const ALICE_16383: &str = "yNa8JpqfFB3q8A29rCwSgxvdU94ufJw2yKKxDgznS5m1PoFvn";

    #[test]
    fn test_valid_ss58_addresses() {
        assert!(validate_account_address(ALICE, GENERIC).is_ok());
        assert!(validate_account_address(BOB, GENERIC).is_ok());
    }

    #[test]
    fn test_two_byte_network_prefix() {
        assert!(validate_account_address(ALICE_2007, AddressFormat::Ss58 { prefix: 2007 }).is_ok());
        assert!(validate_account_address(ALICE_16383, AddressFormat::Ss58 { prefix: MAX_SS58_FORMAT }).is_ok());

        assert_eq!(
            validate_account_address(ALICE_2007, AddressFormat::Ss58 { prefix: 1284 }),
            Err(AddressValidationError::NetworkMismatch { expected: 1284, actual: 2007 })
        );
        assert_eq!(
            validate_account_address(ALICE, AddressFormat::Ss58 { prefix: 2007 }),
            Err(AddressValidationError::NetworkMismatch { expected: 2007, actual: 42 })
        );
    }

    #[test]
    fn test_encodable_formats() {
        assert!(AddressFormat::Evm.is_encodable());
        assert!(AddressFormat::Ss58 { prefix: MAX_SS58_FORMAT }.is_encodable());
        assert!(!AddressFormat::Ss58 { prefix: MAX_SS58_FORMAT + 1 }.is_encodable());
    }

    #[test]
    fn test_empty_address() {
        assert_eq!(validate_account_address("", GENERIC), Err(AddressValidationError::Empty));
        assert_eq!(validate_account_address("   ", AddressFormat::Evm), Err(AddressValidationError::Empty));
    }

    #[test]
    fn test_wrong_network_prefix() {
        let err = validate_account_address(ALICE, AddressFormat::Ss58 { prefix: 0 }).unwrap_err();
        assert_eq!(err, AddressValidationError::NetworkMismatch { expected: 0, actual: 42 });
    }

    #[test]
    fn test_corrupted_checksum_is_rejected() {
        let mut corrupted = ALICE.to_string();
        corrupted.pop();
        corrupted.push('Z');
        assert!(validate_account_address(&corrupted, GENERIC).is_err());
    }

    #[test]
    fn test_non_base58_character() {
        // '0' is not in the base-58 alphabet.
        let bad = format!("0{}", &ALICE[1..]);
        assert!(matches!(
            validate_account_address(&bad, GENERIC),
            Err(AddressValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            validate_account_address("5Grwva", GENERIC),
            Err(AddressValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_evm_addresses() {
        assert!(validate_account_address(
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            AddressFormat::Evm
        )
        .is_ok());
        assert!(validate_account_address(
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            AddressFormat::Evm
        )
        .is_ok());
    }

    #[test]
    fn test_evm_bad_checksum_and_shape() {
        assert_eq!(
            validate_account_address("0xF39fd6e51aad88F6F4ce6aB8827279cffFb92266", AddressFormat::Evm),
            Err(AddressValidationError::ChecksumMismatch)
        );
        assert!(matches!(
            validate_account_address("f39fd6e51aad88f6f4ce6ab8827279cfffb92266", AddressFormat::Evm),
            Err(AddressValidationError::Malformed(_))
        ));
        assert!(matches!(
            validate_account_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb9226", AddressFormat::Evm),
            Err(AddressValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("evm".parse::<AddressFormat>().unwrap(), AddressFormat::Evm);
        assert_eq!("ss58:2".parse::<AddressFormat>().unwrap(), AddressFormat::Ss58 { prefix: 2 });
        assert_eq!("0".parse::<AddressFormat>().unwrap(), AddressFormat::Ss58 { prefix: 0 });
        assert!("ss58:20000".parse::<AddressFormat>().is_err());
        assert!("bitcoin".parse::<AddressFormat>().is_err());
        assert_eq!(AddressFormat::Ss58 { prefix: 42 }.to_string(), "ss58:42");
    }
}
