//! Signature shape checks.
//!
//! Only the encoding is checked here. Verifying a signature against a
//! public key is left to the consumer of the signature.

use thiserror::Error;

/// Hex digit counts accepted after the `0x` prefix.
pub const ACCEPTED_SIGNATURE_HEX_LENGTHS: [usize; 2] = [128, 64];

/// Reasons a provider-returned signature is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureValidationError {
    #[error("signature is missing the 0x prefix")]
    MissingPrefix,

    #[error("signature contains non-hex characters")]
    NonHexCharacter,

    #[error("signature has {0} hex digits, expected 128 or 64")]
    InvalidLength(usize),
}

/// Check that `signature` is `0x` followed by exactly 128 or 64 hex digits.
pub fn validate_signature(signature: &str) -> Result<(), SignatureValidationError> {
    let digits = signature
        .strip_prefix("0x")
        .ok_or(SignatureValidationError::MissingPrefix)?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SignatureValidationError::NonHexCharacter);
    }

    if !ACCEPTED_SIGNATURE_HEX_LENGTHS.contains(&digits.len()) {
        return Err(SignatureValidationError::InvalidLength(digits.len()));
    }

    Ok(())
}
