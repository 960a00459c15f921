//! Wallet error taxonomy.
//!
//! Every adapter operation ends in `Ok` or exactly one [`WalletError`].
//! Raw provider failures are converted by [`classify`] before they leave an
//! adapter.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::clients::ProviderError;
use crate::validation::{AddressValidationError, MessageValidationError, SignatureValidationError};

/// EIP-1193 "user rejected request" error code.
const USER_REJECTED_PROVIDER_CODE: &str = "4001";

const USER_REJECTED_PATTERNS: [&str; 3] = ["reject", "denied", "cancel"];
const TIMEOUT_PATTERNS: [&str; 2] = ["timeout", "timed out"];

/// Diagnostic metadata attached to provider-facing failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ErrorContext {
    /// Adapter operation that failed (e.g. `enable`, `signMessage`).
    pub operation: String,
    /// Provider-supplied error code, when there was one.
    pub provider_code: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: Option<String>) -> Self {
        self.provider_code = code;
        self
    }
}

/// Stable, machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    WalletNotFound,
    UserRejected,
    OperationTimeout,
    InvalidSignature,
    ConnectionFailed,
    InvalidMessage,
    InvalidAddress,
    InvalidConfig,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::WalletNotFound => "WALLET_NOT_FOUND",
            ErrorCode::UserRejected => "USER_REJECTED",
            ErrorCode::OperationTimeout => "OPERATION_TIMEOUT",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::InvalidAddress => "INVALID_ADDRESS",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by wallet adapters and the adapter selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No usable wallet provider (absent, not enabled, or every candidate failed).
    #[error("No wallet provider available")]
    WalletNotFound,

    /// The user declined the request in the wallet UI.
    #[error("User rejected {}", .0.operation)]
    UserRejected(ErrorContext),

    /// The provider did not answer before the deadline.
    #[error("Operation {} timed out", .0.operation)]
    Timeout(ErrorContext),

    /// The provider returned a signature of the wrong shape.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Any other provider or transport failure.
    #[error("Connection failed: {detail}")]
    ConnectionFailed {
        detail: String,
        context: Option<ErrorContext>,
    },

    #[error("Invalid message: {0}")]
    MessageInvalid(String),

    #[error("Invalid address: {0}")]
    AddressInvalid(String),

    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl WalletError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WalletError::WalletNotFound => ErrorCode::WalletNotFound,
            WalletError::UserRejected(_) => ErrorCode::UserRejected,
            WalletError::Timeout(_) => ErrorCode::OperationTimeout,
            WalletError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            WalletError::ConnectionFailed { .. } => ErrorCode::ConnectionFailed,
            WalletError::MessageInvalid(_) => ErrorCode::InvalidMessage,
            WalletError::AddressInvalid(_) => ErrorCode::InvalidAddress,
            WalletError::ConfigurationInvalid(_) => ErrorCode::InvalidConfig,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            WalletError::UserRejected(ctx) | WalletError::Timeout(ctx) => Some(ctx),
            WalletError::ConnectionFailed { context, .. } => context.as_ref(),
            _ => None,
        }
    }

    pub fn timeout(operation: &str) -> Self {
        WalletError::Timeout(ErrorContext::new(operation))
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        WalletError::ConnectionFailed {
            detail: detail.into(),
            context: None,
        }
    }

    /// Connection failure tagged with the operation that produced it.
    pub fn connection_during(operation: &str, detail: impl Into<String>) -> Self {
        WalletError::ConnectionFailed {
            detail: detail.into(),
            context: Some(ErrorContext::new(operation)),
        }
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Map a raw provider failure onto the taxonomy.
pub fn classify(err: ProviderError, operation: &str) -> WalletError {
    let lowered = err.message.to_lowercase();
    let context = ErrorContext::new(operation).with_provider_code(err.code.clone());

    if err.code.as_deref() == Some(USER_REJECTED_PROVIDER_CODE)
        || USER_REJECTED_PATTERNS.iter().any(|p| lowered.contains(p))
    {
        return WalletError::UserRejected(context);
    }

    if TIMEOUT_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return WalletError::Timeout(context);
    }

    WalletError::ConnectionFailed {
        detail: err.message,
        context: Some(context),
    }
}

impl From<MessageValidationError> for WalletError {
    fn from(err: MessageValidationError) -> Self {
        WalletError::MessageInvalid(err.to_string())
    }
}

impl From<AddressValidationError> for WalletError {
    fn from(err: AddressValidationError) -> Self {
        WalletError::AddressInvalid(err.to_string())
    }
}

impl From<SignatureValidationError> for WalletError {
    fn from(err: SignatureValidationError) -> Self {
        WalletError::InvalidSignature(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let cases = [
            (WalletError::WalletNotFound, "WALLET_NOT_FOUND"),
            (WalletError::UserRejected(ErrorContext::new("enable")), "USER_REJECTED"),
            (WalletError::timeout("enable"), "OPERATION_TIMEOUT"),
            (WalletError::InvalidSignature("x".into()), "INVALID_SIGNATURE"),
            (WalletError::connection("x"), "CONNECTION_FAILED"),
            (WalletError::MessageInvalid("x".into()), "INVALID_MESSAGE"),
            (WalletError::AddressInvalid("x".into()), "INVALID_ADDRESS"),
            (WalletError::ConfigurationInvalid("x".into()), "INVALID_CONFIG"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code().as_str(), code);
            assert_eq!(serde_json::to_value(err.code()).unwrap(), code);
        }
    }

    #[test]
    fn test_classify_user_rejection() {
        let err = classify(ProviderError::new("Cancelled"), "signMessage");
        assert!(matches!(err, WalletError::UserRejected(ref ctx) if ctx.operation == "signMessage"));

        let err = classify(ProviderError::new("User Rejected Request"), "enable");
        assert_eq!(err.code(), ErrorCode::UserRejected);

        let err = classify(ProviderError::with_code("whatever", "4001"), "enable");
        assert_eq!(err.code(), ErrorCode::UserRejected);
        assert_eq!(err.context().unwrap().provider_code.as_deref(), Some("4001"));
    }

    #[test]
    fn test_classify_timeout() {
        let err = classify(ProviderError::new("request timed out"), "getAccounts");
        assert_eq!(err.to_string(), "Operation getAccounts timed out");
    }

    #[test]
    fn test_classify_preserves_detail() {
        let err = classify(ProviderError::new("socket closed"), "enable");
        match err {
            WalletError::ConnectionFailed { detail, context } => {
                assert_eq!(detail, "socket closed");
                assert_eq!(context.unwrap().operation, "enable");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validation_conversions() {
        let err: WalletError = MessageValidationError::Empty.into();
        assert_eq!(err.code(), ErrorCode::InvalidMessage);

        let err: WalletError = AddressValidationError::ChecksumMismatch.into();
        assert_eq!(err.code(), ErrorCode::InvalidAddress);

        let err: WalletError = SignatureValidationError::MissingPrefix.into();
        assert_eq!(err.code(), ErrorCode::InvalidSignature);
    }
}
