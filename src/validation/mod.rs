//! Input validation subsystem.
//!
//! # Data Flow
//! ```text
//! Caller message   → message.rs   (trim, control characters, length)
//! Provider account → address.rs   (base-58 / hex format, network checksum)
//! Provider output  → signature.rs (0x-prefixed hex, 64 or 128 digits)
//! ```
//!
//! # Design Decisions
//! - Pure functions, no provider access, no logging
//! - Each check has its own error type; adapters convert them into
//!   `WalletError` at the boundary

pub mod address;
pub mod message;
pub mod signature;

pub use address::{validate_account_address, AddressFormat, AddressValidationError};
pub use message::{sanitize_message, MessageValidationError, DEFAULT_MAX_MESSAGE_LENGTH};
pub use signature::{validate_signature, SignatureValidationError};
