//! Message sanitization before signing.

use thiserror::Error;

/// Default upper bound on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 256;

/// Reasons a message is refused for signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageValidationError {
    /// Nothing left after trimming.
    #[error("message is empty")]
    Empty,

    /// A control character was found in the original input.
    #[error("message contains control character U+{code_point:04X} at position {position}")]
    ControlCharacter { position: usize, code_point: u32 },

    /// The original input is longer than allowed.
    #[error("message length {length} exceeds maximum of {max_length}")]
    TooLong { length: usize, max_length: usize },
}

/// Returns true for the control characters a signable message may not contain.
///
/// Tab, line feed and carriage return are allowed.
fn is_forbidden_control(c: char) -> bool {
    matches!(
        c as u32,
        0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x7F..=0x9F
    )
}

/// Trim a message and check it is safe to hand to a wallet for signing.
///
/// Length and control characters are checked against the untrimmed input.
pub fn sanitize_message(raw: &str, max_length: usize) -> Result<String, MessageValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MessageValidationError::Empty);
    }

    if let Some((position, c)) = raw.chars().enumerate().find(|(_, c)| is_forbidden_control(*c)) {
        return Err(MessageValidationError::ControlCharacter {
            position,
            code_point: c as u32,
        });
    }

    let length = raw.chars().count();
    if length > max_length {
        return Err(MessageValidationError::TooLong { length, max_length });
    }

    Ok(trimmed.to_string())
}
