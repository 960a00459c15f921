//! Connection state machine states.
//!
//! # State Transitions
//! ```text
//! Disabled → Enabling: enable()
//! Enabling → Enabled:  provider handshake succeeds before the deadline
//! Enabling → Disabled: rejection, provider error, deadline, or disconnect()
//! Enabled  → Disabled: disconnect(), session expiry/deletion, connection loss
//! ```

use std::fmt;

use serde::Serialize;

/// Externally visible connection state of one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disabled,
    Enabling,
    Enabled,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disabled => write!(f, "disabled"),
            ConnectionState::Enabling => write!(f, "enabling"),
            ConnectionState::Enabled => write!(f, "enabled"),
        }
    }
}
