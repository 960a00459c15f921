//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Provider call (enable / accounts / sign):
//!     → timeouts.rs (race against the operation deadline)
//!
//! Unsolicited provider disconnect:
//!     → reconnect.rs (check budget, count attempt)
//!     → backoff.rs (delay before the attempt)
//!     → connection state machine re-runs enable
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every provider call has a deadline
//! - Reconnection is bounded per adapter instance
//! - A spent budget is reported as an event, never as a returned error

pub mod backoff;
pub mod reconnect;
pub mod timeouts;

pub use reconnect::{ReconnectCounter, ReconnectPolicy};
pub use timeouts::with_deadline;
