//! Connection lifecycle shared by every adapter family.
//!
//! # Data Flow
//! ```text
//! caller enable()
//!     → machine.rs (join or lead attempt, deadline, commit)
//!     → Connector::handshake (family specific)
//!     → session.rs (Session stored on success)
//!     → events.rs (connected emitted to handlers)
//!
//! provider push events
//!     → machine.rs monitor task
//!     → session updates, expiry, or bounded reconnection
//! ```

pub mod events;
pub mod machine;
pub mod session;
pub mod state;

pub use events::{EventHandler, EventRegistry, WalletEvent, WalletEventKind};
pub use machine::{ActiveSession, Connection, Connector, Handshake};
pub use session::{Session, WalletAccount};
pub use state::ConnectionState;
