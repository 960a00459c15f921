//! Adapter selection.
//!
//! # Data Flow
//! ```text
//! WalletConfig.adapters
//!     → connect.rs (validate, sort by priority)
//!     → registry.rs (AdapterType → constructor)
//!     → WalletAdapter::enable per candidate
//!     → first enabled adapter
//! ```

pub mod connect;
pub mod registry;

pub use connect::AdapterSelector;
pub use registry::{AdapterFactory, AdapterRegistry, ProviderClients};
