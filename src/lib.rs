//! Wallet connection bridge.
//!
//! One adapter contract over browser extensions, relay-mediated remote
//! wallets, and injected EIP-1193 providers.

pub mod adapters;
pub mod clients;
pub mod config;
pub mod connection;
pub mod error;
pub mod observability;
pub mod resilience;
pub mod selector;
pub mod validation;

pub use adapters::{AdapterType, WalletAdapter};
pub use config::schema::WalletConfig;
pub use connection::{ConnectionState, Session, WalletAccount, WalletEvent, WalletEventKind};
pub use error::{ErrorCode, WalletError, WalletResult};
pub use selector::{AdapterRegistry, AdapterSelector, ProviderClients};
