//! External wallet provider contracts.
//!
//! # Data Flow
//! ```text
//! ExtensionAdapter → ExtensionClient  (enable, enumerate accounts, sign raw bytes)
//! RelayAdapter     → RelayClient      (open/get session, request accounts/signature, push events)
//! InjectedAdapter  → InjectedProvider (request accounts, chain id, personal_sign, push events)
//! ```
//!
//! # Design Decisions
//! - Provider calls may hang, reject, or fail with an opaque `ProviderError`
//! - Adapters classify every `ProviderError` before returning it
//! - Push notifications arrive on a `tokio::sync::broadcast` channel

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::schema::ClientMetadata;

pub mod simulated;

/// Opaque failure reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    pub code: Option<String>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

/// Result type for raw provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Unsolicited notifications pushed by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Accounts and/or chain of the live session changed. Accounts are plain
    /// addresses; an empty list leaves the stored accounts unchanged.
    SessionUpdate {
        accounts: Vec<String>,
        chain: Option<String>,
    },
    SessionExpired,
    /// The wallet side ended the session.
    SessionDeleted,
    ChainChanged(String),
    /// Transport to the provider was lost.
    Disconnected,
}

/// Account as listed by a browser extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionAccount {
    pub address: String,
    pub name: Option<String>,
}

/// In-browser wallet extension.
#[async_trait]
pub trait ExtensionClient: Send + Sync {
    /// Provider identifier, e.g. `polkadot-js`.
    fn name(&self) -> &str;

    /// Whether the extension is injected into the page at all.
    fn is_installed(&self) -> bool;

    /// Ask the extension to authorize `app_name`.
    async fn enable(&self, app_name: &str) -> ProviderResult<()>;

    async fn accounts(&self) -> ProviderResult<Vec<ExtensionAccount>>;

    /// Sign `data` (0x-prefixed hex bytes) with `address`.
    async fn sign_raw(&self, address: &str, data: &str) -> ProviderResult<String>;
}

/// Parameters for opening a relay session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySessionRequest {
    pub project_id: String,
    pub relay_url: String,
    /// CAIP-2 chain identifier, e.g. `polkadot:91b171bb158e2d3848fa23a9f1c25182`.
    pub chain_id: String,
    pub methods: Vec<String>,
    pub events: Vec<String>,
    pub metadata: ClientMetadata,
}

/// Session as negotiated by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySession {
    pub topic: String,
    pub chain_id: String,
    /// CAIP-10 account identifiers (`namespace:reference:address`).
    pub accounts: Vec<String>,
    /// Seconds since the Unix epoch.
    pub expiry: Option<u64>,
}

/// Relay-mediated remote wallet connection.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn connect(&self, request: &RelaySessionRequest) -> ProviderResult<RelaySession>;

    /// Session already known to the client, if any.
    fn session(&self) -> Option<RelaySession>;

    async fn request_accounts(&self, topic: &str) -> ProviderResult<Vec<String>>;

    async fn request_signature(
        &self,
        topic: &str,
        chain_id: &str,
        address: &str,
        data: &str,
    ) -> ProviderResult<String>;

    async fn disconnect(&self, topic: &str) -> ProviderResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Injected provider speaking an EIP-1193 style request API.
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// `eth_requestAccounts`: prompts the user.
    async fn request_accounts(&self) -> ProviderResult<Vec<String>>;

    /// `eth_accounts`: accounts already authorized.
    async fn accounts(&self) -> ProviderResult<Vec<String>>;

    async fn chain_id(&self) -> ProviderResult<String>;

    async fn personal_sign(&self, data: &str, address: &str) -> ProviderResult<String>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
