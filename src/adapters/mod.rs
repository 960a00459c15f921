//! Wallet adapters: one uniform contract over incompatible provider families.
//!
//! # Data Flow
//! ```text
//! application
//!     → WalletAdapter (enable, get_accounts, sign_message, disconnect, ...)
//!     → Connection<C> (state machine, deadline, reconnection)
//!     → family Connector (extension, relay, injected)
//!     → external client (clients::ExtensionClient / RelayClient / InjectedProvider)
//! ```
//!
//! # Design Decisions
//! - Every provider failure is classified before it leaves an adapter
//! - Account lists are validated as a whole: one bad address fails the call
//! - Signatures are shape-checked before they are returned

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::connection::{
    Connection, ConnectionState, Connector, EventHandler, Session, WalletAccount, WalletEventKind,
};
use crate::error::{WalletError, WalletResult};
use crate::observability::metrics;
use crate::validation::{sanitize_message, validate_account_address, validate_signature, AddressFormat};

pub mod extension;
pub mod injected;
pub mod relay;

pub use extension::{ExtensionAdapter, ExtensionConnector};
pub use injected::{InjectedAdapter, InjectedConnector};
pub use relay::{RelayAdapter, RelayConnector, RELAY_PROVIDER_ID};

/// Closed set of adapter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    Extension,
    Relay,
    Injected,
}

impl AdapterType {
    pub const ALL: [AdapterType; 3] = [
        AdapterType::Extension,
        AdapterType::Relay,
        AdapterType::Injected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterType::Extension => "extension",
            AdapterType::Relay => "relay",
            AdapterType::Injected => "injected",
        }
    }
}

impl fmt::Display for AdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdapterType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown adapter type '{}'", s))
    }
}

/// Uniform wallet contract implemented by every provider family.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Identifier from the adapter descriptor.
    fn id(&self) -> &str;

    fn adapter_type(&self) -> AdapterType;

    /// Connect to a provider. Idempotent while enabled.
    async fn enable(&self) -> WalletResult<()>;

    async fn get_accounts(&self) -> WalletResult<Vec<WalletAccount>>;

    /// Sanitize, sign and shape-check. Returns the provider's signature verbatim.
    async fn sign_message(&self, message: &str) -> WalletResult<String>;

    /// Identifier of the activated provider, only while enabled.
    fn get_provider(&self) -> Option<String>;

    /// Best-effort teardown. Never fails.
    async fn disconnect(&self);

    /// Whether `address` is valid for this adapter's network format.
    fn validate_address(&self, address: &str) -> WalletResult<bool>;

    fn on(&self, kind: WalletEventKind, handler: EventHandler);

    /// Returns false if the handler was not registered.
    fn off(&self, kind: WalletEventKind, handler: &EventHandler) -> bool;

    fn state(&self) -> ConnectionState;

    fn session(&self) -> Option<Session>;

    /// Designate the signing account. `None` restores the default.
    fn select_account(&self, address: Option<String>) -> WalletResult<()>;
}

/// Payload sent to providers: `0x` hex of the UTF-8 bytes.
pub fn encode_message(message: &str) -> String {
    format!("0x{}", hex::encode(message.as_bytes()))
}

/// Split a CAIP-10 account id into its CAIP-2 chain and address.
pub fn parse_caip10(account: &str) -> Option<(String, String)> {
    let mut parts = account.splitn(3, ':');
    let namespace = parts.next().filter(|p| !p.is_empty())?;
    let reference = parts.next().filter(|p| !p.is_empty())?;
    let address = parts.next().filter(|p| !p.is_empty())?;
    Some((format!("{}:{}", namespace, reference), address.to_string()))
}

pub(crate) fn address_is_valid(address: &str, format: AddressFormat) -> bool {
    validate_account_address(address, format).is_ok()
}

/// Reject empty lists and validate every address, first failure wins.
pub(crate) fn checked_accounts(
    accounts: Vec<WalletAccount>,
    format: AddressFormat,
) -> WalletResult<Vec<WalletAccount>> {
    if accounts.is_empty() {
        return Err(WalletError::connection_during(
            "getAccounts",
            "provider returned no accounts",
        ));
    }
    for account in &accounts {
        validate_account_address(&account.address, format).map_err(|e| {
            WalletError::AddressInvalid(format!("{}: {}", account.address, e))
        })?;
    }
    Ok(accounts)
}

/// A signing call ready to be sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignRequest {
    pub provider: String,
    pub session: Session,
    pub address: String,
    pub payload: String,
}

/// Check state, sanitize, and pick the signing account.
pub(crate) fn prepare_signing<C: Connector>(
    conn: &Connection<C>,
    message: &str,
) -> WalletResult<SignRequest> {
    let active = conn.require_enabled()?;
    let clean = sanitize_message(message, conn.settings().max_message_length)?;

    let address = conn
        .signing_account()
        .filter(|designated| active.session.contains_account(designated))
        .or_else(|| active.session.account_addresses().first().cloned())
        .ok_or_else(|| {
            WalletError::connection_during("signMessage", "no account available for signing")
        })?;

    Ok(SignRequest {
        provider: active.provider,
        session: active.session,
        address,
        payload: encode_message(&clean),
    })
}

/// Shape-check the provider's answer and record the outcome.
pub(crate) fn finish_signing<C: Connector>(
    conn: &Connection<C>,
    signed: WalletResult<String>,
) -> WalletResult<String> {
    let result = signed.and_then(|signature| {
        validate_signature(&signature)?;
        Ok(signature)
    });

    metrics::record_sign(conn.id(), &result);
    match &result {
        Ok(_) => tracing::debug!(adapter = %conn.id(), "Message signed"),
        Err(e) => tracing::warn!(adapter = %conn.id(), code = %e.code(), error = %e, "Signing failed"),
    }
    result
}
