//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the wallet
//! bridge. All types derive Serde traits for deserialization from config files.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::AdapterType;
use crate::resilience::ReconnectPolicy;
use crate::validation::{AddressFormat, DEFAULT_MAX_MESSAGE_LENGTH};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Adapters to try, ordered by `priority`.
    pub adapters: Vec<AdapterDescriptor>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Automatic reconnection settings.
    pub reconnect: ReconnectConfig,

    /// Message signing limits.
    pub signing: SigningConfig,

    /// Browser extension family settings.
    pub extension: ExtensionConfig,

    /// Relay (remote wallet) family settings.
    pub relay: RelayConfig,

    /// Injected EIP-1193 provider family settings.
    pub injected: InjectedConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One entry of the adapter priority list.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AdapterDescriptor {
    /// Unique adapter identifier for logging.
    pub id: String,

    /// Adapter family: `extension`, `relay` or `injected`.
    pub adapter_type: String,

    /// Lower values are tried first.
    pub priority: u32,

    /// Per-adapter override of `timeouts.operation_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Per-adapter override of `reconnect.max_attempts`.
    #[serde(default)]
    pub max_reconnect_attempts: Option<u32>,
}

impl AdapterDescriptor {
    pub fn new(id: impl Into<String>, adapter_type: AdapterType, priority: u32) -> Self {
        Self {
            id: id.into(),
            adapter_type: adapter_type.to_string(),
            priority,
            timeout_ms: None,
            max_reconnect_attempts: None,
        }
    }

    /// Parsed adapter family.
    pub fn kind(&self) -> Result<AdapterType, String> {
        AdapterType::from_str(&self.adapter_type)
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for each provider operation in milliseconds.
    pub operation_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            operation_ms: 10_000,
        }
    }
}

/// Reconnection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Maximum automatic reconnection attempts after a connection loss.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds (0 = immediate).
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Time a reconnected session must stay up before the attempt counter resets.
    pub stability_window_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 2_000,
            stability_window_ms: 5_000,
        }
    }
}

/// Message signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Maximum message length in characters.
    pub max_message_length: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

/// Browser extension settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Application name shown in the extension's authorization prompt.
    pub app_name: String,

    /// Extension identifiers in fallback order.
    pub providers: Vec<String>,

    /// Chain the extension accounts belong to.
    pub chain_identifier: String,

    pub address_format: AddressFormat,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            app_name: "wallet-bridge".to_string(),
            providers: vec![
                "polkadot-js".to_string(),
                "talisman".to_string(),
                "subwallet-js".to_string(),
            ],
            chain_identifier: "polkadot".to_string(),
            address_format: AddressFormat::default(),
        }
    }
}

/// Client metadata presented to the remote wallet.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for ClientMetadata {
    fn default() -> Self {
        Self {
            name: "wallet-bridge".to_string(),
            description: "Wallet connection bridge".to_string(),
            url: "https://localhost".to_string(),
            icons: Vec::new(),
        }
    }
}

/// Relay session settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay project identifier.
    pub project_id: String,

    /// Relay endpoint.
    pub relay_url: String,

    /// CAIP-2 chain identifier requested for the session.
    pub chain_id: String,

    /// RPC methods requested for the session.
    pub methods: Vec<String>,

    /// Provider events requested for the session.
    pub events: Vec<String>,

    pub metadata: ClientMetadata,

    pub address_format: AddressFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            relay_url: "wss://relay.walletconnect.com".to_string(),
            chain_id: "polkadot:91b171bb158e2d3848fa23a9f1c25182".to_string(),
            methods: vec![
                "polkadot_signTransaction".to_string(),
                "polkadot_signMessage".to_string(),
            ],
            events: vec!["chainChanged".to_string(), "accountsChanged".to_string()],
            metadata: ClientMetadata::default(),
            address_format: AddressFormat::Ss58 { prefix: 0 },
        }
    }
}

/// Injected provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InjectedConfig {
    /// Injected provider names in fallback order.
    pub providers: Vec<String>,

    /// Required chain id (hex, e.g. `0x1`); any chain when unset.
    pub chain_id: Option<String>,

    pub address_format: AddressFormat,
}

impl Default for InjectedConfig {
    fn default() -> Self {
        Self {
            providers: vec!["metamask".to_string(), "talisman-eth".to_string()],
            chain_id: None,
            address_format: AddressFormat::Evm,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Effective settings for one adapter instance after per-adapter overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    pub timeout: Duration,
    pub reconnect: ReconnectPolicy,
    pub max_message_length: usize,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::resolve(None, &WalletConfig::default())
    }
}

impl AdapterSettings {
    /// Apply a descriptor's overrides on top of the global defaults.
    pub fn resolve(descriptor: Option<&AdapterDescriptor>, config: &WalletConfig) -> Self {
        let timeout_ms = descriptor
            .and_then(|d| d.timeout_ms)
            .unwrap_or(config.timeouts.operation_ms);
        let max_attempts = descriptor
            .and_then(|d| d.max_reconnect_attempts)
            .unwrap_or(config.reconnect.max_attempts);

        Self {
            timeout: Duration::from_millis(timeout_ms),
            reconnect: ReconnectPolicy {
                max_attempts,
                base_delay: Duration::from_millis(config.reconnect.base_delay_ms),
                max_delay: Duration::from_millis(config.reconnect.max_delay_ms),
                stability_window: Duration::from_millis(config.reconnect.stability_window_ms),
            },
            max_message_length: config.signing.max_message_length,
        }
    }
}
