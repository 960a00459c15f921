//! Injected EIP-1193 provider adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::adapters::{
    address_is_valid, checked_accounts, finish_signing, prepare_signing, AdapterType,
    WalletAdapter,
};
use crate::clients::{InjectedProvider, ProviderEvent};
use crate::config::{AdapterSettings, InjectedConfig};
use crate::connection::{
    Connection, ConnectionState, Connector, EventHandler, Handshake, Session, WalletAccount,
    WalletEventKind,
};
use crate::error::{classify, WalletError, WalletResult};
use crate::validation::AddressFormat;

/// Handshake logic for injected providers.
pub struct InjectedConnector {
    providers: Vec<Arc<dyn InjectedProvider>>,
    required_chain: Option<String>,
}

impl InjectedConnector {
    /// Keep the providers named in `config.providers`, in that order.
    pub fn new(providers: Vec<Arc<dyn InjectedProvider>>, config: &InjectedConfig) -> Self {
        let ordered = config
            .providers
            .iter()
            .filter_map(|name| providers.iter().find(|p| p.name() == name).cloned())
            .collect();

        Self {
            providers: ordered,
            required_chain: config.chain_id.clone(),
        }
    }

    fn provider(&self, name: &str) -> WalletResult<&Arc<dyn InjectedProvider>> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| WalletError::connection(format!("injected provider {} is gone", name)))
    }

    async fn try_provider(&self, provider: &dyn InjectedProvider) -> WalletResult<Handshake> {
        let accounts = provider
            .request_accounts()
            .await
            .map_err(|e| classify(e, "enable"))?;
        let chain = provider
            .chain_id()
            .await
            .map_err(|e| classify(e, "enable"))?;

        if let Some(required) = &self.required_chain {
            if !chain.eq_ignore_ascii_case(required) {
                return Err(WalletError::connection_during(
                    "enable",
                    format!("{} is on chain {}, expected {}", provider.name(), chain, required),
                ));
            }
        }

        Ok(Handshake {
            provider: provider.name().to_string(),
            session: Session::new(Uuid::new_v4().to_string(), chain, accounts),
        })
    }
}

#[async_trait]
impl Connector for InjectedConnector {
    async fn handshake(&self) -> WalletResult<Handshake> {
        let mut last_error = None;

        for provider in self.providers.iter().filter(|p| p.is_available()) {
            match self.try_provider(provider.as_ref()).await {
                Ok(handshake) => return Ok(handshake),
                Err(e @ WalletError::UserRejected(_)) => return Err(e),
                Err(e) => {
                    tracing::debug!(provider = provider.name(), error = %e, "Injected provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(WalletError::WalletNotFound))
    }

    // EIP-1193 has no revocation call.
    async fn release(&self, _session: &Session) {}

    fn subscribe(&self, provider: &str) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.provider(provider).ok().map(|p| p.subscribe())
    }
}

/// Adapter over injected EVM-style providers.
pub struct InjectedAdapter {
    conn: Connection<InjectedConnector>,
    address_format: AddressFormat,
}

impl InjectedAdapter {
    pub fn new(
        id: impl Into<String>,
        providers: Vec<Arc<dyn InjectedProvider>>,
        config: &InjectedConfig,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            conn: Connection::new(id, InjectedConnector::new(providers, config), settings),
            address_format: config.address_format,
        }
    }

    pub fn connection(&self) -> &Connection<InjectedConnector> {
        &self.conn
    }
}

#[async_trait]
impl WalletAdapter for InjectedAdapter {
    fn id(&self) -> &str {
        self.conn.id()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Injected
    }

    async fn enable(&self) -> WalletResult<()> {
        self.conn.enable().await
    }

    async fn get_accounts(&self) -> WalletResult<Vec<WalletAccount>> {
        let active = self.conn.require_enabled()?;
        let provider = self.conn.connector().provider(&active.provider)?;
        let listed = self.conn.call("getAccounts", provider.accounts()).await?;

        let accounts = listed
            .into_iter()
            .map(|address| WalletAccount {
                address,
                display_name: None,
                source_provider: active.provider.clone(),
            })
            .collect();
        checked_accounts(accounts, self.address_format)
    }

    async fn sign_message(&self, message: &str) -> WalletResult<String> {
        let request = prepare_signing(&self.conn, message)?;
        let provider = self.conn.connector().provider(&request.provider)?;
        let signed = self
            .conn
            .call(
                "signMessage",
                provider.personal_sign(&request.payload, &request.address),
            )
            .await;
        finish_signing(&self.conn, signed)
    }

    fn get_provider(&self) -> Option<String> {
        self.conn.provider()
    }

    async fn disconnect(&self) {
        self.conn.disconnect().await
    }

    fn validate_address(&self, address: &str) -> WalletResult<bool> {
        Ok(address_is_valid(address, self.address_format))
    }

    fn on(&self, kind: WalletEventKind, handler: EventHandler) {
        self.conn.events().on(kind, handler)
    }

    fn off(&self, kind: WalletEventKind, handler: &EventHandler) -> bool {
        self.conn.events().off(kind, handler)
    }

    fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    fn session(&self) -> Option<Session> {
        self.conn.session()
    }

    fn select_account(&self, address: Option<String>) -> WalletResult<()> {
        self.conn.select_account(address)
    }
}
