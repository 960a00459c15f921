//! Browser extension adapter.
//!
//! Tries the configured extensions in declared order under one deadline.
//! A declined prompt stops the search; any other failure moves on to the
//! next installed extension.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::adapters::{
    address_is_valid, checked_accounts, finish_signing, prepare_signing, AdapterType,
    WalletAdapter,
};
use crate::clients::{ExtensionClient, ProviderEvent};
use crate::config::{AdapterSettings, ExtensionConfig};
use crate::connection::{
    Connection, ConnectionState, Connector, EventHandler, Handshake, Session, WalletAccount,
    WalletEventKind,
};
use crate::error::{classify, WalletError, WalletResult};
use crate::validation::AddressFormat;

/// Handshake logic for the extension family.
pub struct ExtensionConnector {
    clients: Vec<Arc<dyn ExtensionClient>>,
    app_name: String,
    chain_identifier: String,
}

impl ExtensionConnector {
    /// Keep the clients named in `config.providers`, in that order.
    pub fn new(clients: Vec<Arc<dyn ExtensionClient>>, config: &ExtensionConfig) -> Self {
        let ordered = config
            .providers
            .iter()
            .filter_map(|name| clients.iter().find(|c| c.name() == name).cloned())
            .collect();

        Self {
            clients: ordered,
            app_name: config.app_name.clone(),
            chain_identifier: config.chain_identifier.clone(),
        }
    }

    pub fn any_installed(&self) -> bool {
        self.clients.iter().any(|c| c.is_installed())
    }

    fn client(&self, name: &str) -> WalletResult<&Arc<dyn ExtensionClient>> {
        self.clients
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| WalletError::connection(format!("extension {} is gone", name)))
    }

    async fn try_client(&self, client: &dyn ExtensionClient) -> WalletResult<Handshake> {
        client
            .enable(&self.app_name)
            .await
            .map_err(|e| classify(e, "enable"))?;
        let accounts = client
            .accounts()
            .await
            .map_err(|e| classify(e, "enable"))?;

        Ok(Handshake {
            provider: client.name().to_string(),
            session: Session::new(
                Uuid::new_v4().to_string(),
                self.chain_identifier.clone(),
                accounts.into_iter().map(|a| a.address),
            ),
        })
    }
}

#[async_trait]
impl Connector for ExtensionConnector {
    async fn handshake(&self) -> WalletResult<Handshake> {
        let mut last_error = None;

        for client in self.clients.iter().filter(|c| c.is_installed()) {
            match self.try_client(client.as_ref()).await {
                Ok(handshake) => return Ok(handshake),
                Err(e @ WalletError::UserRejected(_)) => return Err(e),
                Err(e) => {
                    tracing::debug!(provider = client.name(), error = %e, "Extension failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(WalletError::WalletNotFound))
    }

    async fn release(&self, _session: &Session) {}

    fn subscribe(&self, _provider: &str) -> Option<broadcast::Receiver<ProviderEvent>> {
        None
    }
}

/// Adapter over in-browser wallet extensions.
pub struct ExtensionAdapter {
    conn: Connection<ExtensionConnector>,
    address_format: AddressFormat,
}

impl ExtensionAdapter {
    pub fn new(
        id: impl Into<String>,
        clients: Vec<Arc<dyn ExtensionClient>>,
        config: &ExtensionConfig,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            conn: Connection::new(id, ExtensionConnector::new(clients, config), settings),
            address_format: config.address_format,
        }
    }

    pub fn connection(&self) -> &Connection<ExtensionConnector> {
        &self.conn
    }
}

#[async_trait]
impl WalletAdapter for ExtensionAdapter {
    fn id(&self) -> &str {
        self.conn.id()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Extension
    }

    async fn enable(&self) -> WalletResult<()> {
        if self.conn.state() != ConnectionState::Enabled && !self.conn.connector().any_installed() {
            tracing::debug!(adapter = %self.id(), "No wallet extension installed");
            return Err(WalletError::WalletNotFound);
        }
        self.conn.enable().await
    }

    async fn get_accounts(&self) -> WalletResult<Vec<WalletAccount>> {
        let active = self.conn.require_enabled()?;
        let client = self.conn.connector().client(&active.provider)?;
        let listed = self.conn.call("getAccounts", client.accounts()).await?;

        let accounts = listed
            .into_iter()
            .map(|a| WalletAccount {
                address: a.address,
                display_name: a.name,
                source_provider: active.provider.clone(),
            })
            .collect();
        checked_accounts(accounts, self.address_format)
    }

    async fn sign_message(&self, message: &str) -> WalletResult<String> {
        let request = prepare_signing(&self.conn, message)?;
        let client = self.conn.connector().client(&request.provider)?;
        let signed = self
            .conn
            .call("signMessage", client.sign_raw(&request.address, &request.payload))
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
