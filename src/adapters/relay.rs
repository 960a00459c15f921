//! Relay-mediated remote wallet adapter.
//!
//! # Responsibilities
//! - Open (or reuse) a relay session for the configured namespace
//! - Translate CAIP-10 account ids into plain addresses
//! - Hand push events to the connection monitor
//!
//! # Design Decisions
//! - A cached session from the client is reused until its expiry passes
//! - A malformed CAIP-10 entry fails the whole handshake or listing

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::adapters::{
    address_is_valid, checked_accounts, finish_signing, parse_caip10, prepare_signing,
    AdapterType, WalletAdapter,
};
use crate::clients::{ProviderEvent, RelayClient, RelaySession, RelaySessionRequest};
use crate::config::{AdapterSettings, RelayConfig};
use crate::connection::{
    Connection, ConnectionState, Connector, EventHandler, Handshake, Session, WalletAccount,
    WalletEventKind,
};
use crate::error::{classify, WalletError, WalletResult};
use crate::validation::AddressFormat;

/// Provider identifier reported while a relay session is active.
pub const RELAY_PROVIDER_ID: &str = "walletconnect";

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn is_expired(session: &RelaySession) -> bool {
    session.expiry.is_some_and(|expiry| expiry <= unix_now())
}

/// Addresses of CAIP-10 account ids, in order.
fn addresses(accounts: &[String], operation: &str) -> WalletResult<Vec<String>> {
    accounts
        .iter()
        .map(|account| {
            parse_caip10(account)
                .map(|(_, address)| address)
                .ok_or_else(|| {
                    WalletError::connection_during(
                        operation,
                        format!("malformed account id '{}'", account),
                    )
                })
        })
        .collect()
}

/// Handshake logic for the relay family.
pub struct RelayConnector {
    client: Arc<dyn RelayClient>,
    request: RelaySessionRequest,
}

impl RelayConnector {
    pub fn new(client: Arc<dyn RelayClient>, config: &RelayConfig) -> Self {
        Self {
            client,
            request: RelaySessionRequest {
                project_id: config.project_id.clone(),
                relay_url: config.relay_url.clone(),
                chain_id: config.chain_id.clone(),
                methods: config.methods.clone(),
                events: config.events.clone(),
                metadata: config.metadata.clone(),
            },
        }
    }

    pub fn client(&self) -> &Arc<dyn RelayClient> {
        &self.client
    }
}

#[async_trait]
impl Connector for RelayConnector {
    async fn handshake(&self) -> WalletResult<Handshake> {
        let relay_session = match self.client.session().filter(|s| !is_expired(s)) {
            Some(existing) => {
                tracing::debug!(topic = %existing.topic, "Reusing relay session");
                existing
            }
            None => self
                .client
                .connect(&self.request)
                .await
                .map_err(|e| classify(e, "enable"))?,
        };

        let accounts = addresses(&relay_session.accounts, "enable")?;
        Ok(Handshake {
            provider: RELAY_PROVIDER_ID.to_string(),
            session: Session::new(relay_session.topic, relay_session.chain_id, accounts)
                .with_expiry(relay_session.expiry),
        })
    }

    async fn release(&self, session: &Session) {
        if let Err(e) = self.client.disconnect(session.topic()).await {
            tracing::debug!(topic = session.topic(), error = %e, "Relay disconnect failed");
        }
    }

    fn subscribe(&self, _provider: &str) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.client.subscribe())
    }
}

/// Adapter over a relay session client.
pub struct RelayAdapter {
    conn: Connection<RelayConnector>,
    address_format: AddressFormat,
}

impl RelayAdapter {
    pub fn new(
        id: impl Into<String>,
        client: Arc<dyn RelayClient>,
        config: &RelayConfig,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            conn: Connection::new(id, RelayConnector::new(client, config), settings),
            address_format: config.address_format,
        }
    }

    pub fn connection(&self) -> &Connection<RelayConnector> {
        &self.conn
    }
}

#[async_trait]
impl WalletAdapter for RelayAdapter {
    fn id(&self) -> &str {
        self.conn.id()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Relay
    }

    async fn enable(&self) -> WalletResult<()> {
        self.conn.enable().await
    }

    async fn get_accounts(&self) -> WalletResult<Vec<WalletAccount>> {
        let active = self.conn.require_enabled()?;
        let client = self.conn.connector().client();
        let listed = self
            .conn
            .call("getAccounts", client.request_accounts(active.session.topic()))
            .await?;

        let accounts = addresses(&listed, "getAccounts")?
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
        let client = self.conn.connector().client();
        let signed = self
            .conn
            .call(
                "signMessage",
                client.request_signature(
                    request.session.topic(),
                    request.session.chain_identifier(),
                    &request.address,
                    &request.payload,
                ),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::simulated::{Behavior, SimulatedRelay};

    const CHAIN: &str = "polkadot:91b171bb158e2d3848fa23a9f1c25182";
    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    fn caip(address: &str) -> String {
        format!("{}:{}", CHAIN, address)
    }

    fn adapter(relay: Arc<SimulatedRelay>) -> RelayAdapter {
        let config = RelayConfig {
            project_id: "test-project".to_string(),
            address_format: AddressFormat::Ss58 { prefix: 42 },
            ..RelayConfig::default()
        };
        RelayAdapter::new("mobile", relay, &config, AdapterSettings::default())
    }

    #[tokio::test]
    async fn test_enable_opens_session() {
        let relay = Arc::new(SimulatedRelay::new(&[caip(ALICE).as_str()]));
        let adapter = adapter(relay.clone());

        adapter.enable().await.unwrap();
        assert_eq!(adapter.get_provider().as_deref(), Some(RELAY_PROVIDER_ID));
        let session = adapter.session().unwrap();
        assert_eq!(session.topic(), "topic-1");
        assert_eq!(session.chain_identifier(), CHAIN);
        assert_eq!(session.account_addresses(), [ALICE.to_string()]);
        assert_eq!(relay.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_reuses_live_cached_session() {
        let relay = Arc::new(SimulatedRelay::new(&[]).with_session(RelaySession {
            topic: "restored".to_string(),
            chain_id: CHAIN.to_string(),
            accounts: vec![caip(ALICE)],
            expiry: Some(unix_now() + 3600),
        }));
        let adapter = adapter(relay.clone());

        adapter.enable().await.unwrap();
        assert_eq!(relay.connect_calls(), 0);
        assert_eq!(adapter.session().unwrap().topic(), "restored");
    }

    #[tokio::test]
    async fn test_expired_cached_session_is_replaced() {
        let relay = Arc::new(
            SimulatedRelay::new(&[caip(ALICE).as_str()]).with_session(RelaySession {
                topic: "stale".to_string(),
                chain_id: CHAIN.to_string(),
                accounts: vec![caip(ALICE)],
                expiry: Some(1),
            }),
        );
        let adapter = adapter(relay.clone());

        adapter.enable().await.unwrap();
        assert_eq!(relay.connect_calls(), 1);
        assert_eq!(adapter.session().unwrap().topic(), "topic-1");
    }

    #[tokio::test]
    async fn test_malformed_account_id_fails_handshake() {
        let relay = Arc::new(SimulatedRelay::new(&["not-caip"]));
        let adapter = adapter(relay);

        let err = adapter.enable().await.unwrap_err();
        assert!(matches!(err, WalletError::ConnectionFailed { .. }));
        assert_eq!(adapter.state(), ConnectionState::Disabled);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_relay() {
        let relay = Arc::new(SimulatedRelay::new(&[caip(ALICE).as_str()]));
        let adapter = adapter(relay.clone());
        adapter.enable().await.unwrap();

        adapter.disconnect().await;
        assert_eq!(relay.disconnect_calls(), 1);
        assert!(adapter.session().is_none());
        assert!(adapter.get_provider().is_none());
    }

    #[tokio::test]
    async fn test_provider_rejection_is_classified() {
        let relay = Arc::new(SimulatedRelay::new(&[caip(ALICE).as_str()]).with_sign(Behavior::Reject));
        let adapter = adapter(relay);
        adapter.enable().await.unwrap();

        let err = adapter.sign_message("hello").await.unwrap_err();
        assert!(matches!(err, WalletError::UserRejected(ref ctx) if ctx.operation == "signMessage"));
    }
}
