//! In-memory provider clients with scriptable behavior.
//!
//! Used by the test suites and the `demo` command. Each client counts its
//! calls so tests can assert how many handshakes actually reached the
//! provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::clients::{
    ExtensionAccount, ExtensionClient, InjectedProvider, ProviderError, ProviderEvent,
    ProviderResult, RelayClient, RelaySession, RelaySessionRequest,
};

/// A well-formed 64-byte signature.
pub fn sample_signature() -> String {
    format!("0x{}", "11".repeat(64))
}

/// How a simulated provider answers one kind of call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Succeed,
    /// Fail the way wallets report a declined prompt.
    Reject,
    Fail(String),
    /// Never settle.
    Hang,
    /// Succeed after a delay.
    Delay(Duration),
}

impl Behavior {
    async fn settle(self) -> ProviderResult<()> {
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::Reject => Err(ProviderError::with_code(
                "User rejected the request",
                "4001",
            )),
            Behavior::Fail(message) => Err(ProviderError::new(message)),
            Behavior::Hang => std::future::pending().await,
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// Mutex slot that tolerates poisoning.
#[derive(Debug, Default)]
struct Slot<T>(Mutex<T>);

impl<T: Clone> Slot<T> {
    fn new(value: T) -> Self {
        Self(Mutex::new(value))
    }

    fn get(&self) -> T {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, value: T) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Simulated browser extension.
#[derive(Debug)]
pub struct SimulatedExtension {
    name: String,
    installed: bool,
    enable: Slot<Behavior>,
    sign: Slot<Behavior>,
    accounts: Slot<Vec<ExtensionAccount>>,
    signature: Slot<String>,
    last_sign: Slot<Option<(String, String)>>,
    enable_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl SimulatedExtension {
    pub fn new(name: impl Into<String>, accounts: &[&str]) -> Self {
        Self {
            name: name.into(),
            installed: true,
            enable: Slot::new(Behavior::Succeed),
            sign: Slot::new(Behavior::Succeed),
            accounts: Slot::new(
                accounts
                    .iter()
                    .map(|address| ExtensionAccount {
                        address: address.to_string(),
                        name: None,
                    })
                    .collect(),
            ),
            signature: Slot::new(sample_signature()),
            last_sign: Slot::new(None),
            enable_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// An extension that is not present in the page.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            installed: false,
            ..Self::new(name, &[])
        }
    }

    pub fn with_enable(self, behavior: Behavior) -> Self {
        self.enable.set(behavior);
        self
    }

    pub fn with_sign(self, behavior: Behavior) -> Self {
        self.sign.set(behavior);
        self
    }

    pub fn with_signature(self, signature: impl Into<String>) -> Self {
        self.signature.set(signature.into());
        self
    }

    pub fn with_named_accounts(self, accounts: Vec<ExtensionAccount>) -> Self {
        self.accounts.set(accounts);
        self
    }

    pub fn set_enable(&self, behavior: Behavior) {
        self.enable.set(behavior);
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// `(address, data)` of the most recent signing request.
    pub fn last_sign_request(&self) -> Option<(String, String)> {
        self.last_sign.get()
    }
}

#[async_trait]
impl ExtensionClient for SimulatedExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_installed(&self) -> bool {
        self.installed
    }

    async fn enable(&self, _app_name: &str) -> ProviderResult<()> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        self.enable.get().settle().await
    }

    async fn accounts(&self) -> ProviderResult<Vec<ExtensionAccount>> {
        Ok(self.accounts.get())
    }

    async fn sign_raw(&self, address: &str, data: &str) -> ProviderResult<String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.last_sign
            .set(Some((address.to_string(), data.to_string())));
        self.sign.get().settle().await?;
        Ok(self.signature.get())
    }
}

/// Simulated relay session client.
#[derive(Debug)]
pub struct SimulatedRelay {
    connect: Slot<Behavior>,
    sign: Slot<Behavior>,
    disconnect: Slot<Behavior>,
    accounts: Slot<Vec<String>>,
    signature: Slot<String>,
    session: Slot<Option<RelaySession>>,
    events: broadcast::Sender<ProviderEvent>,
    connect_calls: AtomicUsize,
    sign_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl SimulatedRelay {
    /// `accounts` are CAIP-10 identifiers.
    pub fn new(accounts: &[&str]) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            connect: Slot::new(Behavior::Succeed),
            sign: Slot::new(Behavior::Succeed),
            disconnect: Slot::new(Behavior::Succeed),
            accounts: Slot::new(accounts.iter().map(|a| a.to_string()).collect()),
            signature: Slot::new(sample_signature()),
            session: Slot::new(None),
            events,
            connect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_connect(self, behavior: Behavior) -> Self {
        self.connect.set(behavior);
        self
    }

    pub fn with_disconnect(self, behavior: Behavior) -> Self {
        self.disconnect.set(behavior);
        self
    }

    pub fn with_sign(self, behavior: Behavior) -> Self {
        self.sign.set(behavior);
        self
    }

    pub fn with_signature(self, signature: impl Into<String>) -> Self {
        self.signature.set(signature.into());
        self
    }

    /// Pretend a session survives from an earlier run.
    pub fn with_session(self, session: RelaySession) -> Self {
        self.session.set(Some(session));
        self
    }

    pub fn set_connect(&self, behavior: Behavior) {
        self.connect.set(behavior);
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.accounts.set(accounts.iter().map(|a| a.to_string()).collect());
    }

    /// Deliver a push event. Session-ending events also drop the client's
    /// cached session.
    pub fn push(&self, event: ProviderEvent) {
        if matches!(
            event,
            ProviderEvent::Disconnected | ProviderEvent::SessionDeleted | ProviderEvent::SessionExpired
        ) {
            self.session.set(None);
        }
        let _ = self.events.send(event);
    }

    /// Sender for scripting events from inside handlers.
    pub fn event_sender(&self) -> broadcast::Sender<ProviderEvent> {
        self.events.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayClient for SimulatedRelay {
    async fn connect(&self, request: &RelaySessionRequest) -> ProviderResult<RelaySession> {
        let call = self.connect_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.connect.get().settle().await?;

        let session = RelaySession {
            topic: format!("topic-{}", call),
            chain_id: request.chain_id.clone(),
            accounts: self.accounts.get(),
            expiry: None,
        };
        self.session.set(Some(session.clone()));
        Ok(session)
    }

    fn session(&self) -> Option<RelaySession> {
        self.session.get()
    }

    async fn request_accounts(&self, _topic: &str) -> ProviderResult<Vec<String>> {
        Ok(self.accounts.get())
    }

    async fn request_signature(
        &self,
        _topic: &str,
        _chain_id: &str,
        _address: &str,
        _data: &str,
    ) -> ProviderResult<String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.sign.get().settle().await?;
        Ok(self.signature.get())
    }

    async fn disconnect(&self, _topic: &str) -> ProviderResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.session.set(None);
        self.disconnect.get().settle().await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Simulated EIP-1193 injected provider.
#[derive(Debug)]
pub struct SimulatedInjected {
    name: String,
    available: bool,
    request: Slot<Behavior>,
    sign: Slot<Behavior>,
    accounts: Slot<Vec<String>>,
    chain_id: Slot<String>,
    signature: Slot<String>,
    events: broadcast::Sender<ProviderEvent>,
    request_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl SimulatedInjected {
    pub fn new(name: impl Into<String>, accounts: &[&str]) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            name: name.into(),
            available: true,
            request: Slot::new(Behavior::Succeed),
            sign: Slot::new(Behavior::Succeed),
            accounts: Slot::new(accounts.iter().map(|a| a.to_string()).collect()),
            chain_id: Slot::new("0x1".to_string()),
            signature: Slot::new(sample_signature()),
            events,
            request_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            available: false,
            ..Self::new(name, &[])
        }
    }

    pub fn with_request(self, behavior: Behavior) -> Self {
        self.request.set(behavior);
        self
    }

    pub fn with_sign(self, behavior: Behavior) -> Self {
        self.sign.set(behavior);
        self
    }

    pub fn with_chain_id(self, chain_id: impl Into<String>) -> Self {
        self.chain_id.set(chain_id.into());
        self
    }

    pub fn with_signature(self, signature: impl Into<String>) -> Self {
        self.signature.set(signature.into());
        self
    }

    pub fn push(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InjectedProvider for SimulatedInjected {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.request.get().settle().await?;
        Ok(self.accounts.get())
    }

    async fn accounts(&self) -> ProviderResult<Vec<String>> {
        Ok(self.accounts.get())
    }

    async fn chain_id(&self) -> ProviderResult<String> {
        Ok(self.chain_id.get())
    }

    async fn personal_sign(&self, _data: &str, _address: &str) -> ProviderResult<String> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.sign.get().settle().await?;
        Ok(self.signature.get())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reject_carries_user_rejected_code() {
        let err = Behavior::Reject.settle().await.unwrap_err();
        assert_eq!(err.code.as_deref(), Some("4001"));
    }

    #[tokio::test]
    async fn test_relay_push_drops_cached_session() {
        let relay = SimulatedRelay::new(&["polkadot:abc:addr"]);
        let request = RelaySessionRequest {
            project_id: "p".to_string(),
            relay_url: "wss://relay.example".to_string(),
            chain_id: "polkadot:abc".to_string(),
            methods: Vec::new(),
            events: Vec::new(),
            metadata: Default::default(),
        };
        let session = relay.connect(&request).await.unwrap();
        assert_eq!(session.topic, "topic-1");
        assert!(relay.session().is_some());

        relay.push(ProviderEvent::Disconnected);
        assert!(relay.session().is_none());
    }

    #[test]
    fn test_sample_signature_shape() {
        assert_eq!(sample_signature().len(), 2 + 128);
    }
}
