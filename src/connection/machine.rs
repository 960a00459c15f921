//! Per-adapter connection state machine and reconnect controller.
//!
//! # Responsibilities
//! - Serialize enable attempts: one provider handshake in flight at a time
//! - Race every handshake against the operation deadline
//! - Commit a session only if no disconnect happened meanwhile
//! - Pump provider push events into adapter events
//! - Drive bounded automatic reconnection after connection loss
//!
//! # Design Decisions
//! - The lock is only taken in synchronous sections, never across an await
//! - `generation` changes whenever a session ends or a new attempt starts;
//!   stale completions compare against it
//! - `epoch` changes only on explicit `disconnect()`; a reconnect loop from an
//!   older epoch stops

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use uuid::Uuid;

use crate::clients::{ProviderEvent, ProviderResult};
use crate::config::AdapterSettings;
use crate::connection::events::{EventRegistry, WalletEvent};
use crate::connection::session::Session;
use crate::connection::state::ConnectionState;
use crate::error::{classify, WalletError, WalletResult};
use crate::observability::metrics;
use crate::resilience::{with_deadline, ReconnectCounter};

/// Result of a successful provider handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Identifier of the provider that accepted the connection.
    pub provider: String,
    pub session: Session,
}

/// Provider-family specific half of a connection.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection. Errors must already be classified.
    async fn handshake(&self) -> WalletResult<Handshake>;

    /// Best-effort provider-side teardown. Must not fail.
    async fn release(&self, session: &Session);

    /// Push events for the activated provider, if the family has any.
    fn subscribe(&self, provider: &str) -> Option<broadcast::Receiver<ProviderEvent>>;
}

/// Provider and session of an enabled adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub provider: String,
    pub session: Session,
}

type Outcome = Option<WalletResult<()>>;

enum Phase {
    Disabled,
    /// Waiters clone the receiver and get the in-flight attempt's outcome.
    Enabling(watch::Receiver<Outcome>),
    Enabled,
}

struct Inner {
    phase: Phase,
    session: Option<Session>,
    provider: Option<String>,
    generation: u64,
    epoch: u64,
    reconnect: ReconnectCounter,
    /// When the current session was established by an automatic reconnection.
    reconnected_at: Option<Instant>,
    signing_account: Option<String>,
    /// Event pump / reconnect task for the current session.
    monitor: Option<JoinHandle<()>>,
}

impl Inner {
    /// End the current session locally. Returns the session that was live.
    fn clear(&mut self) -> Option<Session> {
        self.phase = Phase::Disabled;
        self.provider = None;
        self.reconnected_at = None;
        self.generation += 1;
        self.session.take()
    }
}

struct Shared<C> {
    id: String,
    connector: C,
    settings: AdapterSettings,
    events: EventRegistry,
    inner: Mutex<Inner>,
}

impl<C> Drop for Shared<C> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(monitor) = inner.monitor.take() {
            monitor.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Caller,
    Reconnect,
}

enum Begin {
    AlreadyEnabled,
    Join(watch::Receiver<Outcome>),
    Lead {
        generation: u64,
        tx: watch::Sender<Outcome>,
    },
}

enum Flow {
    Continue,
    Stop,
    Reconnect,
}

enum ReconnectStep {
    Attempt(u32),
    Exhausted(u32),
    Superseded,
}

/// Connection state shared by an adapter and its background tasks.
pub struct Connection<C: Connector> {
    shared: Arc<Shared<C>>,
}

impl<C: Connector> Clone for Connection<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C: Connector> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .field("provider", &self.provider())
            .finish()
    }
}

impl<C: Connector> Connection<C> {
    pub fn new(id: impl Into<String>, connector: C, settings: AdapterSettings) -> Self {
        let reconnect = ReconnectCounter::new(settings.reconnect.max_attempts);
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                connector,
                settings,
                events: EventRegistry::new(),
                inner: Mutex::new(Inner {
                    phase: Phase::Disabled,
                    session: None,
                    provider: None,
                    generation: 0,
                    epoch: 0,
                    reconnect,
                    reconnected_at: None,
                    signing_account: None,
                    monitor: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn connector(&self) -> &C {
        &self.shared.connector
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.shared.settings
    }

    pub fn events(&self) -> &EventRegistry {
        &self.shared.events
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        match self.lock().phase {
            Phase::Disabled => ConnectionState::Disabled,
            Phase::Enabling(_) => ConnectionState::Enabling,
            Phase::Enabled => ConnectionState::Enabled,
        }
    }

    /// Active provider identifier, only while enabled.
    pub fn provider(&self) -> Option<String> {
        let inner = self.lock();
        match inner.phase {
            Phase::Enabled => inner.provider.clone(),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    /// Automatic reconnection attempts since the last confirmed success.
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock().reconnect.attempts()
    }

    pub fn signing_account(&self) -> Option<String> {
        self.lock().signing_account.clone()
    }

    /// Designate the account used for signing; `None` falls back to the first.
    pub fn select_account(&self, address: Option<String>) -> WalletResult<()> {
        let mut inner = self.lock();
        if !matches!(inner.phase, Phase::Enabled) {
            return Err(WalletError::WalletNotFound);
        }
        if let Some(address) = &address {
            let known = inner
                .session
                .as_ref()
                .is_some_and(|session| session.contains_account(address));
            if !known {
                return Err(WalletError::AddressInvalid(format!(
                    "{} is not an account of the active session",
                    address
                )));
            }
        }
        inner.signing_account = address;
        Ok(())
    }

    /// Snapshot of the live session, or `WalletNotFound` when not enabled.
    pub fn require_enabled(&self) -> WalletResult<ActiveSession> {
        let inner = self.lock();
        match (&inner.phase, &inner.provider, &inner.session) {
            (Phase::Enabled, Some(provider), Some(session)) => Ok(ActiveSession {
                provider: provider.clone(),
                session: session.clone(),
            }),
            _ => Err(WalletError::WalletNotFound),
        }
    }

    /// Run a raw provider call under the deadline and classify its failure.
    pub async fn call<T, F>(&self, operation: &str, fut: F) -> WalletResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        with_deadline(operation, self.settings().timeout, async move {
            fut.await.map_err(|e| classify(e, operation))
        })
        .await
    }

    /// Move to `Enabled`, joining an attempt already in flight.
    pub async fn enable(&self) -> WalletResult<()> {
        self.enable_from(Origin::Caller).await
    }

    async fn enable_from(&self, origin: Origin) -> WalletResult<()> {
        match self.begin_enable() {
            Begin::AlreadyEnabled => Ok(()),
            Begin::Join(rx) => join(rx).await,
            Begin::Lead { generation, tx } => self.lead(generation, tx, origin).await,
        }
    }

    /// Set the `Enabling` marker before the first suspension point.
    fn begin_enable(&self) -> Begin {
        let mut inner = self.lock();
        let in_flight = match &inner.phase {
            Phase::Enabled => return Begin::AlreadyEnabled,
            Phase::Enabling(rx) => Some(rx.clone()),
            Phase::Disabled => None,
        };
        if let Some(rx) = in_flight {
            return Begin::Join(rx);
        }

        let (tx, rx) = watch::channel(None);
        inner.generation += 1;
        inner.phase = Phase::Enabling(rx);
        Begin::Lead {
            generation: inner.generation,
            tx,
        }
    }

    async fn lead(
        &self,
        generation: u64,
        tx: watch::Sender<Outcome>,
        origin: Origin,
    ) -> WalletResult<()> {
        let attempt = Uuid::new_v4();
        tracing::debug!(adapter = %self.id(), attempt = %attempt, origin = ?origin, "Enabling adapter");

        let mut guard = AbandonGuard {
            conn: self,
            generation,
            armed: true,
        };
        let outcome = with_deadline(
            "enable",
            self.settings().timeout,
            self.shared.connector.handshake(),
        )
        .await;
        guard.armed = false;

        let (result, orphan) = self.commit(generation, outcome, origin);
        if let Some(session) = orphan {
            tracing::debug!(adapter = %self.id(), attempt = %attempt, "Releasing session opened after disconnect");
            self.release_quietly(&session).await;
        }

        metrics::record_enable(self.id(), &result);
        match &result {
            Ok(()) => tracing::info!(
                adapter = %self.id(),
                attempt = %attempt,
                provider = ?self.provider(),
                "Adapter enabled"
            ),
            Err(e) => tracing::warn!(
                adapter = %self.id(),
                attempt = %attempt,
                code = %e.code(),
                error = %e,
                "Adapter enable failed"
            ),
        }

        tx.send_replace(Some(result.clone()));
        result
    }

    /// Apply a settled handshake. Returns the outcome plus any session that
    /// was opened for an attempt superseded by `disconnect()`.
    fn commit(
        &self,
        generation: u64,
        outcome: WalletResult<Handshake>,
        origin: Origin,
    ) -> (WalletResult<()>, Option<Session>) {
        let mut connected = None;
        let committed = {
            let mut inner = self.lock();
            let current =
                inner.generation == generation && matches!(inner.phase, Phase::Enabling(_));

            match outcome {
                Ok(Handshake { provider, session }) if current => {
                    inner.phase = Phase::Enabled;
                    inner.provider = Some(provider.clone());
                    inner.session = Some(session);
                    match origin {
                        Origin::Caller => {
                            inner.reconnect.reset();
                            inner.reconnected_at = None;
                        }
                        Origin::Reconnect => inner.reconnected_at = Some(Instant::now()),
                    }

                    if let Some(rx) = self.shared.connector.subscribe(&provider) {
                        let monitor = spawn_monitor(Arc::downgrade(&self.shared), generation, rx);
                        // On reconnection the previous handle is the task running this commit.
                        if let Some(previous) = inner.monitor.replace(monitor) {
                            if origin == Origin::Caller {
                                previous.abort();
                            }
                        }
                    }

                    connected = Some(provider);
                    (Ok(()), None)
                }
                Ok(handshake) => (
                    Err(WalletError::connection_during(
                        "enable",
                        "connection closed while enabling",
                    )),
                    Some(handshake.session),
                ),
                Err(err) => {
                    if current {
                        inner.phase = Phase::Disabled;
                    }
                    (Err(err), None)
                }
            }
        };

        if let Some(provider) = connected {
            self.shared.events.emit(&WalletEvent::Connected { provider });
        }
        committed
    }

    /// Drop the session locally, then tell the provider. Never fails.
    pub async fn disconnect(&self) {
        let (session, was_active) = self.close_locally();
        if let Some(session) = &session {
            self.release_quietly(session).await;
        }
        if was_active {
            tracing::info!(adapter = %self.id(), "Adapter disconnected");
            self.shared.events.emit(&WalletEvent::Disconnected);
        }
    }

    fn close_locally(&self) -> (Option<Session>, bool) {
        let (session, monitor, was_active) = {
            let mut inner = self.lock();
            let was_active = !matches!(inner.phase, Phase::Disabled);
            inner.epoch += 1;
            inner.signing_account = None;
            let session = inner.clear();
            (session, inner.monitor.take(), was_active)
        };
        if let Some(monitor) = monitor {
            monitor.abort();
        }
        (session, was_active)
    }

    async fn release_quietly(&self, session: &Session) {
        let released = timeout(
            self.settings().timeout,
            self.shared.connector.release(session),
        )
        .await;
        if released.is_err() {
            tracing::debug!(adapter = %self.id(), topic = session.topic(), "Provider release timed out");
        }
    }

    /// Fold one provider push event into local state.
    fn apply_provider_event(&self, generation: u64, event: ProviderEvent) -> Flow {
        let mut emitted = Vec::new();
        let flow = {
            let mut inner = self.lock();
            if inner.generation != generation || !matches!(inner.phase, Phase::Enabled) {
                return Flow::Stop;
            }

            match event {
                ProviderEvent::SessionUpdate { accounts, chain } => {
                    if let Some(session) = inner.session.as_mut() {
                        if !accounts.is_empty() {
                            session.replace_accounts(accounts);
                        }
                        if let Some(chain) = chain {
                            session.set_chain(chain);
                        }
                        emitted.push(WalletEvent::SessionUpdate(session.clone()));
                    }
                    Flow::Continue
                }
                ProviderEvent::ChainChanged(chain) => {
                    if let Some(session) = inner.session.as_mut() {
                        session.set_chain(chain.clone());
                    }
                    emitted.push(WalletEvent::ChainChanged(chain));
                    Flow::Continue
                }
                ProviderEvent::SessionExpired => {
                    inner.clear();
                    emitted.push(WalletEvent::SessionExpired);
                    Flow::Stop
                }
                ProviderEvent::SessionDeleted => {
                    inner.clear();
                    emitted.push(WalletEvent::Disconnected);
                    Flow::Stop
                }
                ProviderEvent::Disconnected => Flow::Reconnect,
            }
        };

        for event in &emitted {
            tracing::debug!(adapter = %self.id(), event = %event.kind(), "Provider event");
            self.shared.events.emit(event);
        }
        flow
    }

    /// Tear down a lost session. Returns the epoch to reconnect under, or
    /// `None` if the session was already gone.
    fn mark_connection_lost(&self, lost_generation: u64) -> Option<u64> {
        let mut inner = self.lock();
        if inner.generation != lost_generation || !matches!(inner.phase, Phase::Enabled) {
            return None;
        }
        if let Some(at) = inner.reconnected_at {
            if at.elapsed() >= self.settings().reconnect.stability_window {
                inner.reconnect.reset();
            }
        }
        inner.clear();
        Some(inner.epoch)
    }

    fn next_reconnect_step(&self, epoch: u64) -> ReconnectStep {
        let mut inner = self.lock();
        if inner.epoch != epoch || !matches!(inner.phase, Phase::Disabled) {
            return ReconnectStep::Superseded;
        }
        match inner.reconnect.try_increment() {
            Some(attempt) => ReconnectStep::Attempt(attempt),
            None => ReconnectStep::Exhausted(inner.reconnect.attempts()),
        }
    }

    async fn reconnect(&self, lost_generation: u64) {
        let Some(epoch) = self.mark_connection_lost(lost_generation) else {
            return;
        };
        let policy = self.settings().reconnect;

        tracing::warn!(adapter = %self.id(), "Provider connection lost");
        self.shared.events.emit(&WalletEvent::Disconnected);

        loop {
            let attempt = match self.next_reconnect_step(epoch) {
                ReconnectStep::Attempt(attempt) => attempt,
                ReconnectStep::Exhausted(attempts) => {
                    tracing::error!(adapter = %self.id(), attempts = attempts, "Reconnect budget exhausted");
                    metrics::record_reconnect_failed(self.id());
                    self.shared
                        .events
                        .emit(&WalletEvent::ReconnectFailed { attempts });
                    return;
                }
                ReconnectStep::Superseded => return,
            };

            metrics::record_reconnect_attempt(self.id());
            let delay = policy.delay_for(attempt);
            tracing::info!(
                adapter = %self.id(),
                attempt = attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.enable_from(Origin::Reconnect).await {
                Ok(()) => return,
                Err(e) => tracing::warn!(
                    adapter = %self.id(),
                    attempt = attempt,
                    error = %e,
                    "Reconnect attempt failed"
                ),
            }
        }
    }
}

/// Wait for the outcome of another caller's enable attempt.
async fn join(mut rx: watch::Receiver<Outcome>) -> WalletResult<()> {
    let outcome = match rx.wait_for(Option::is_some).await {
        Ok(value) => value.clone(),
        Err(_) => None,
    };
    outcome.unwrap_or_else(|| {
        Err(WalletError::connection_during(
            "enable",
            "enable attempt was abandoned",
        ))
    })
}

fn spawn_monitor<C: Connector>(
    shared: Weak<Shared<C>>,
    generation: u64,
    mut rx: broadcast::Receiver<ProviderEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Provider events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(shared) = shared.upgrade() else {
                break;
            };
            let conn = Connection { shared };

            match conn.apply_provider_event(generation, event) {
                Flow::Continue => {}
                Flow::Stop => break,
                Flow::Reconnect => {
                    conn.reconnect(generation).await;
                    break;
                }
            }
        }
    })
}

/// Returns the state machine to `Disabled` if an enable future is dropped
/// before its handshake settles.
struct AbandonGuard<'a, C: Connector> {
    conn: &'a Connection<C>,
    generation: u64,
    armed: bool,
}

impl<C: Connector> Drop for AbandonGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.conn.lock();
        if inner.generation == self.generation && matches!(inner.phase, Phase::Enabling(_)) {
            inner.phase = Phase::Disabled;
            tracing::debug!(adapter = %self.conn.id(), "Enable attempt abandoned");
        }
    }
}
