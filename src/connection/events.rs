//! Adapter event registry.
//!
//! Handlers are stored per event kind in registration order. Dispatch
//! works on a snapshot of the list, so a handler may register or remove
//! handlers (itself included) while it runs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::connection::session::Session;

/// Names of the notifications an adapter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletEventKind {
    Connected,
    Disconnected,
    SessionUpdate,
    SessionExpired,
    ChainChanged,
    ReconnectFailed,
}

impl WalletEventKind {
    pub const ALL: [WalletEventKind; 6] = [
        WalletEventKind::Connected,
        WalletEventKind::Disconnected,
        WalletEventKind::SessionUpdate,
        WalletEventKind::SessionExpired,
        WalletEventKind::ChainChanged,
        WalletEventKind::ReconnectFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletEventKind::Connected => "connected",
            WalletEventKind::Disconnected => "disconnected",
            WalletEventKind::SessionUpdate => "sessionUpdate",
            WalletEventKind::SessionExpired => "sessionExpired",
            WalletEventKind::ChainChanged => "chainChanged",
            WalletEventKind::ReconnectFailed => "reconnectFailed",
        }
    }
}

impl fmt::Display for WalletEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletEventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown event '{}'", s))
    }
}

/// A notification delivered to registered handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    Connected { provider: String },
    Disconnected,
    SessionUpdate(Session),
    SessionExpired,
    ChainChanged(String),
    ReconnectFailed { attempts: u32 },
}

impl WalletEvent {
    pub fn kind(&self) -> WalletEventKind {
        match self {
            WalletEvent::Connected { .. } => WalletEventKind::Connected,
            WalletEvent::Disconnected => WalletEventKind::Disconnected,
            WalletEvent::SessionUpdate(_) => WalletEventKind::SessionUpdate,
            WalletEvent::SessionExpired => WalletEventKind::SessionExpired,
            WalletEvent::ChainChanged(_) => WalletEventKind::ChainChanged,
            WalletEvent::ReconnectFailed { .. } => WalletEventKind::ReconnectFailed,
        }
    }
}

/// Event callback. Identity for [`EventRegistry::off`] is the `Arc` pointer.
pub type EventHandler = Arc<dyn Fn(&WalletEvent) + Send + Sync>;

/// Observer lists keyed by event kind.
#[derive(Default)]
pub struct EventRegistry {
    handlers: Mutex<HashMap<WalletEventKind, Vec<EventHandler>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: WalletEventKind, handler: EventHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(handler);
    }

    /// Remove a handler. Returns false if it was not registered for `kind`.
    pub fn off(&self, kind: WalletEventKind, handler: &EventHandler) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        match list.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn handler_count(&self, kind: WalletEventKind) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler registered when dispatch started.
    pub fn emit(&self, event: &WalletEvent) {
        let snapshot: Vec<EventHandler> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        tracing::trace!(event = %event.kind(), handlers = snapshot.len(), "Dispatching wallet event");
        for handler in snapshot {
            handler(event);
        }
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<_, _> = handlers.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventRegistry").field("handlers", &counts).finish()
    }
}
