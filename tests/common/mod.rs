//! Shared fixtures for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use wallet_bridge::adapters::{ExtensionAdapter, RelayAdapter, WalletAdapter};
use wallet_bridge::clients::simulated::{SimulatedExtension, SimulatedRelay};
use wallet_bridge::clients::ExtensionClient;
use wallet_bridge::config::{AdapterSettings, ExtensionConfig, RelayConfig};
use wallet_bridge::connection::EventHandler;
use wallet_bridge::validation::AddressFormat;
use wallet_bridge::{WalletEvent, WalletEventKind};

pub const CHAIN: &str = "polkadot:91b171bb158e2d3848fa23a9f1c25182";
pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
#[allow(dead_code)]
pub const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
/// ALICE with the last character changed.
#[allow(dead_code)]
pub const BAD_CHECKSUM: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQZ";

/// CAIP-10 id on the test chain.
pub fn caip(address: &str) -> String {
    format!("{}:{}", CHAIN, address)
}

pub fn relay_config() -> RelayConfig {
    RelayConfig {
        project_id: "test-project".to_string(),
        chain_id: CHAIN.to_string(),
        address_format: AddressFormat::Ss58 { prefix: 42 },
        ..RelayConfig::default()
    }
}

/// Relay client serving the given plain addresses.
pub fn simulated_relay(addresses: &[&str]) -> SimulatedRelay {
    let ids: Vec<String> = addresses.iter().map(|a| caip(a)).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    SimulatedRelay::new(&refs)
}

#[allow(dead_code)]
pub fn relay_adapter(relay: Arc<SimulatedRelay>) -> RelayAdapter {
    RelayAdapter::new("mobile", relay, &relay_config(), AdapterSettings::default())
}

#[allow(dead_code)]
pub fn extension_adapter(clients: Vec<Arc<SimulatedExtension>>) -> ExtensionAdapter {
    let clients = clients
        .into_iter()
        .map(|c| c as Arc<dyn ExtensionClient>)
        .collect();
    ExtensionAdapter::new(
        "browser",
        clients,
        &ExtensionConfig::default(),
        AdapterSettings::default(),
    )
}

/// Collect every event of `kind` emitted by `adapter`.
#[allow(dead_code)]
pub fn record(adapter: &dyn WalletAdapter, kind: WalletEventKind) -> Arc<Mutex<Vec<WalletEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: EventHandler = Arc::new(move |event: &WalletEvent| {
        sink.lock().unwrap().push(event.clone());
    });
    adapter.on(kind, handler);
    seen
}

/// Let background event and reconnect tasks run.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
