//! Adapter selector scenarios.

use std::sync::Arc;

use wallet_bridge::adapters::{AdapterType, RELAY_PROVIDER_ID};
use wallet_bridge::clients::simulated::{sample_signature, Behavior, SimulatedExtension, SimulatedInjected};
use wallet_bridge::clients::{ExtensionClient, InjectedProvider};
use wallet_bridge::config::{parse_config, AdapterDescriptor};
use wallet_bridge::{
    AdapterRegistry, AdapterSelector, ErrorCode, ProviderClients, WalletConfig, WalletError,
};

mod common;

use common::ALICE;

fn config(adapters: Vec<AdapterDescriptor>) -> WalletConfig {
    let mut config = WalletConfig::default();
    config.adapters = adapters;
    config.relay = common::relay_config();
    config
}

#[tokio::test]
async fn test_falls_through_failed_adapter() {
    let extension = Arc::new(
        SimulatedExtension::new("polkadot-js", &[ALICE])
            .with_enable(Behavior::Fail("extension crashed".to_string())),
    );
    let relay = Arc::new(common::simulated_relay(&[ALICE]));
    let registry = AdapterRegistry::with_clients(ProviderClients {
        extensions: vec![extension.clone() as Arc<dyn ExtensionClient>],
        relay: Some(relay.clone()),
        injected: Vec::new(),
    });

    let selector = AdapterSelector::new(
        config(vec![
            AdapterDescriptor::new("b", AdapterType::Relay, 2),
            AdapterDescriptor::new("a", AdapterType::Extension, 1),
        ]),
        registry,
    )
    .unwrap();

    let adapter = selector.connect().await.unwrap();
    assert_eq!(adapter.id(), "b");
    assert_eq!(adapter.get_provider().as_deref(), Some(RELAY_PROVIDER_ID));
    assert_eq!(extension.enable_calls(), 1);
    assert_eq!(relay.connect_calls(), 1);

    assert_eq!(adapter.sign_message("hello").await.unwrap(), sample_signature());
}

#[tokio::test]
async fn test_first_success_stops_search() {
    let extension = Arc::new(SimulatedExtension::new("polkadot-js", &[ALICE]));
    let injected = Arc::new(SimulatedInjected::new("metamask", &["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"]));
    let registry = AdapterRegistry::with_clients(ProviderClients {
        extensions: vec![extension as Arc<dyn ExtensionClient>],
        relay: None,
        injected: vec![injected.clone() as Arc<dyn InjectedProvider>],
    });

    let selector = AdapterSelector::new(
        config(vec![
            AdapterDescriptor::new("browser", AdapterType::Extension, 1),
            AdapterDescriptor::new("evm", AdapterType::Injected, 2),
        ]),
        registry,
    )
    .unwrap();

    let adapter = selector.connect().await.unwrap();
    assert_eq!(adapter.get_provider().as_deref(), Some("polkadot-js"));
    assert_eq!(injected.request_calls(), 0);
}

#[test]
fn test_invalid_configuration_fails_before_any_provider_call() {
    let extension = Arc::new(SimulatedExtension::new("polkadot-js", &[ALICE]));
    let registry = AdapterRegistry::with_clients(ProviderClients {
        extensions: vec![extension.clone() as Arc<dyn ExtensionClient>],
        ..ProviderClients::default()
    });

    let mut broken = config(vec![AdapterDescriptor::new("browser", AdapterType::Extension, 1)]);
    broken.adapters.push(AdapterDescriptor {
        id: "usb".to_string(),
        adapter_type: "ledger".to_string(),
        priority: 2,
        timeout_ms: None,
        max_reconnect_attempts: None,
    });

    let err = AdapterSelector::new(broken, registry).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidConfig);
    assert!(err.to_string().contains("ledger"));
    assert_eq!(extension.enable_calls(), 0);
}

#[test]
fn test_empty_adapter_list_is_invalid() {
    let err = AdapterSelector::new(WalletConfig::default(), AdapterRegistry::new()).unwrap_err();
    assert!(matches!(err, WalletError::ConfigurationInvalid(_)));
}

#[tokio::test]
async fn test_selector_from_toml() {
    let config = parse_config(
        r#"
        [timeouts]
        operation_ms = 2000

        [[adapters]]
        id = "browser"
        adapter_type = "extension"
        priority = 1
        max_reconnect_attempts = 1

        [extension]
        providers = ["talisman", "polkadot-js"]
        "#,
    )
    .unwrap();

    let registry = AdapterRegistry::with_clients(ProviderClients {
        extensions: vec![
            Arc::new(SimulatedExtension::new("polkadot-js", &[ALICE])) as Arc<dyn ExtensionClient>,
            Arc::new(SimulatedExtension::new("talisman", &[ALICE])) as Arc<dyn ExtensionClient>,
        ],
        ..ProviderClients::default()
    });

    let adapter = AdapterSelector::new(config, registry)
        .unwrap()
        .connect()
        .await
        .unwrap();
    // Declared preference, not registration order.
    assert_eq!(adapter.get_provider().as_deref(), Some("talisman"));
}
