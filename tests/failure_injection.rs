//! Failure injection tests: hung, failing and racing providers.

use std::sync::Arc;
use std::time::Duration;

use wallet_bridge::adapters::WalletAdapter;
use wallet_bridge::clients::simulated::Behavior;
use wallet_bridge::clients::ProviderEvent;
use wallet_bridge::{ConnectionState, ErrorCode, WalletError, WalletEventKind};

mod common;

use common::ALICE;

#[tokio::test]
async fn test_disconnect_during_enable_does_not_resurrect() {
    let relay = Arc::new(
        common::simulated_relay(&[ALICE]).with_connect(Behavior::Delay(Duration::from_millis(100))),
    );
    let adapter = common::relay_adapter(relay.clone());

    let (result, _) = tokio::join!(adapter.enable(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        adapter.disconnect().await;
    });

    let err = result.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConnectionFailed);
    assert_eq!(adapter.state(), ConnectionState::Disabled);
    assert!(adapter.session().is_none());
    assert!(adapter.get_provider().is_none());
    // The late session was handed back to the relay.
    assert_eq!(relay.disconnect_calls(), 1);

    // The adapter is still usable afterwards.
    relay.set_connect(Behavior::Succeed);
    adapter.enable().await.unwrap();
    assert_eq!(adapter.state(), ConnectionState::Enabled);
}

#[tokio::test]
async fn test_disconnect_swallows_provider_errors() {
    let relay = Arc::new(
        common::simulated_relay(&[ALICE]).with_disconnect(Behavior::Fail("socket closed".to_string())),
    );
    let adapter = common::relay_adapter(relay.clone());
    let disconnected = common::record(&adapter, WalletEventKind::Disconnected);
    adapter.enable().await.unwrap();

    adapter.disconnect().await;
    assert_eq!(relay.disconnect_calls(), 1);
    assert_eq!(adapter.state(), ConnectionState::Disabled);
    assert!(adapter.session().is_none());
    assert_eq!(disconnected.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_disconnect_is_bounded() {
    let relay = Arc::new(common::simulated_relay(&[ALICE]).with_disconnect(Behavior::Hang));
    let adapter = common::relay_adapter(relay);
    adapter.enable().await.unwrap();

    let started = tokio::time::Instant::now();
    adapter.disconnect().await;
    assert!(started.elapsed() <= Duration::from_secs(10));
    assert_eq!(adapter.state(), ConnectionState::Disabled);
}

#[tokio::test]
async fn test_concurrent_enables_share_one_handshake() {
    let relay = Arc::new(
        common::simulated_relay(&[ALICE]).with_connect(Behavior::Delay(Duration::from_millis(50))),
    );
    let adapter = common::relay_adapter(relay.clone());

    let (a, b, c) = tokio::join!(adapter.enable(), adapter.enable(), adapter.enable());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(relay.connect_calls(), 1);
}

#[tokio::test]
async fn test_session_deleted_by_wallet_is_final() {
    let relay = Arc::new(common::simulated_relay(&[ALICE]));
    let adapter = common::relay_adapter(relay.clone());
    let disconnected = common::record(&adapter, WalletEventKind::Disconnected);
    adapter.enable().await.unwrap();

    relay.push(ProviderEvent::SessionDeleted);
    common::settle().await;

    assert_eq!(adapter.state(), ConnectionState::Disabled);
    assert_eq!(relay.connect_calls(), 1);
    assert_eq!(disconnected.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_explicit_disconnect_stops_reconnection() {
    let relay = Arc::new(common::simulated_relay(&[ALICE]));
    let adapter = common::relay_adapter(relay.clone());
    adapter.enable().await.unwrap();

    adapter.disconnect().await;
    relay.push(ProviderEvent::Disconnected);
    common::settle().await;

    assert_eq!(relay.connect_calls(), 1);
    assert_eq!(adapter.state(), ConnectionState::Disabled);
}

#[tokio::test]
async fn test_provider_failure_detail_is_preserved() {
    let relay = Arc::new(
        common::simulated_relay(&[ALICE]).with_connect(Behavior::Fail("relay returned 503".to_string())),
    );
    let adapter = common::relay_adapter(relay);

    match adapter.enable().await.unwrap_err() {
        WalletError::ConnectionFailed { detail, context } => {
            assert_eq!(detail, "relay returned 503");
            assert_eq!(context.unwrap().operation, "enable");
        }
        other => panic!("unexpected error: {other}"),
    }
}
