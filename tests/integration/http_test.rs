//! HTTP provider tests against a local JSON-RPC stub, plus optional tests
//! against a real node.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use pretty_assertions::assert_eq;
use wallet_glance::connection::{
    run_connect_sequence, ConnectOutcome, ConnectionEvent, ConnectionManager, InitOutcome,
};
use wallet_glance::provider::{HttpProvider, HttpProviderConfig, MockWallet, WalletProvider};

use super::rpc_stub::{RpcStub, StubState};

const ACCOUNT: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";

/// Half an ether, as a hex quantity.
const HALF_ETHER_HEX: &str = "0x6f05b59d3b20000";

fn provider(url: &str) -> Arc<dyn WalletProvider> {
    let config = HttpProviderConfig::new(url)
        .with_timeout(5)
        .with_poll_interval(Duration::from_millis(50));
    Arc::new(HttpProvider::new(config).unwrap())
}

fn manager_for(stub: &RpcStub) -> ConnectionManager {
    ConnectionManager::new(Some(provider(&stub.url)), Arc::new(MockWallet::new()))
}

#[tokio::test]
async fn test_connect_sequence_over_http() {
    let stub = RpcStub::start(StubState {
        accounts: vec![ACCOUNT.to_string()],
        balance: HALF_ETHER_HEX.to_string(),
        ..Default::default()
    })
    .await;
    let manager = manager_for(&stub);

    let report = run_connect_sequence(&manager).await;

    assert_eq!(report.outcome, ConnectOutcome::Connected);
    assert_eq!(report.account.as_deref(), Some(ACCOUNT));
    assert_eq!(report.balance, Some(U256::from(500_000_000_000_000_000u128)));
    assert_eq!(stub.calls("eth_requestAccounts"), 1);
    assert_eq!(stub.calls("eth_getBalance"), 1);
}

#[tokio::test]
async fn test_rejection_maps_to_authorization_denied() {
    let stub = RpcStub::start(StubState {
        accounts: vec![ACCOUNT.to_string()],
        deny: true,
        ..Default::default()
    })
    .await;
    let manager = manager_for(&stub);

    let outcome = manager.initialize().await;

    let InitOutcome::AuthorizationDenied(err) = outcome else {
        panic!("expected a denial, got {outcome:?}");
    };
    assert_eq!(err.category(), "Authorization Error");
    assert!(!manager.is_connected().await);
}

#[tokio::test]
async fn test_plain_node_falls_back_to_eth_accounts() {
    let stub = RpcStub::start(StubState {
        accounts: vec![ACCOUNT.to_string()],
        balance: "0x0".to_string(),
        plain_node: true,
        ..Default::default()
    })
    .await;
    let manager = manager_for(&stub);

    assert!(manager.initialize().await.is_connected());
    assert_eq!(manager.account().await.as_deref(), Some(ACCOUNT));
    assert_eq!(manager.balance(ACCOUNT).await.unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_account_poll_reports_changes() {
    let stub = RpcStub::start(StubState {
        accounts: vec![ACCOUNT.to_string()],
        balance: "0x0".to_string(),
        ..Default::default()
    })
    .await;
    let manager = manager_for(&stub);
    let mut events = manager.subscribe();
    manager.watch_accounts();

    // Let the first poll record the baseline
    tokio::time::sleep(Duration::from_millis(200)).await;
    stub.set_accounts(&[]);

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no account change within 2s")
        .unwrap();
    assert_eq!(event, ConnectionEvent::AccountsChanged(None));

    manager.shutdown();
}

#[tokio::test]
async fn test_unreachable_wallet_is_denied_not_fatal() {
    let manager = ConnectionManager::new(
        Some(provider("http://127.0.0.1:9")),
        Arc::new(MockWallet::new()),
    );

    let report = run_connect_sequence(&manager).await;

    assert_eq!(report.outcome, ConnectOutcome::AuthorizationDenied);
    assert_eq!(report.account, None);
}

/// Helper to get a real JSON-RPC endpoint from the environment.
fn get_test_rpc_url() -> Option<String> {
    std::env::var("WALLET_GLANCE_TEST_RPC").ok()
}

#[tokio::test]
async fn test_real_node_balance_lookup() {
    let Some(url) = get_test_rpc_url() else {
        eprintln!("Skipping test: WALLET_GLANCE_TEST_RPC not set");
        return;
    };

    let node = provider(&url);
    let balance = node.balance("0x0000000000000000000000000000000000000000").await;
    assert!(balance.is_ok(), "balance lookup failed: {balance:?}");
}
