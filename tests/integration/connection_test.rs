//! End-to-end connection scenarios against the in-memory wallet.
//!
//! Each test drives the view state through the controller the same way the
//! terminal loop does, then checks what the user would see.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use pretty_assertions::assert_eq;
use tokio::sync::{broadcast, mpsc};
use wallet_glance::config::{ChainConfig, DEFAULT_INSTALL_URL};
use wallet_glance::connection::{ConnectOutcome, ConnectionEvent, ConnectionManager};
use wallet_glance::provider::{MockWallet, WalletProvider};
use wallet_glance::tui::app::{Action, App, ConnectButton, Screen};
use wallet_glance::tui::browser::RecordingOpener;
use wallet_glance::tui::{AsyncMessage, WalletController};

const ACCOUNT: &str = "0xABC0000000000000000000000000000000000001";

struct Session {
    app: App,
    manager: Arc<ConnectionManager>,
    controller: WalletController,
    rx: mpsc::Receiver<AsyncMessage>,
    events: broadcast::Receiver<ConnectionEvent>,
    opener: RecordingOpener,
}

impl Session {
    fn new(wallet: Option<MockWallet>) -> Self {
        let injected = wallet.map(|w| Arc::new(w) as Arc<dyn WalletProvider>);
        let manager = Arc::new(ConnectionManager::new(injected, Arc::new(MockWallet::new())));
        let opener = RecordingOpener::new();
        let (tx, rx) = mpsc::channel(16);
        let controller = WalletController::new(
            Arc::clone(&manager),
            Arc::new(opener.clone()),
            DEFAULT_INSTALL_URL,
            tx,
        );
        let app = App::new(
            manager.has_injected_provider(),
            manager.describe(),
            &ChainConfig::default(),
        );
        let events = manager.subscribe();
        manager.watch_accounts();

        Self {
            app,
            manager,
            controller,
            rx,
            events,
            opener,
        }
    }

    /// Mounts the view and waits for the initial sequence to land.
    async fn mount(&mut self) {
        self.controller.mount(&mut self.app);
        self.next_message().await;
    }

    async fn next_message(&mut self) {
        let msg = tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("no background result within 1s")
            .expect("result channel closed");
        self.controller.handle_message(msg, &mut self.app);
    }

    async fn next_connection_event(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(1), self.events.recv())
            .await
            .expect("no connection event within 1s")
            .expect("connection events closed");
        self.controller.on_connection_event(event, &mut self.app);
    }
}

#[tokio::test]
async fn test_no_provider_offers_install_and_opens_page() {
    let mut session = Session::new(None);
    assert!(!session.manager.initialize().await.is_connected());

    session.mount().await;
    assert_eq!(session.app.screen(), Screen::Disconnected(ConnectButton::Install));
    assert_eq!(session.app.last_outcome, Some(ConnectOutcome::NoProvider));

    let action = session.app.handle_event(wallet_glance::tui::Event::Key(
        crossterm::event::KeyEvent::from(crossterm::event::KeyCode::Enter),
    ));
    assert_eq!(action, Action::OpenInstallPage);
    session.controller.dispatch(action, &mut session.app);

    assert_eq!(session.opener.opened(), vec![DEFAULT_INSTALL_URL]);
    assert_eq!(session.app.account, None);
    assert_eq!(session.app.balance, "0");
}

#[tokio::test]
async fn test_authorized_wallet_shows_account_and_half_ether() {
    let wallet = MockWallet::new()
        .with_account(ACCOUNT)
        .with_balance(ACCOUNT, U256::from(500_000_000_000_000_000u128));
    let mut session = Session::new(Some(wallet));
    assert!(session.app.loading);

    session.mount().await;

    assert!(!session.app.loading);
    assert_eq!(
        session.app.screen(),
        Screen::Connected {
            account: ACCOUNT,
            balance: "0.5"
        }
    );
}

#[tokio::test]
async fn test_empty_account_list_resets_balance() {
    let wallet = MockWallet::new()
        .with_account(ACCOUNT)
        .with_balance(ACCOUNT, U256::from(7_000_000_000_000_000_000u128));
    let mut session = Session::new(Some(wallet.clone()));
    session.mount().await;
    assert_eq!(session.app.balance, "7");

    wallet.set_accounts(Vec::new());
    session.next_connection_event().await;

    assert_eq!(session.app.account, None);
    assert_eq!(session.app.balance, "0");
    assert_eq!(session.app.screen(), Screen::Disconnected(ConnectButton::Connect));
}

#[tokio::test]
async fn test_switched_account_gets_its_own_balance() {
    let other = "0xdef0000000000000000000000000000000000002";
    let wallet = MockWallet::new()
        .with_account(ACCOUNT)
        .with_balance(ACCOUNT, U256::from(1_000_000_000_000_000_000u128))
        .with_balance(other, U256::from(250_000_000_000_000_000u128));
    let mut session = Session::new(Some(wallet.clone()));
    session.mount().await;

    wallet.set_accounts(vec![other.to_string()]);
    session.next_connection_event().await;
    session.next_message().await;

    assert_eq!(session.app.account.as_deref(), Some(other));
    assert_eq!(session.app.balance, "0.25");
}

#[tokio::test]
async fn test_denied_authorization_still_finishes_loading() {
    let wallet = MockWallet::new()
        .with_account(ACCOUNT)
        .denying_authorization("User rejected the request.");
    let mut session = Session::new(Some(wallet));

    session.mount().await;

    assert!(!session.app.loading);
    assert_eq!(session.app.account, None);
    assert_eq!(session.app.last_outcome, Some(ConnectOutcome::AuthorizationDenied));
    assert!(!session.manager.is_connected().await);
}

#[tokio::test]
async fn test_user_connect_reruns_sequence_without_loading() {
    let wallet = MockWallet::new();
    let mut session = Session::new(Some(wallet.clone()));
    session.mount().await;
    assert_eq!(session.app.screen(), Screen::Disconnected(ConnectButton::Connect));

    session.controller.dispatch(Action::Connect, &mut session.app);
    assert!(session.app.is_processing);
    assert!(!session.app.loading);

    session.next_message().await;
    assert!(!session.app.is_processing);
    assert!(!session.app.loading);
    assert_eq!(session.app.last_outcome, Some(ConnectOutcome::Connected));
    assert_eq!(wallet.authorization_requests(), 2);
}

#[tokio::test]
async fn test_slow_mount_balance_loses_to_account_change() {
    let other = "0xdef0000000000000000000000000000000000002";
    let wallet = MockWallet::new()
        .with_account(ACCOUNT)
        .with_balance(ACCOUNT, U256::from(9_000_000_000_000_000_000u128))
        .with_balance(other, U256::from(3_000_000_000_000_000_000u128))
        .with_balance_delay(Duration::from_millis(150));
    let mut session = Session::new(Some(wallet.clone()));

    session.controller.mount(&mut session.app);
    tokio::time::sleep(Duration::from_millis(20)).await;
    wallet.set_accounts(vec![other.to_string()]);
    session.next_connection_event().await;

    // Both the mount result and the newer balance arrive; only the newer one sticks
    session.next_message().await;
    session.next_message().await;

    assert!(!session.app.loading);
    assert_eq!(session.app.account.as_deref(), Some(other));
    assert_eq!(session.app.balance, "3");
}

#[test]
fn test_initialize_twice_without_runtime_helpers() {
    let wallet = MockWallet::new().with_account(ACCOUNT);
    let manager = ConnectionManager::new(
        Some(Arc::new(wallet.clone()) as Arc<dyn WalletProvider>),
        Arc::new(MockWallet::new()),
    );

    let first = tokio_test::block_on(manager.initialize());
    let second = tokio_test::block_on(manager.initialize());

    assert_eq!(first, second);
    assert_eq!(wallet.authorization_requests(), 2);
    let account = tokio_test::block_on(manager.try_account());
    assert_eq!(tokio_test::assert_ok!(account).as_deref(), Some(ACCOUNT));
}
