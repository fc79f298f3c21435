//! Runs wallet work off the UI loop and routes results back through a channel.
//!
//! Every spawned task is tagged with the [`Generation`] current when it started,
//! so the view can drop results that arrive after a newer attempt began.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::app::{Action, App, Generation};
use super::browser::UrlOpener;
use super::AsyncMessage;
use crate::connection::{run_connect_sequence, ConnectionEvent, ConnectionManager};

/// Bridges the view state and the connection manager.
pub struct WalletController {
    manager: Arc<ConnectionManager>,
    opener: Arc<dyn UrlOpener>,
    install_url: String,
    tx: mpsc::Sender<AsyncMessage>,
}

impl WalletController {
    /// Creates a controller that reports results on `tx`.
    pub fn new(
        manager: Arc<ConnectionManager>,
        opener: Arc<dyn UrlOpener>,
        install_url: impl Into<String>,
        tx: mpsc::Sender<AsyncMessage>,
    ) -> Self {
        Self {
            manager,
            opener,
            install_url: install_url.into(),
            tx,
        }
    }

    /// Starts the initial connect sequence.
    pub fn mount(&self, app: &mut App) {
        let generation = app.begin_attempt();
        debug!("Mount connect {}", generation);
        self.spawn_connect(generation, true);
    }

    /// Performs an action requested by the view.
    pub fn dispatch(&self, action: Action, app: &mut App) {
        match action {
            Action::Connect => {
                let generation = app.begin_attempt();
                app.is_processing = true;
                debug!("User connect {}", generation);
                self.spawn_connect(generation, false);
            }
            Action::OpenInstallPage => {
                info!("Opening install page {}", self.install_url);
                if let Err(e) = self.opener.open(&self.install_url) {
                    error!("{}", e);
                }
            }
            Action::Quit | Action::None => {}
        }
    }

    /// Applies a connection notification and fetches the new account's balance.
    pub fn on_connection_event(&self, event: ConnectionEvent, app: &mut App) {
        match event {
            ConnectionEvent::AccountsChanged(account) => {
                let generation = app.begin_attempt();
                if let Some(address) = app.apply_account_change(generation, account) {
                    self.spawn_balance(generation, address);
                }
            }
        }
    }

    /// Applies a finished background task to the view.
    pub fn handle_message(&self, msg: AsyncMessage, app: &mut App) {
        match msg {
            AsyncMessage::ConnectFinished {
                generation,
                report,
                mount,
            } => {
                app.apply_connect(generation, report, mount);
            }
            AsyncMessage::BalanceFetched {
                generation,
                balance,
            } => {
                app.apply_balance(generation, balance);
            }
        }
    }

    fn spawn_connect(&self, generation: Generation, mount: bool) {
        let manager = Arc::clone(&self.manager);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let report = run_connect_sequence(&manager).await;
            let msg = AsyncMessage::ConnectFinished {
                generation,
                report,
                mount,
            };
            if tx.send(msg).await.is_err() {
                debug!("View closed before connect {} finished", generation);
            }
        });
    }

    fn spawn_balance(&self, generation: Generation, address: String) {
        let manager = Arc::clone(&self.manager);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match manager.balance(&address).await {
                Ok(balance) => {
                    let msg = AsyncMessage::BalanceFetched {
                        generation,
                        balance,
                    };
                    if tx.send(msg).await.is_err() {
                        debug!("View closed before balance {} arrived", generation);
                    }
                }
                Err(e) => error!("잔액 조회 실패: {}", e),
            }
        });
    }
}
