//! Connection manager for the wallet client handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::U256;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Result, WalletError};
use crate::provider::{create_fallback, create_wallet, WalletProvider, WalletSource};

/// Capacity of the view notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Which provider the client handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// The injected wallet, after it authorized us.
    Injected,
    /// The read-only fallback node.
    Fallback,
}

/// Result of [`ConnectionManager::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The injected wallet authorized us.
    Connected,
    /// No wallet is installed; bound to the fallback node.
    ReadOnly,
    /// The wallet refused (or failed) to authorize us. No client handle is bound.
    AuthorizationDenied(WalletError),
}

impl InitOutcome {
    /// True only when a wallet is connected and authorized.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Typed notification fanned out to views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The wallet's account list changed; carries the new first account, if any.
    AccountsChanged(Option<String>),
}

/// The active client handle.
struct ActiveClient {
    provider: Arc<dyn WalletProvider>,
    kind: ClientKind,
}

/// Owns the client handle and the wallet's account-change subscription.
pub struct ConnectionManager {
    injected: Option<Arc<dyn WalletProvider>>,
    fallback: Arc<dyn WalletProvider>,
    active: RwLock<Option<ActiveClient>>,
    events: broadcast::Sender<ConnectionEvent>,
    watching: AtomicBool,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Creates a manager for an optional injected wallet and a fallback node.
    ///
    /// No client handle is bound until [`initialize`](Self::initialize) runs.
    pub fn new(
        injected: Option<Arc<dyn WalletProvider>>,
        fallback: Arc<dyn WalletProvider>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            injected,
            fallback,
            active: RwLock::new(None),
            events,
            watching: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds the providers described by `source` and `config`.
    pub fn from_config(source: &WalletSource, config: &Config) -> Result<Self> {
        let injected = create_wallet(source, config)?;
        let fallback = create_fallback(config)?;
        Ok(Self::new(injected, fallback))
    }

    /// Returns true if a wallet is installed.
    pub fn has_injected_provider(&self) -> bool {
        self.injected.is_some()
    }

    /// Describes the injected wallet, or the fallback node when there is none.
    pub fn describe(&self) -> String {
        match &self.injected {
            Some(provider) => provider.describe(),
            None => self.fallback.describe(),
        }
    }

    /// Returns which provider the client handle is bound to, if any.
    pub async fn client_kind(&self) -> Option<ClientKind> {
        self.active.read().await.as_ref().map(|c| c.kind)
    }

    /// Check if there's a bound client handle.
    pub async fn is_connected(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Binds the client handle, replacing any previous one.
    ///
    /// With a wallet installed this asks it for authorization. A denial leaves the
    /// handle as it was. Without one the
    /// handle is bound to the fallback node and the outcome is
    /// [`InitOutcome::ReadOnly`]. Never returns an error; failures are part of the
    /// outcome.
    pub async fn initialize(&self) -> InitOutcome {
        let Some(provider) = &self.injected else {
            *self.active.write().await = Some(ActiveClient {
                provider: Arc::clone(&self.fallback),
                kind: ClientKind::Fallback,
            });
            info!("{}로 연결됨 (읽기 전용)", self.fallback.describe());
            return InitOutcome::ReadOnly;
        };

        match provider.request_accounts().await {
            Ok(_) => {
                *self.active.write().await = Some(ActiveClient {
                    provider: Arc::clone(provider),
                    kind: ClientKind::Injected,
                });
                info!("지갑 연결 성공! ({})", provider.describe());
                InitOutcome::Connected
            }
            // A handle bound by an earlier call stays usable
            Err(e) => {
                error!("지갑 연결 거부됨: {}", e);
                InitOutcome::AuthorizationDenied(e)
            }
        }
    }

    /// Returns the first authorized account, or `None` when there is no client
    /// handle or the account list is empty.
    pub async fn try_account(&self) -> Result<Option<String>> {
        let provider = match self.active.read().await.as_ref() {
            Some(client) => Arc::clone(&client.provider),
            None => return Ok(None),
        };

        let accounts = provider.accounts().await?;
        Ok(accounts.into_iter().next())
    }

    /// Like [`try_account`](Self::try_account), but logs failures and reports them
    /// as `None`.
    pub async fn account(&self) -> Option<String> {
        match self.try_account().await {
            Ok(account) => account,
            Err(e) => {
                error!("계정 정보 조회 실패: {}", e);
                None
            }
        }
    }

    /// Returns the balance of `address` in the smallest unit.
    pub async fn balance(&self, address: &str) -> Result<U256> {
        let provider = match self.active.read().await.as_ref() {
            Some(client) => Arc::clone(&client.provider),
            None => return Err(WalletError::query("No client handle is bound")),
        };

        provider.balance(address).await
    }

    /// Subscribes to typed connection notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Opens the single subscription to the wallet's account changes.
    ///
    /// Every change is logged and re-broadcast as
    /// [`ConnectionEvent::AccountsChanged`]. Does nothing without a wallet or if the
    /// subscription is already open. Must be called from within a tokio runtime.
    pub fn watch_accounts(&self) -> Option<JoinHandle<()>> {
        let provider = self.injected.as_ref()?;
        if self.watching.swap(true, Ordering::SeqCst) {
            return None;
        }

        let mut changes = provider.subscribe_accounts();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();

        Some(tokio::spawn(async move {
            loop {
                let accounts = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = changes.recv() => received,
                };

                match accounts {
                    Ok(accounts) => {
                        let first = accounts.into_iter().next();
                        match &first {
                            None => info!("월렛 연결이 해제되었습니다."),
                            Some(account) => info!("연결된 계정: {}", account),
                        }
                        let _ = events.send(ConnectionEvent::AccountsChanged(first));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {} account change notifications", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Account change subscription closed");
        }))
    }

    /// Start-up behavior: fires one background [`initialize`](Self::initialize)
    /// and opens the account-change subscription.
    pub fn start(self: &Arc<Self>) -> JoinHandle<InitOutcome> {
        self.watch_accounts();
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.initialize().await })
    }

    /// Stops the account-change subscription.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
