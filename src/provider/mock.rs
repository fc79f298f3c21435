//! Mock wallet for testing and demos.
//!
//! Keeps accounts and balances in memory and lets tests drive authorization
//! failures, query failures, slow balance lookups and account changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{Result, WalletError};
use crate::provider::WalletProvider;

/// Capacity of the account-change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct MockState {
    accounts: Vec<String>,
    balances: HashMap<String, U256>,
    authorized: bool,
    deny_reason: Option<String>,
    fail_queries: bool,
    balance_delay: Option<Duration>,
    authorization_requests: usize,
}

/// In-memory wallet that behaves like an injected browser wallet.
///
/// Accounts are hidden until [`WalletProvider::request_accounts`] succeeds, the same
/// way a real wallet answers `eth_accounts` with an empty list before the user
/// connects. Clones share state.
#[derive(Debug, Clone)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
    changes: broadcast::Sender<Vec<String>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    /// Creates a wallet with no accounts.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            changes,
        }
    }

    /// Adds an account.
    pub fn with_account(self, address: impl Into<String>) -> Self {
        self.lock().accounts.push(address.into());
        self
    }

    /// Sets the balance of an address. Lookups ignore case.
    pub fn with_balance(self, address: &str, wei: U256) -> Self {
        self.lock().balances.insert(address.to_lowercase(), wei);
        self
    }

    /// Makes every authorization request fail with `reason`.
    pub fn denying_authorization(self, reason: impl Into<String>) -> Self {
        self.lock().deny_reason = Some(reason.into());
        self
    }

    /// Makes every account and balance query fail.
    pub fn failing_queries(self) -> Self {
        self.lock().fail_queries = true;
        self
    }

    /// Treats the front-end as already authorized.
    pub fn pre_authorized(self) -> Self {
        self.lock().authorized = true;
        self
    }

    /// Delays every balance lookup.
    pub fn with_balance_delay(self, delay: Duration) -> Self {
        self.lock().balance_delay = Some(delay);
        self
    }

    /// Replaces the account list and notifies subscribers, like a user switching
    /// or disconnecting accounts in the wallet.
    pub fn set_accounts(&self, accounts: Vec<String>) {
        self.lock().accounts = accounts.clone();
        let _ = self.changes.send(accounts);
    }

    /// Makes later authorization requests fail with `reason`, like a user
    /// rejecting a second prompt.
    pub fn deny_authorization(&self, reason: impl Into<String>) {
        self.lock().deny_reason = Some(reason.into());
    }

    /// Updates a balance after construction.
    pub fn set_balance(&self, address: &str, wei: U256) {
        self.lock().balances.insert(address.to_lowercase(), wei);
    }

    /// Number of authorization requests received so far.
    pub fn authorization_requests(&self) -> usize {
        self.lock().authorization_requests
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means a test panicked mid-update
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn describe(&self) -> String {
        "mock wallet".to_string()
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.authorization_requests += 1;

        if let Some(reason) = &state.deny_reason {
            return Err(WalletError::authorization(reason.clone()));
        }

        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        let state = self.lock();
        if state.fail_queries {
            return Err(WalletError::query("mock wallet is configured to fail queries"));
        }
        if !state.authorized {
            return Ok(Vec::new());
        }
        Ok(state.accounts.clone())
    }

    async fn balance(&self, address: &str) -> Result<U256> {
        let (delay, result) = {
            let state = self.lock();
            let result = if state.fail_queries {
                Err(WalletError::query("mock wallet is configured to fail queries"))
            } else {
                Ok(state
                    .balances
                    .get(&address.to_lowercase())
                    .copied()
                    .unwrap_or(U256::ZERO))
            };
            (state.balance_delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<String>> {
        self.changes.subscribe()
    }
}
