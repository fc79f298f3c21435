//! Wallet providers for wallet-glance.
//!
//! A provider is anything that can authorize this front-end, list the accounts it
//! exposes, report balances, and notify when its account list changes. The
//! connection manager only ever talks to providers through [`WalletProvider`].

pub mod factory;
pub mod http;
pub mod mock;

pub use factory::{create_fallback, create_wallet, WalletSource};
pub use http::{HttpProvider, HttpProviderConfig};
pub use mock::MockWallet;

use alloy_primitives::U256;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;

/// Trait for wallet providers.
///
/// Implementations must be thread-safe (Send + Sync) so the connection manager can
/// share them with background tasks.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Short description of the endpoint for logs and the header bar.
    fn describe(&self) -> String;

    /// Asks the wallet to authorize this front-end.
    ///
    /// Returns the authorized accounts, or `WalletError::Authorization` if the user
    /// or the wallet refused.
    async fn request_accounts(&self) -> Result<Vec<String>>;

    /// Returns the accounts currently authorized, in wallet order.
    async fn accounts(&self) -> Result<Vec<String>>;

    /// Returns the balance of `address` in the chain's smallest unit.
    async fn balance(&self, address: &str) -> Result<U256>;

    /// Subscribes to account-list changes.
    ///
    /// Each message is the full, ordered account list after the change. An empty
    /// list means the wallet disconnected.
    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<String>>;
}
