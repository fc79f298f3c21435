//! Wallet provider factory.
//!
//! Centralizes how the injected wallet and the read-only fallback are built from
//! configuration and command-line choices.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{validate_http_url, Config};
use crate::error::Result;
use crate::provider::{HttpProvider, HttpProviderConfig, MockWallet, WalletProvider};

/// Where the injected wallet comes from.
#[derive(Debug, Clone, Default)]
pub enum WalletSource {
    /// No wallet is installed.
    #[default]
    None,
    /// A JSON-RPC wallet endpoint.
    Http(String),
    /// An in-memory wallet.
    Mock(MockWallet),
}

impl WalletSource {
    /// Resolves the source from an optional CLI URL and the config file.
    ///
    /// The CLI URL takes precedence over `wallet.url`.
    pub fn resolve(cli_url: Option<&str>, config: &Config) -> Self {
        cli_url
            .map(str::to_string)
            .or_else(|| config.wallet.url.clone())
            .map(Self::Http)
            .unwrap_or_default()
    }
}

/// Creates the injected wallet provider, or `None` when no wallet is installed.
pub fn create_wallet(
    source: &WalletSource,
    config: &Config,
) -> Result<Option<Arc<dyn WalletProvider>>> {
    match source {
        WalletSource::None => Ok(None),
        WalletSource::Http(url) => {
            validate_http_url("wallet url", url)?;
            let provider_config = HttpProviderConfig::new(url.clone())
                .with_timeout(config.request_timeout_secs)
                .with_poll_interval(Duration::from_millis(config.wallet.poll_interval_ms));
            Ok(Some(Arc::new(HttpProvider::new(provider_config)?)))
        }
        WalletSource::Mock(wallet) => Ok(Some(Arc::new(wallet.clone()))),
    }
}

/// Creates the read-only fallback provider.
pub fn create_fallback(config: &Config) -> Result<Arc<dyn WalletProvider>> {
    validate_http_url("fallback.url", &config.fallback.url)?;
    let provider_config = HttpProviderConfig::new(config.fallback.url.clone())
        .with_timeout(config.request_timeout_secs);
    Ok(Arc::new(HttpProvider::new(provider_config)?))
}
