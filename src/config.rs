//! Configuration management for wallet-glance.
//!
//! Handles loading configuration from TOML files, with settings for the wallet
//! endpoint, the read-only fallback node, and how balances are displayed.

use crate::error::{Result, WalletError};
use crate::units::MAX_DECIMALS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Hosted mainnet node used for read-only queries when no wallet is present.
pub const DEFAULT_FALLBACK_URL: &str =
    "https://mainnet.infura.io/v3/d8d4d7b789ad4444ac1b72ab6d145259";

/// Page opened when the user asks to connect but no wallet is installed.
pub const DEFAULT_INSTALL_URL: &str = "https://metamask.io/download.html";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Wallet endpoint settings.
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Read-only fallback node settings.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Native currency display settings.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Wallet install page.
    #[serde(default = "default_install_url")]
    pub install_url: String,

    /// Timeout for each JSON-RPC request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Wallet endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of the wallet. When unset, no wallet is available.
    pub url: Option<String>,

    /// How often the wallet is polled for account changes, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Fallback node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// JSON-RPC endpoint of the read-only node.
    #[serde(default = "default_fallback_url")]
    pub url: String,
}

/// Native currency display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Currency symbol shown next to the balance.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Number of decimals between the smallest unit and the display unit.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_install_url() -> String {
    DEFAULT_INSTALL_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_fallback_url() -> String {
    DEFAULT_FALLBACK_URL.to_string()
}

fn default_symbol() -> String {
    "ETH".to_string()
}

fn default_decimals() -> u8 {
    crate::units::ETHER_DECIMALS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallet: WalletConfig::default(),
            fallback: FallbackConfig::default(),
            chain: ChainConfig::default(),
            install_url: default_install_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            url: None,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            url: default_fallback_url(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimals: default_decimals(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wallet-glance")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| WalletError::config(format!("Failed to read config file: {e}")))?;

        let config = Self::parse_toml(&content, path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            WalletError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Checks that every configured URL is an http(s) URL and that durations and
    /// decimals are in range.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.wallet.url {
            validate_http_url("wallet.url", url)?;
        }
        validate_http_url("fallback.url", &self.fallback.url)?;
        validate_http_url("install_url", &self.install_url)?;
        if self.request_timeout_secs == 0 {
            return Err(WalletError::config("request_timeout_secs must be positive"));
        }
        if self.wallet.poll_interval_ms == 0 {
            return Err(WalletError::config("wallet.poll_interval_ms must be positive"));
        }
        if self.chain.decimals > MAX_DECIMALS {
            return Err(WalletError::config(format!(
                "chain.decimals must be at most {MAX_DECIMALS}, got {}",
                self.chain.decimals
            )));
        }
        Ok(())
    }
}

/// Parses `value` and rejects anything but http and https.
pub fn validate_http_url(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| WalletError::config(format!("Invalid {field} '{value}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(WalletError::config(format!(
            "Invalid scheme '{other}' for {field}. Expected 'http' or 'https'"
        ))),
    }
}
