//! Command-line argument parsing for wallet-glance.

use crate::config::Config;
use crate::error::{Result, WalletError};
use crate::provider::{MockWallet, WalletSource};
use alloy_primitives::U256;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output of the final screen.
    #[default]
    Text,
    /// JSON output with screen, state, and metadata.
    Json,
    /// Frame-by-frame output showing state after each event.
    Frames,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "frames" => Ok(Self::Frames),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text, json, or frames"
            )),
        }
    }
}

/// Shows the connected wallet account and its balance.
#[derive(Parser, Debug)]
#[command(name = "wallet-glance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint of the wallet (overrides wallet.url in the config file)
    #[arg(short = 'w', long, value_name = "URL", env = "WALLET_GLANCE_WALLET_URL")]
    pub wallet_url: Option<String>,

    /// Behave as if no wallet is installed, even if one is configured
    #[arg(long, conflicts_with = "mock_wallet")]
    pub no_wallet: bool,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // === Mock wallet options ===
    /// Use an in-memory wallet instead of a real endpoint
    #[arg(long)]
    pub mock_wallet: bool,

    /// Account exposed by the mock wallet (repeatable)
    #[arg(long = "mock-account", value_name = "ADDRESS", requires = "mock_wallet")]
    pub mock_accounts: Vec<String>,

    /// Balance of every mock account, in the smallest unit
    #[arg(long, value_name = "WEI", requires = "mock_wallet")]
    pub mock_balance: Option<String>,

    /// Make the mock wallet refuse authorization
    #[arg(long, requires = "mock_wallet")]
    pub mock_deny: bool,

    /// Use an in-memory read-only node instead of the configured fallback URL
    #[arg(long)]
    pub mock_fallback: bool,

    // === Headless mode options ===
    /// Run in headless mode (no terminal UI, for testing/automation)
    #[arg(long)]
    pub headless: bool,

    /// Comma-separated events to execute in headless mode (e.g., "wait:200ms,key:enter")
    #[arg(long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Path to script file with events (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Screen size for headless mode (WIDTHxHEIGHT, e.g., "80x24")
    #[arg(long, value_name = "SIZE", default_value = "80x24")]
    pub size: String,

    /// Output format for headless mode
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Stop on first assertion failure
    #[arg(long)]
    pub fail_fast: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns true if headless mode is enabled.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Decides where the wallet comes from.
    ///
    /// Precedence: --no-wallet, --mock-wallet, --wallet-url, then `wallet.url`.
    pub fn wallet_source(&self, config: &Config) -> Result<WalletSource> {
        if self.no_wallet {
            return Ok(WalletSource::None);
        }
        if self.mock_wallet {
            return self.mock_wallet().map(WalletSource::Mock);
        }
        Ok(WalletSource::resolve(self.wallet_url.as_deref(), config))
    }

    /// Builds the in-memory wallet described by the --mock-* flags.
    fn mock_wallet(&self) -> Result<MockWallet> {
        let balance = self
            .mock_balance
            .as_deref()
            .map(|wei| {
                U256::from_str(wei).map_err(|e| {
                    WalletError::config(format!("Invalid --mock-balance '{wei}': {e}"))
                })
            })
            .transpose()?;

        let mut wallet = MockWallet::new();
        for account in &self.mock_accounts {
            wallet = wallet.with_account(account.clone());
            if let Some(balance) = balance {
                wallet = wallet.with_balance(account, balance);
            }
        }
        if self.mock_deny {
            wallet = wallet.denying_authorization("User rejected the request.");
        }
        Ok(wallet)
    }

    /// Parses the screen size from the --size argument.
    /// Returns (width, height) or an error.
    pub fn parse_screen_size(&self) -> std::result::Result<(u16, u16), String> {
        let Some((width, height)) = self.size.split_once('x') else {
            return Err(format!(
                "Invalid size format: '{}'. Expected WIDTHxHEIGHT (e.g., 80x24)",
                self.size
            ));
        };
        let width = width
            .parse::<u16>()
            .map_err(|_| format!("Invalid width: '{}'", width))?;
        let height = height
            .parse::<u16>()
            .map_err(|_| format!("Invalid height: '{}'", height))?;
        Ok((width, height))
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Validates headless mode arguments.
    /// Returns an error message if validation fails.
    pub fn validate_headless(&self) -> std::result::Result<(), String> {
        if !self.headless {
            return Ok(());
        }

        if self.events.is_none() && self.script.is_none() {
            return Err("--headless requires --events or --script".to_string());
        }

        self.parse_screen_size()?;
        self.parse_output_format()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_wallet_url() {
        let cli = parse_args(&["wallet-glance", "--wallet-url", "http://127.0.0.1:8545"]);
        assert_eq!(cli.wallet_url.as_deref(), Some("http://127.0.0.1:8545"));

        let cli = parse_args(&["wallet-glance", "-w", "http://127.0.0.1:8545"]);
        assert_eq!(cli.wallet_url.as_deref(), Some("http://127.0.0.1:8545"));
    }

    #[test]
    fn test_parse_config_path() {
        let cli = parse_args(&["wallet-glance", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config_path(), PathBuf::from("/path/to/config.toml"));
    }

    #[test]
    fn test_wallet_source_prefers_cli_url() {
        let mut config = Config::default();
        config.wallet.url = Some("http://config:8545".to_string());

        let cli = parse_args(&["wallet-glance", "--wallet-url", "http://cli:8545"]);
        match cli.wallet_source(&config).unwrap() {
            WalletSource::Http(url) => assert_eq!(url, "http://cli:8545"),
            other => panic!("unexpected source: {other:?}"),
        }

        let cli = parse_args(&["wallet-glance", "--no-wallet"]);
        assert!(matches!(
            cli.wallet_source(&config).unwrap(),
            WalletSource::None
        ));
    }

    #[tokio::test]
    async fn test_mock_wallet_flags() {
        use crate::provider::WalletProvider;

        let cli = parse_args(&[
            "wallet-glance",
            "--mock-wallet",
            "--mock-account",
            "0xabc",
            "--mock-account",
            "0xdef",
            "--mock-balance",
            "1500000000000000000",
        ]);
        let WalletSource::Mock(wallet) = cli.wallet_source(&Config::default()).unwrap() else {
            panic!("expected a mock wallet");
        };

        assert_eq!(wallet.request_accounts().await.unwrap(), vec!["0xabc", "0xdef"]);
        assert_eq!(
            wallet.balance("0xdef").await.unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
    }

    #[tokio::test]
    async fn test_mock_deny_flag() {
        use crate::provider::WalletProvider;

        let cli = parse_args(&["wallet-glance", "--mock-wallet", "--mock-deny"]);
        let WalletSource::Mock(wallet) = cli.wallet_source(&Config::default()).unwrap() else {
            panic!("expected a mock wallet");
        };
        assert!(wallet.request_accounts().await.is_err());
    }

    #[test]
    fn test_invalid_mock_balance() {
        let cli = parse_args(&["wallet-glance", "--mock-wallet", "--mock-balance", "lots"]);
        let err = cli.wallet_source(&Config::default()).unwrap_err();
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_mock_flags_require_mock_wallet() {
        assert!(Cli::try_parse_from(["wallet-glance", "--mock-account", "0xabc"]).is_err());
        assert!(Cli::try_parse_from(["wallet-glance", "--mock-wallet", "--no-wallet"]).is_err());
    }

    // === Headless mode tests ===

    #[test]
    fn test_parse_headless_flag() {
        let cli = parse_args(&["wallet-glance", "--headless", "--mock-wallet", "--events", "key:q"]);
        assert!(cli.is_headless());
        assert!(cli.mock_wallet);
        assert_eq!(cli.events, Some("key:q".to_string()));
    }

    #[test]
    fn test_parse_screen_size() {
        let cli = parse_args(&["wallet-glance", "--size", "120x40"]);
        assert_eq!(cli.parse_screen_size().unwrap(), (120, 40));

        let cli = parse_args(&["wallet-glance", "--size", "invalid"]);
        assert!(cli.parse_screen_size().is_err());
    }

    #[test]
    fn test_parse_output_format() {
        let cli = parse_args(&["wallet-glance", "--output", "json"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Json);

        let cli = parse_args(&["wallet-glance", "--output", "frames"]);
        assert_eq!(cli.parse_output_format().unwrap(), OutputFormat::Frames);

        let cli = parse_args(&["wallet-glance", "--output", "yaml"]);
        assert!(cli.parse_output_format().is_err());
    }

    #[test]
    fn test_validate_headless_requires_events_or_script() {
        let cli = parse_args(&["wallet-glance", "--headless"]);
        let err = cli.validate_headless().unwrap_err();
        assert!(err.contains("requires --events or --script"));

        let cli = parse_args(&["wallet-glance", "--headless", "--script", "-"]);
        assert!(cli.validate_headless().is_ok());
    }

    #[test]
    fn test_headless_output_options() {
        let cli = parse_args(&[
            "wallet-glance",
            "--headless",
            "--events",
            "key:q",
            "--output-file",
            "result.json",
            "--fail-fast",
        ]);
        assert_eq!(cli.output_file, Some(PathBuf::from("result.json")));
        assert!(cli.fail_fast);
    }
}
