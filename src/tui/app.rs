//! Application state for the TUI.
//!
//! Holds the view state (loading flag, account, balance) and decides which
//! results may touch it. Every connect attempt and account change takes a new
//! [`Generation`]; results tagged with an older one are dropped.

use alloy_primitives::U256;
use crossterm::event::{KeyCode, KeyModifiers};
use tracing::{debug, warn};

use super::widgets::spinner::Spinner;
use super::Event;
use crate::config::ChainConfig;
use crate::connection::{ConnectOutcome, ConnectReport};
use crate::units::{format_units, ZERO_BALANCE};

/// Sequence number of a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Returns the inner u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do.
    None,
    /// Run the connect sequence.
    Connect,
    /// Open the wallet install page.
    OpenInstallPage,
    /// Leave the application.
    Quit,
}

/// The button shown when no account is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectButton {
    /// A wallet is installed; pressing connects to it.
    Connect,
    /// No wallet; pressing opens the install page.
    Install,
}

impl ConnectButton {
    /// Button text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connect => "Connect wallet",
            Self::Install => "Install MetaMask",
        }
    }

    /// Short name used by headless state output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Install => "install",
        }
    }
}

/// What the screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen<'a> {
    /// Initial connection attempt in progress.
    Loading,
    /// An account is connected.
    Connected { account: &'a str, balance: &'a str },
    /// No account; offer the button.
    Disconnected(ConnectButton),
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// True only while the initial connect sequence runs.
    pub loading: bool,
    /// Connected account.
    pub account: Option<String>,
    /// Balance of `account` in display units.
    pub balance: String,
    /// Whether a user-initiated connect is in flight.
    pub is_processing: bool,
    /// Whether a wallet is installed.
    pub has_provider: bool,
    /// Wallet (or fallback node) description for the header.
    pub provider_info: String,
    /// Currency symbol shown next to the balance.
    pub symbol: String,
    /// How the latest applied connect sequence ended.
    pub last_outcome: Option<ConnectOutcome>,
    /// Loading indicator.
    pub spinner: Spinner,
    /// Indicator for a user-initiated connect.
    pub progress: Spinner,
    decimals: u8,
    generation: Generation,
}

impl App {
    /// Creates the initial state: loading, no account, zero balance.
    pub fn new(has_provider: bool, provider_info: impl Into<String>, chain: &ChainConfig) -> Self {
        Self {
            running: true,
            loading: true,
            account: None,
            balance: ZERO_BALANCE.to_string(),
            is_processing: false,
            has_provider,
            provider_info: provider_info.into(),
            symbol: chain.symbol.clone(),
            last_outcome: None,
            spinner: Spinner::loading(),
            progress: Spinner::connecting(),
            decimals: chain.decimals,
            generation: Generation::default(),
        }
    }

    /// The latest generation handed out.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Starts a new attempt; every earlier generation becomes stale.
    pub fn begin_attempt(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Returns true if `generation` is the latest one.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Returns what the screen should show.
    pub fn screen(&self) -> Screen<'_> {
        if self.loading {
            return Screen::Loading;
        }
        match &self.account {
            Some(account) => Screen::Connected {
                account,
                balance: &self.balance,
            },
            None => Screen::Disconnected(self.button()),
        }
    }

    /// The button label that applies when no account is shown.
    pub fn button(&self) -> ConnectButton {
        if self.has_provider {
            ConnectButton::Connect
        } else {
            ConnectButton::Install
        }
    }

    /// Handles a terminal event and returns the action it requests.
    pub fn handle_event(&mut self, event: Event) -> Action {
        let Event::Key(key) = event else {
            return Action::None;
        };

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit(),
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('c') => self.press_button(),
            _ => Action::None,
        }
    }

    fn quit(&mut self) -> Action {
        self.running = false;
        Action::Quit
    }

    /// Presses the connect/install button if it is on screen.
    fn press_button(&mut self) -> Action {
        match self.screen() {
            Screen::Disconnected(ConnectButton::Connect) if !self.is_processing => {
                Action::Connect
            }
            Screen::Disconnected(ConnectButton::Install) => Action::OpenInstallPage,
            _ => Action::None,
        }
    }

    /// Applies the result of a connect sequence.
    ///
    /// A mount result always ends loading, even when its other results are stale.
    /// Returns false if the result was stale.
    pub fn apply_connect(&mut self, generation: Generation, report: ConnectReport, mount: bool) -> bool {
        if mount {
            self.loading = false;
        }
        if !self.is_current(generation) {
            debug!("Discarding stale connect result {} (latest {})", generation, self.generation);
            return false;
        }

        self.is_processing = false;
        self.last_outcome = Some(report.outcome);
        self.set_account(report.account);
        if let Some(balance) = report.balance.filter(|_| self.account.is_some()) {
            self.balance = self.format_balance(balance);
        }
        true
    }

    /// Applies an account-change notification.
    ///
    /// Returns the account whose balance must now be fetched, if any.
    pub fn apply_account_change(&mut self, generation: Generation, account: Option<String>) -> Option<String> {
        if !self.is_current(generation) {
            debug!("Discarding stale account change {}", generation);
            return None;
        }
        self.is_processing = false;
        self.set_account(account);
        self.account.clone()
    }

    /// Applies a fetched balance. Returns false if the result was stale.
    pub fn apply_balance(&mut self, generation: Generation, balance: U256) -> bool {
        if !self.is_current(generation) || self.account.is_none() {
            debug!("Discarding stale balance {}", generation);
            return false;
        }
        self.balance = self.format_balance(balance);
        true
    }

    /// Sets the account; clearing it resets the balance.
    fn set_account(&mut self, account: Option<String>) {
        if account.is_none() {
            self.balance = ZERO_BALANCE.to_string();
        }
        self.account = account;
    }

    fn format_balance(&self, balance: U256) -> String {
        format_units(balance, self.decimals).unwrap_or_else(|e| {
            warn!("Showing raw balance: {}", e);
            balance.to_string()
        })
    }
}
