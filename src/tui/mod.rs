//! Terminal User Interface for wallet-glance.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
pub mod browser;
pub mod controller;
mod events;
pub mod headless;
mod ui;
pub mod widgets;

pub use app::App;
pub use controller::WalletController;
pub use events::{Event, EventHandler};

use crate::config::Config;
use crate::connection::{ConnectReport, ConnectionManager};
use crate::error::{Result, WalletError};
use alloy_primitives::U256;
use browser::SystemBrowser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use app::Generation;

/// Capacity of the background result channel.
const MESSAGE_CHANNEL_CAPACITY: usize = 32;

/// Messages sent from background tasks to the main loop.
#[derive(Debug)]
pub enum AsyncMessage {
    /// A connect sequence finished.
    ConnectFinished {
        generation: Generation,
        report: ConnectReport,
        /// Whether this was the initial sequence started on mount.
        mount: bool,
    },
    /// A balance lookup after an account change finished.
    BalanceFetched { generation: Generation, balance: U256 },
}

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    /// Cancelled when the loop exits or a panic unwinds.
    shutdown: CancellationToken,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
            shutdown: CancellationToken::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| WalletError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| WalletError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
            .map_err(|e| WalletError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| WalletError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| WalletError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| WalletError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the event loop until the user quits.
    pub async fn run(&mut self, manager: Arc<ConnectionManager>, config: &Config) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        let shutdown = self.shutdown.clone();
        panic::set_hook(Box::new(move |panic_info| {
            shutdown.cancel();
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let mut app_state = App::new(manager.has_injected_provider(), manager.describe(), &config.chain);
        let (tx, mut rx) = mpsc::channel::<AsyncMessage>(MESSAGE_CHANNEL_CAPACITY);
        let controller = WalletController::new(
            Arc::clone(&manager),
            Arc::new(SystemBrowser),
            config.install_url.clone(),
            tx,
        );

        let result = self
            .run_event_loop(&mut app_state, &controller, &manager, &mut rx)
            .await;

        self.shutdown.cancel();
        manager.shutdown();

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    /// The main event loop, separated for cleaner error handling.
    async fn run_event_loop(
        &mut self,
        app_state: &mut App,
        controller: &WalletController,
        manager: &ConnectionManager,
        rx: &mut mpsc::Receiver<AsyncMessage>,
    ) -> Result<()> {
        let mut connection_events = manager.subscribe();
        let mut watching = true;
        controller.mount(app_state);

        loop {
            self.terminal
                .draw(|frame| ui::render(frame, app_state))
                .map_err(|e| WalletError::internal(format!("Failed to draw: {e}")))?;

            if !app_state.running || self.shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                event = self.event_handler.next() => {
                    let action = app_state.handle_event(event?);
                    controller.dispatch(action, app_state);
                }

                Some(msg) = rx.recv() => {
                    controller.handle_message(msg, app_state);
                }

                received = connection_events.recv(), if watching => match received {
                    Ok(event) => controller.on_connection_event(event, app_state),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("View missed {} connection events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Connection events closed");
                        watching = false;
                    }
                },
            }
        }

        info!("Exiting");
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive TUI against `manager`.
pub async fn run(manager: Arc<ConnectionManager>, config: &Config) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(manager, config).await
}
