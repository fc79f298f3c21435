//! Headless mode for scripted testing and automation.
//!
//! Runs the TUI without a terminal, executing scripted events and capturing
//! output for verification. Background connect work runs for real; `wait:`
//! events give it time to finish.

mod events;
mod output;

pub use events::{Assertion, Event, EventParser};
pub use output::{HeadlessOutput, OutputFormat, ScreenRenderer};

use crate::cli::Cli;
use crate::config::Config;
use crate::connection::{ConnectionEvent, ConnectionManager};
use crate::error::{Result, WalletError};
use crate::provider::{create_fallback, create_wallet, MockWallet, WalletProvider, WalletSource};
use crate::tui::app::{App, Screen};
use crate::tui::browser::RecordingOpener;
use crate::tui::{ui, AsyncMessage, WalletController};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Longest time the runner waits for the initial connect sequence.
const MOUNT_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Screen width in columns.
    pub width: u16,
    /// Screen height in rows.
    pub height: u16,
    /// Output format.
    pub output_format: OutputFormat,
    /// Whether to stop on first assertion failure.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<std::path::PathBuf>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            output_format: OutputFormat::Text,
            fail_fast: false,
            output_file: None,
        }
    }
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (width, height) = cli.parse_screen_size().map_err(WalletError::config)?;
        let output_format = cli.parse_output_format().map_err(WalletError::config)?;

        Ok(Self {
            width,
            height,
            output_format: match output_format {
                crate::cli::OutputFormat::Text => OutputFormat::Text,
                crate::cli::OutputFormat::Json => OutputFormat::Json,
                crate::cli::OutputFormat::Frames => OutputFormat::Frames,
            },
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    /// Screen lines for JSON output.
    pub screen_lines: Vec<String>,
    /// Number of events executed.
    pub events_executed: usize,
    /// Total execution duration.
    pub duration: Duration,
    /// Number of assertions passed.
    pub assertions_passed: usize,
    /// Number of assertions failed.
    pub assertions_failed: usize,
    /// Application state snapshot.
    pub state: HeadlessState,
    /// Frame captures (for frames output mode).
    pub frames: Vec<Frame>,
}

/// Snapshot of application state for JSON output and state assertions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HeadlessState {
    /// Whether the initial connect sequence is still running.
    pub loading: bool,
    /// Connected account.
    pub account: Option<String>,
    /// Displayed balance.
    pub balance: String,
    /// Button on screen ("connect" or "install"), if any.
    pub button: Option<String>,
    /// Whether a wallet is installed.
    pub has_provider: bool,
    /// Whether a user-initiated connect is in flight.
    pub is_processing: bool,
    /// Whether the app is still running.
    pub running: bool,
    /// Latest connect generation.
    pub generation: u64,
    /// How the latest applied connect sequence ended.
    pub outcome: Option<String>,
    /// URLs opened through the install button.
    pub opened_urls: Vec<String>,
}

impl HeadlessState {
    fn capture(app: &App, opener: &RecordingOpener) -> Self {
        let button = match app.screen() {
            Screen::Disconnected(button) => Some(button.as_str().to_string()),
            _ => None,
        };
        Self {
            loading: app.loading,
            account: app.account.clone(),
            balance: app.balance.clone(),
            button,
            has_provider: app.has_provider,
            is_processing: app.is_processing,
            running: app.running,
            generation: app.generation().as_u64(),
            outcome: app.last_outcome.map(|o| o.as_str().to_string()),
            opened_urls: opener.opened(),
        }
    }

    /// Looks up a field by name for `assert:state:`. Missing optionals read as "none".
    pub fn field(&self, name: &str) -> Option<String> {
        let none = || "none".to_string();
        match name {
            "loading" => Some(self.loading.to_string()),
            "account" => Some(self.account.clone().unwrap_or_else(none)),
            "balance" => Some(self.balance.clone()),
            "button" => Some(self.button.clone().unwrap_or_else(none)),
            "has_provider" => Some(self.has_provider.to_string()),
            "is_processing" => Some(self.is_processing.to_string()),
            "running" => Some(self.running.to_string()),
            "generation" => Some(self.generation.to_string()),
            "outcome" => Some(self.outcome.clone().unwrap_or_else(none)),
            "opened_urls" => Some(self.opened_urls.len().to_string()),
            _ => None,
        }
    }
}

/// A captured frame (screen state after an event).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame number (0 = initial state).
    pub number: usize,
    /// Event that produced this frame (None for initial).
    pub event: Option<String>,
    /// Screen content.
    pub screen: String,
}

/// What the pump loop woke up for.
enum Pumped {
    Message(AsyncMessage),
    Connection(std::result::Result<ConnectionEvent, RecvError>),
    Deadline,
}

/// Runs the TUI in headless mode.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    manager: Arc<ConnectionManager>,
    controller: WalletController,
    rx: mpsc::Receiver<AsyncMessage>,
    connection_events: broadcast::Receiver<ConnectionEvent>,
    watching: bool,
    wallet: Option<MockWallet>,
    opener: RecordingOpener,
    events: Vec<Event>,
    frames: Vec<Frame>,
    start_time: Instant,
    assertions_passed: usize,
    assertions_failed: usize,
}

impl HeadlessRunner {
    /// Creates a new headless runner.
    ///
    /// `wallet` is the handle `accounts:` and `balance:` events act on. It should
    /// be the same mock the manager was built with.
    pub fn new(
        config: HeadlessConfig,
        manager: Arc<ConnectionManager>,
        wallet: Option<MockWallet>,
        app_config: &Config,
    ) -> Result<Self> {
        let backend = TestBackend::new(config.width, config.height);
        let terminal = Terminal::new(backend)
            .map_err(|e| WalletError::internal(format!("Failed to create test terminal: {e}")))?;

        let app = App::new(manager.has_injected_provider(), manager.describe(), &app_config.chain);
        let opener = RecordingOpener::new();
        let (tx, rx) = mpsc::channel(32);
        let controller = WalletController::new(
            Arc::clone(&manager),
            Arc::new(opener.clone()),
            app_config.install_url.clone(),
            tx,
        );
        let connection_events = manager.subscribe();

        Ok(Self {
            config,
            terminal,
            app,
            manager,
            controller,
            rx,
            connection_events,
            watching: true,
            wallet,
            opener,
            events: Vec::new(),
            frames: Vec::new(),
            start_time: Instant::now(),
            assertions_passed: 0,
            assertions_failed: 0,
        })
    }

    /// Loads events from a string (comma-separated or newline-separated).
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        let parser = EventParser::new();
        self.events = parser.parse_all(input)?;
        Ok(())
    }

    /// Loads events from a script file.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| WalletError::internal(format!("Failed to read stdin: {e}")))?;
            buffer
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| WalletError::internal(format!("Failed to read script file: {e}")))?
        };

        self.load_events(&content)
    }

    /// Runs the headless execution and returns the result.
    pub async fn run(mut self) -> Result<HeadlessResult> {
        self.start_time = Instant::now();

        self.manager.watch_accounts();
        self.controller.mount(&mut self.app);
        self.settle_mount().await;

        self.capture_frame(None)?;

        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;

        for event in events {
            let event_str = event.to_string();

            match &event {
                Event::Key(key_event) => {
                    let action = self.app.handle_event(crate::tui::Event::Key(*key_event));
                    self.controller.dispatch(action, &mut self.app);
                }
                Event::Wait(duration) => {
                    self.pump(*duration).await;
                }
                Event::Resize(w, h) => {
                    self.terminal.backend_mut().resize(*w, *h);
                    self.terminal
                        .resize(ratatui::layout::Rect::new(0, 0, *w, *h))
                        .map_err(|e| WalletError::internal(format!("Resize failed: {e}")))?;
                }
                Event::Snapshot(name) => {
                    debug!("Snapshot {}", name);
                }
                Event::Accounts(accounts) => {
                    self.mock_wallet(&event_str)?.set_accounts(accounts.clone());
                }
                Event::Balance { address, wei } => {
                    self.mock_wallet(&event_str)?.set_balance(address, *wei);
                }
                Event::Assert(assertion) => {
                    self.draw()?;
                    let screen = self.render_screen();
                    let state = HeadlessState::capture(&self.app, &self.opener);
                    if assertion.check(&screen, &state) {
                        self.assertions_passed += 1;
                    } else {
                        warn!("Assertion failed: {}", event_str);
                        self.assertions_failed += 1;
                        if self.config.fail_fast {
                            break;
                        }
                    }
                }
            }

            events_executed += 1;

            // Apply whatever finished while the event ran
            self.pump(Duration::ZERO).await;
            self.draw()?;

            if self.config.output_format == OutputFormat::Frames {
                self.capture_frame(Some(event_str))?;
            }

            if !self.app.running {
                break;
            }
        }

        self.draw()?;
        self.manager.shutdown();

        let screen = self.render_screen();
        let screen_lines = screen.lines().map(String::from).collect();

        Ok(HeadlessResult {
            screen,
            screen_lines,
            events_executed,
            duration: self.start_time.elapsed(),
            assertions_passed: self.assertions_passed,
            assertions_failed: self.assertions_failed,
            state: HeadlessState::capture(&self.app, &self.opener),
            frames: self.frames,
        })
    }

    fn mock_wallet(&self, event: &str) -> Result<&MockWallet> {
        self.wallet.as_ref().ok_or_else(|| {
            WalletError::config(format!("'{event}' requires --mock-wallet"))
        })
    }

    /// Waits for the initial connect sequence, up to [`MOUNT_SETTLE_TIMEOUT`].
    async fn settle_mount(&mut self) {
        let deadline = Instant::now() + MOUNT_SETTLE_TIMEOUT;
        while self.app.loading && Instant::now() < deadline {
            self.pump(Duration::from_millis(10)).await;
        }
        if self.app.loading {
            warn!("Initial connect did not finish within {:?}", MOUNT_SETTLE_TIMEOUT);
        }
    }

    /// Applies background results and connection events for `duration`.
    async fn pump(&mut self, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let next = tokio::select! {
                biased;
                Some(msg) = self.rx.recv() => Pumped::Message(msg),
                received = self.connection_events.recv(), if self.watching => Pumped::Connection(received),
                _ = tokio::time::sleep_until(deadline) => Pumped::Deadline,
            };

            match next {
                Pumped::Message(msg) => self.controller.handle_message(msg, &mut self.app),
                Pumped::Connection(Ok(event)) => {
                    self.controller.on_connection_event(event, &mut self.app)
                }
                Pumped::Connection(Err(RecvError::Lagged(skipped))) => {
                    warn!("Missed {} connection events", skipped);
                }
                Pumped::Connection(Err(RecvError::Closed)) => self.watching = false,
                Pumped::Deadline => break,
            }
        }
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| WalletError::internal(format!("Failed to render: {e}")))?;
        Ok(())
    }

    /// Renders the current screen to a string.
    fn render_screen(&self) -> String {
        ScreenRenderer::render(self.terminal.backend().buffer())
    }

    /// Captures the current frame.
    fn capture_frame(&mut self, event: Option<String>) -> Result<()> {
        self.draw()?;
        let screen = self.render_screen();
        let number = self.frames.len();

        self.frames.push(Frame {
            number,
            event,
            screen,
        });

        Ok(())
    }
}

/// Builds the connection manager for a headless run.
///
/// Returns the mock wallet handle too, when the wallet is a mock.
pub fn build_manager(cli: &Cli, config: &Config) -> Result<(Arc<ConnectionManager>, Option<MockWallet>)> {
    let source = cli.wallet_source(config)?;
    let wallet = match &source {
        WalletSource::Mock(wallet) => Some(wallet.clone()),
        _ => None,
    };

    let fallback: Arc<dyn WalletProvider> = if cli.mock_fallback {
        Arc::new(MockWallet::new())
    } else {
        create_fallback(config)?
    };
    let injected = create_wallet(&source, config)?;

    Ok((Arc::new(ConnectionManager::new(injected, fallback)), wallet))
}

/// Runs headless mode from CLI arguments.
pub async fn run_headless(cli: &Cli, app_config: &Config) -> Result<i32> {
    cli.validate_headless().map_err(WalletError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let (manager, wallet) = build_manager(cli, app_config)?;
    info!("Headless run against {}", manager.describe());

    let mut runner = HeadlessRunner::new(config.clone(), manager, wallet, app_config)?;

    if let Some(ref events_str) = cli.events {
        runner.load_events(events_str)?;
    } else if let Some(ref script_path) = cli.script {
        runner.load_script(script_path)?;
    }

    let result = runner.run().await?;

    let output = HeadlessOutput::new(config.output_format);
    let output_str = output.format(&result);

    if let Some(ref path) = config.output_file {
        std::fs::write(path, &output_str)
            .map_err(|e| WalletError::internal(format!("Failed to write output file: {e}")))?;
    } else {
        print!("{}", output_str);
    }

    if result.assertions_failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
