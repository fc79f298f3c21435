//! Event handling for the TUI.
//!
//! A single reader thread polls crossterm and forwards keyboard and resize events
//! over a channel, so an event read while the main loop is busy elsewhere is
//! queued instead of dropped.

use crate::error::{Result, WalletError};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Events the reader may queue ahead of the main loop.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Application events.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// A periodic tick (for the spinner).
    Tick,
}

/// Handles terminal events.
pub struct EventHandler {
    /// Timeout for polling events.
    tick_rate: Duration,
    /// Receiving end of the reader thread, started on first use.
    events: Option<mpsc::Receiver<Result<Event>>>,
}

impl EventHandler {
    /// Creates a new event handler with default tick rate.
    pub fn new() -> Self {
        Self::with_tick_rate(Duration::from_millis(100))
    }

    /// Creates a new event handler with a custom tick rate.
    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self {
            tick_rate,
            events: None,
        }
    }

    /// Waits for the next event. A tick arrives whenever the terminal is idle for
    /// one tick interval.
    ///
    /// Cancel-safe: events are buffered by the reader thread.
    pub async fn next(&mut self) -> Result<Event> {
        let tick_rate = self.tick_rate;
        let events = self
            .events
            .get_or_insert_with(|| spawn_reader(tick_rate));

        events
            .recv()
            .await
            .unwrap_or_else(|| Err(WalletError::internal("Terminal event reader stopped")))
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts the reader thread. It exits once the receiver is dropped or reading fails.
fn spawn_reader(tick_rate: Duration) -> mpsc::Receiver<Result<Event>> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    thread::spawn(move || loop {
        let event = match read_event(tick_rate) {
            Ok(Some(event)) => Ok(event),
            Ok(None) => continue,
            Err(e) => Err(e),
        };
        let failed = event.is_err();
        if tx.blocking_send(event).is_err() || failed {
            break;
        }
    });

    rx
}

/// Polls once. `None` means the event is ignored.
fn read_event(tick_rate: Duration) -> Result<Option<Event>> {
    let ready = event::poll(tick_rate)
        .map_err(|e| WalletError::internal(format!("Failed to poll events: {e}")))?;
    if !ready {
        return Ok(Some(Event::Tick));
    }

    let event = event::read()
        .map_err(|e| WalletError::internal(format!("Failed to read event: {e}")))?;

    Ok(match event {
        // Ignore key releases reported by some terminals
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Release => None,
        CrosstermEvent::Key(key) => Some(Event::Key(key)),
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        _ => None,
    })
}
