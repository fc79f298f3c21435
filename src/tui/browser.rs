//! Opening external pages (the wallet install page) from the terminal.

use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::debug;

use crate::error::{Result, WalletError};

/// Something that can open a URL outside the application.
pub trait UrlOpener: Send + Sync {
    /// Opens `url` in a new browsing context.
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn command(url: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut command = Command::new("open");
            command.arg(url);
            command
        } else if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", url]);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        }
    }
}

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        spawn_reaped(Self::command(url))
            .map_err(|e| WalletError::internal(format!("Failed to open {url}: {e}")))?;
        Ok(())
    }
}

/// Spawns `command` detached from the terminal and reaps it on a background thread.
fn spawn_reaped(mut command: Command) -> std::io::Result<thread::JoinHandle<()>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    Ok(thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => debug!("Browser opener exited with {}", status),
        Ok(_) => {}
        Err(e) => debug!("Failed to wait for browser opener: {}", e),
    }))
}

/// Records URLs instead of opening them. Used in headless mode.
#[derive(Debug, Clone, Default)]
pub struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingOpener {
    /// Creates an opener with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened so far, oldest first.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| WalletError::internal("URL record lock poisoned"))?
            .push(url.to_string());
        Ok(())
    }
}
