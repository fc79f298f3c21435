//! Common test utilities for TUI tests.

use std::path::Path;
use std::process::Command;

/// Run wallet-glance with the given arguments.
///
/// Points `--config` at a file that does not exist so the user's own config never
/// leaks into a test, and clears the wallet URL variable for the same reason.
pub fn run_headless(args: &[&str]) -> (i32, String, String) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    run_with_config(&dir.path().join("absent.toml"), args)
}

/// Run wallet-glance with an explicit config file.
pub fn run_with_config(config: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_wallet-glance"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("WALLET_GLANCE_WALLET_URL")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}
