//! Integration tests for headless mode.

use pretty_assertions::assert_eq;
use serde_json::Value;

use super::common::{run_headless, run_with_config};

const ACCOUNT: &str = "0xabc0000000000000000000000000000000000001";

fn mock_wallet_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "--headless",
        "--mock-wallet",
        "--mock-account",
        ACCOUNT,
        "--mock-balance",
        "1500000000000000000",
    ];
    args.extend_from_slice(extra);
    args
}

fn parse_json(stdout: &str) -> Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

#[test]
fn test_headless_shows_connected_account() {
    let (code, stdout, stderr) = run_headless(&mock_wallet_args(&[
        "--events",
        "assert:contains:Connected wallet,assert:contains-exact:Balance: 1.5 ETH",
    ]));

    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains(ACCOUNT));
    assert!(stdout.contains("Assertions: 2 passed, 0 failed"));
}

#[test]
fn test_headless_json_state() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "snapshot:connected",
        "--output",
        "json",
    ]));

    assert_eq!(code, 0);
    let json = parse_json(&stdout);
    assert_eq!(json["state"]["loading"], false);
    assert_eq!(json["state"]["account"], ACCOUNT);
    assert_eq!(json["state"]["balance"], "1.5");
    assert_eq!(json["state"]["outcome"], "connected");
    assert_eq!(json["events_executed"], 1);
}

#[test]
fn test_headless_without_wallet_offers_install() {
    let (code, stdout, _) = run_headless(&[
        "--headless",
        "--no-wallet",
        "--mock-fallback",
        "--events",
        "assert:contains:Install MetaMask,key:enter,assert:state:opened_urls=1",
        "--output",
        "json",
    ]);

    assert_eq!(code, 0, "stdout: {stdout}");
    let json = parse_json(&stdout);
    assert_eq!(json["state"]["button"], "install");
    assert_eq!(json["state"]["outcome"], "no_provider");
    assert_eq!(json["state"]["account"], Value::Null);
    assert_eq!(json["state"]["balance"], "0");
    assert_eq!(
        json["state"]["opened_urls"][0],
        "https://metamask.io/download.html"
    );
}

#[test]
fn test_headless_denied_authorization() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--mock-deny",
        "--mock-fallback",
        "--events",
        "assert:state:loading=false,assert:state:account=none,assert:contains:Connect wallet",
        "--output",
        "json",
    ]));

    assert_eq!(code, 0, "stdout: {stdout}");
    let json = parse_json(&stdout);
    assert_eq!(json["state"]["outcome"], "authorization_denied");
}

#[test]
fn test_headless_account_disconnect() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "accounts:,wait:200ms,assert:state:account=none,assert:state:balance=0,assert:not-contains:Balance:",
    ]));

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("[ Connect wallet ]"));
}

#[test]
fn test_headless_account_switch_with_balance() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "balance:0xdef=250000000000000000,accounts:0xdef|0xabc,wait:200ms,assert:state:account=0xdef,assert:state:balance=0.25",
    ]));

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Balance: 0.25 ETH"));
}

#[test]
fn test_headless_assertion_failure_exit_code() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "assert:contains:Install MetaMask",
        "--output",
        "json",
    ]));

    assert_eq!(code, 1, "Should exit with code 1 on assertion failure");
    let json = parse_json(&stdout);
    assert_eq!(json["assertions"]["passed"], 0);
    assert_eq!(json["assertions"]["failed"], 1);
}

#[test]
fn test_headless_fail_fast_stops_early() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "assert:contains:nope,assert:contains:Balance",
        "--fail-fast",
        "--output",
        "json",
    ]));

    assert_eq!(code, 1);
    let json = parse_json(&stdout);
    assert_eq!(json["assertions"]["passed"], 0);
    assert_eq!(json["events_executed"], 0);
}

#[test]
fn test_headless_frames_output() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "snapshot:start,key:q",
        "--output",
        "frames",
    ]));

    assert_eq!(code, 0);
    assert!(stdout.contains("=== FRAME 0 (initial) ==="));
    assert!(stdout.contains("=== FRAME 1 (snapshot:start) ==="));
    assert!(stdout.contains("=== FRAME 2 (key:q) ==="));
}

#[test]
fn test_headless_custom_size() {
    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--events",
        "resize:100x12,assert:state:running=true",
        "--size",
        "60x10",
        "--output",
        "json",
    ]));

    assert_eq!(code, 0);
    let json = parse_json(&stdout);
    assert_eq!(json["screen_lines"].as_array().map(Vec::len), Some(12));
}

#[test]
fn test_headless_requires_events() {
    let (code, _, stderr) = run_headless(&["--headless", "--mock-wallet"]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Configuration Error"), "stderr: {stderr}");
    assert!(stderr.contains("requires --events or --script"));
}

#[test]
fn test_headless_rejects_unknown_event() {
    let (code, _, stderr) = run_headless(&mock_wallet_args(&["--events", "type:hello"]));

    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown event type"), "stderr: {stderr}");
}

#[test]
fn test_headless_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("connect.events");
    std::fs::write(
        &script,
        "# mount has settled by now\nassert:state:loading=false\n\nassert:contains:Balance: 1.5\n",
    )
    .unwrap();

    let (code, stdout, _) = run_headless(&mock_wallet_args(&[
        "--script",
        script.to_str().unwrap(),
    ]));

    assert_eq!(code, 0, "stdout: {stdout}");
    assert!(stdout.contains("Assertions: 2 passed, 0 failed"));
}

#[test]
fn test_config_chain_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[chain]\nsymbol = \"xDAI\"\ndecimals = 18\n").unwrap();

    let (code, stdout, _) = run_with_config(
        &config,
        &mock_wallet_args(&["--events", "assert:contains:Balance: 1.5 xDAI"]),
    );

    assert_eq!(code, 0, "stdout: {stdout}");
}

#[test]
fn test_invalid_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[fallback]\nurl = \"ftp://node.example\"\n").unwrap();

    let (code, _, stderr) = run_with_config(&config, &mock_wallet_args(&["--events", "key:q"]));

    assert_eq!(code, 1);
    assert!(stderr.contains("Configuration Error"), "stderr: {stderr}");
}
