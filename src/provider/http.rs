//! JSON-RPC over HTTP provider.
//!
//! Talks to a wallet or node endpoint with `eth_requestAccounts`, `eth_accounts` and
//! `eth_getBalance`. Plain HTTP has no push channel, so account changes are detected
//! by polling `eth_accounts` in a background task.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, WalletError};
use crate::provider::WalletProvider;
use crate::units::parse_quantity;

/// Default timeout for JSON-RPC requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default interval between `eth_accounts` polls.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// EIP-1193 "user rejected the request".
const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 "unauthorized".
const UNAUTHORIZED_CODE: i64 = 4100;

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// Capacity of the account-change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// HTTP provider configuration.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Interval between account polls.
    pub poll_interval: Duration,
}

impl HttpProviderConfig {
    /// Creates a new config for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the account poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn into_wallet_error(self, method: &str) -> WalletError {
        match self.code {
            USER_REJECTED_CODE | UNAUTHORIZED_CODE => WalletError::authorization(self.message),
            code => WalletError::query(format!("{method} failed ({code}): {}", self.message)),
        }
    }
}

/// Shared transport used by the provider and its poll task.
#[derive(Debug)]
struct RpcTransport {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl RpcTransport {
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WalletError::provider(format!("{method} timed out"))
                } else if e.is_connect() {
                    WalletError::provider(format!("Failed to connect to {}", self.url))
                } else {
                    WalletError::provider(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::provider(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(WalletError::provider(format!(
                "JSON-RPC endpoint error ({status}): {body}"
            )));
        }

        parse_rpc_response(method, &body)
    }
}

/// Decodes a JSON-RPC response body into the expected result type.
fn parse_rpc_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| WalletError::provider(format!("Failed to parse response: {e}")))?;

    if let Some(error) = response.error {
        return Err(error.into_wallet_error(method));
    }

    let result = response
        .result
        .ok_or_else(|| WalletError::query(format!("{method} returned no result")))?;

    serde_json::from_value(result)
        .map_err(|e| WalletError::query(format!("Unexpected {method} result: {e}")))
}

/// JSON-RPC wallet or node reached over HTTP.
#[derive(Debug)]
pub struct HttpProvider {
    config: HttpProviderConfig,
    transport: Arc<RpcTransport>,
    changes: broadcast::Sender<Vec<String>>,
    watcher_started: AtomicBool,
    shutdown: CancellationToken,
}

impl HttpProvider {
    /// Creates a provider for the configured endpoint.
    ///
    /// No request is made until the first call.
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WalletError::provider(format!("Failed to create HTTP client: {e}")))?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            transport: Arc::new(RpcTransport {
                url: config.url.clone(),
                client,
                next_id: AtomicU64::new(1),
            }),
            config,
            changes,
            watcher_started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        })
    }

    /// Starts the `eth_accounts` poll task once, if a runtime is available.
    fn ensure_watcher(&self) {
        if self.watcher_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; account changes from {} will not be watched", self.config.url);
            self.watcher_started.store(false, Ordering::SeqCst);
            return;
        };

        handle.spawn(watch_accounts(
            Arc::clone(&self.transport),
            self.changes.clone(),
            self.config.poll_interval,
            self.shutdown.clone(),
        ));
    }
}

impl Drop for HttpProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Polls `eth_accounts` and broadcasts the list whenever it differs from the last one.
///
/// The first successful poll only records a baseline.
async fn watch_accounts(
    transport: Arc<RpcTransport>,
    changes: broadcast::Sender<Vec<String>>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut last: Option<Vec<String>> = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let accounts: Vec<String> = match transport.call("eth_accounts", json!([])).await {
            Ok(accounts) => accounts,
            Err(e) => {
                debug!("Account poll of {} failed: {}", transport.url, e);
                continue;
            }
        };

        if last.as_ref() != Some(&accounts) {
            if last.is_some() {
                let _ = changes.send(accounts.clone());
            }
            last = Some(accounts);
        }
    }

    debug!("Stopped watching accounts on {}", transport.url);
}

#[async_trait]
impl WalletProvider for HttpProvider {
    fn describe(&self) -> String {
        self.config.url.clone()
    }

    async fn request_accounts(&self) -> Result<Vec<String>> {
        match self
            .transport
            .call("eth_requestAccounts", json!([]))
            .await
        {
            // Plain nodes have no authorization step; their account list is the answer
            Err(WalletError::Query(msg)) if msg.contains(&format!("({METHOD_NOT_FOUND_CODE})")) => {
                debug!("{} has no eth_requestAccounts; using eth_accounts", self.config.url);
                self.accounts().await
            }
            other => other,
        }
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        self.transport.call("eth_accounts", json!([])).await
    }

    async fn balance(&self, address: &str) -> Result<U256> {
        let quantity: String = self
            .transport
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity(&quantity)
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<String>> {
        let receiver = self.changes.subscribe();
        self.ensure_watcher();
        receiver
    }
}
