//! Minimal JSON-RPC endpoint for exercising the HTTP provider.
//!
//! Answers `eth_requestAccounts`, `eth_accounts` and `eth_getBalance` from shared
//! state.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Default)]
pub struct StubState {
    pub accounts: Vec<String>,
    /// Balance returned for every address, as a hex quantity.
    pub balance: String,
    /// Reject `eth_requestAccounts` with code 4001.
    pub deny: bool,
    /// Answer `eth_requestAccounts` with "method not found", like a plain node.
    pub plain_node: bool,
    pub calls: Vec<String>,
}

type SharedState = Arc<Mutex<StubState>>;

#[derive(Clone)]
pub struct RpcStub {
    pub url: String,
    state: SharedState,
}

impl RpcStub {
    /// Binds to an ephemeral port and serves until the test's runtime stops.
    pub async fn start(state: StubState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(state));

        let router = Router::new()
            .route("/", post(rpc))
            .with_state(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { url, state }
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.state.lock().unwrap().accounts = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|m| *m == method)
            .count()
    }
}

async fn rpc(State(state): State<SharedState>, Json(request): Json<Value>) -> Json<Value> {
    Json(answer(&request, &state))
}

fn answer(request: &Value, state: &Mutex<StubState>) -> Value {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    state.calls.push(method.clone());

    let error = |code: i64, message: &str| {
        json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
    };

    match method.as_str() {
        "eth_requestAccounts" if state.plain_node => error(-32601, "Method not found"),
        "eth_requestAccounts" if state.deny => error(4001, "User rejected the request."),
        "eth_requestAccounts" | "eth_accounts" => {
            json!({"jsonrpc": "2.0", "id": id, "result": state.accounts})
        }
        "eth_getBalance" => json!({"jsonrpc": "2.0", "id": id, "result": state.balance}),
        _ => error(-32601, "Method not found"),
    }
}
