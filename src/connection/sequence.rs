//! The connect sequence: initialize, look up the account, then its balance.
//!
//! Each step only runs when the previous one produced something to work with.
//! Failures never escape; they are logged and reported through [`ConnectOutcome`].

use alloy_primitives::U256;
use tracing::error;

use super::manager::{ConnectionManager, InitOutcome};

/// How a connect sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The wallet authorized us and every query succeeded.
    Connected,
    /// No wallet is installed; only the read-only fallback is bound.
    NoProvider,
    /// The wallet refused to authorize us.
    AuthorizationDenied,
    /// The account or balance lookup failed.
    QueryFailed,
}

impl ConnectOutcome {
    /// Short name used by headless state output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::NoProvider => "no_provider",
            Self::AuthorizationDenied => "authorization_denied",
            Self::QueryFailed => "query_failed",
        }
    }
}

/// What a connect sequence found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectReport {
    /// How the sequence ended.
    pub outcome: ConnectOutcome,
    /// The first authorized account. Applied to the view even when `None`.
    pub account: Option<String>,
    /// Raw balance of `account`. `None` when there is no account or the lookup failed.
    pub balance: Option<U256>,
}

/// Runs initialize, account lookup and balance lookup in order.
pub async fn run_connect_sequence(manager: &ConnectionManager) -> ConnectReport {
    let init = manager.initialize().await;
    let outcome = match init {
        InitOutcome::Connected => ConnectOutcome::Connected,
        InitOutcome::ReadOnly => ConnectOutcome::NoProvider,
        InitOutcome::AuthorizationDenied(_) => ConnectOutcome::AuthorizationDenied,
    };

    let account = match manager.try_account().await {
        Ok(account) => account,
        Err(e) => {
            error!("계정 정보 조회 실패: {}", e);
            return ConnectReport {
                outcome: ConnectOutcome::QueryFailed,
                account: None,
                balance: None,
            };
        }
    };

    let Some(address) = account else {
        return ConnectReport {
            outcome,
            account: None,
            balance: None,
        };
    };

    match manager.balance(&address).await {
        Ok(balance) => ConnectReport {
            outcome,
            account: Some(address),
            balance: Some(balance),
        },
        Err(e) => {
            error!("월렛 연결 중 오류: {}", e);
            ConnectReport {
                outcome: ConnectOutcome::QueryFailed,
                account: Some(address),
                balance: None,
            }
        }
    }
}
