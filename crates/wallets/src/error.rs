use alloy_primitives::hex;
use alloy_sol_types::decode_revert_reason;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// EIP-1193 code returned when the user rejects a request in the wallet.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// An error object returned by an EIP-1193 `request` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the user declined the request in the wallet UI.
    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    /// The most specific human-readable reason carried by the error.
    ///
    /// Looks for a revert reason or a `reason`/`message` field in `data` first, then falls back to
    /// the top-level message.
    pub fn reason(&self) -> Option<String> {
        if let Some(reason) = self.data.as_ref().and_then(reason_from_data) {
            return Some(reason);
        }
        non_empty(&self.message)
    }
}

fn reason_from_data(data: &Value) -> Option<String> {
    match data {
        Value::String(s) if s.starts_with("0x") => {
            let bytes = hex::decode(s).ok()?;
            decode_revert_reason(&bytes).and_then(|r| non_empty(&r))
        }
        Value::String(s) => non_empty(s),
        Value::Object(map) => {
            // wallets nest node errors under `data` or `originalError`
            for key in ["data", "originalError"] {
                if let Some(reason) = map.get(key).and_then(reason_from_data) {
                    return Some(reason);
                }
            }
            ["reason", "message"]
                .into_iter()
                .find_map(|key| map.get(key).and_then(Value::as_str).and_then(non_empty))
        }
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Errors returned by a [`WalletProvider`](crate::WalletProvider).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no injected wallet provider is available")]
    Unavailable,
    #[error(transparent)]
    Rpc(#[from] ProviderRpcError),
    #[error("failed to decode `{method}` response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("wallet bridge was closed before `{0}` completed")]
    Closed(String),
}

impl ProviderError {
    pub fn decode(method: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode { method: method.into(), source }
    }

    /// See [`ProviderRpcError::reason`].
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Rpc(err) => err.reason(),
            _ => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc(err) if err.is_user_rejection())
    }
}

/// Errors of the wallet connection lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Please install MetaMask to connect your wallet")]
    ProviderUnavailable,
    #[error("{0}")]
    ConnectionRejected(String),
    #[error("a connection request is already pending")]
    ConnectionPending,
    /// The session was reset (disconnect, emptied accounts or chain change) while connecting.
    #[error("wallet changed while connecting")]
    Interrupted,
}

impl WalletError {
    /// Maps a provider failure during connect to the lifecycle error shown to the user.
    pub fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable => Self::ProviderUnavailable,
            err => Self::ConnectionRejected(
                err.reason().unwrap_or_else(|| "Failed to connect wallet".to_string()),
            ),
        }
    }
}

/// Errors of the local browser bridge server.
#[derive(Debug, thiserror::Error)]
pub enum BrowserWalletError {
    #[error("failed to bind browser bridge to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("browser bridge is not running")]
    NotRunning,
    #[error("no bridge page attached within {0:?}")]
    AttachTimeout(Duration),
    #[error("browser bridge server failed: {0}")]
    Server(String),
}
