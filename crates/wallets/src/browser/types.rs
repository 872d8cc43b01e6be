use crate::{error::ProviderRpcError, provider::ProviderEvent};
use alloy_primitives::{Address, U64};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Sent by the bridge page once it has loaded, reporting whether `window.ethereum` exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_name: Option<String>,
}

/// An EIP-1193 request waiting to be forwarded to the wallet by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub id: Uuid,
    pub method: String,
    pub params: Value,
}

/// The page's answer to a [`ProviderRequest`]: either a result or the wallet's error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: Uuid,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ProviderRpcError>,
}

/// Wallet notifications forwarded by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum BridgeEvent {
    AccountsChanged(Vec<Address>),
    /// Chain ids arrive as hex quantities, e.g. `"0xaa36a7"`.
    ChainChanged(U64),
}

impl From<BridgeEvent> for ProviderEvent {
    fn from(event: BridgeEvent) -> Self {
        match event {
            BridgeEvent::AccountsChanged(accounts) => Self::AccountsChanged(accounts),
            BridgeEvent::ChainChanged(id) => Self::ChainChanged(id.to()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BrowserApiResponse<T = ()> {
    Ok(T),
    Error { message: String },
}

impl BrowserApiResponse {
    pub fn ok() -> Self {
        Self::Ok(())
    }
}

impl<T> BrowserApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}
