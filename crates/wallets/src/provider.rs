//! The injected wallet provider seam.
//!
//! [`WalletProvider`] mirrors the EIP-1193 surface a page sees on `window.ethereum`: a single
//! JSON-RPC style `request` method plus `accountsChanged` / `chainChanged` notifications.
//! [`WalletProviderExt`] layers the typed calls the payment flows need on top of it.

use crate::error::ProviderError;
use alloy_primitives::{Address, Bytes, TxHash, U64, U256};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::{fmt, sync::Arc};
use tokio::sync::broadcast;

/// Notifications pushed by the wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of exposed accounts changed. Empty when the user locked or disconnected the wallet.
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks.
    ChainChanged(u64),
}

/// An EIP-1193 wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync + fmt::Debug {
    /// Whether a wallet is present. Every other call fails with
    /// [`ProviderError::Unavailable`] when this is `false`.
    async fn is_available(&self) -> bool;

    /// Sends a raw `request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribes to wallet notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

#[async_trait]
impl<T: WalletProvider + ?Sized> WalletProvider for Arc<T> {
    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        (**self).request(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        (**self).subscribe()
    }
}

/// The parts of a transaction receipt needed to track confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` on success, `0x0` on revert.
    #[serde(default)]
    pub status: Option<U64>,
}

impl ReceiptSummary {
    /// Whether the transaction executed without reverting.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status == U64::from(1))
    }

    /// Number of blocks including this one, given the current head.
    pub fn confirmations(&self, head: u64) -> u64 {
        self.block_number.map_or(0, |block| head.saturating_sub(block.to::<u64>()) + 1)
    }
}

/// Typed helpers over [`WalletProvider::request`].
#[async_trait]
pub trait WalletProviderExt: WalletProvider {
    async fn request_as<R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ProviderError> {
        let value = self.request(method, params).await?;
        serde_json::from_value(value).map_err(|err| ProviderError::decode(method, err))
    }

    /// `eth_requestAccounts`, prompting the user to grant access if needed.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.request_as("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let id: U64 = self.request_as("eth_chainId", json!([])).await?;
        Ok(id.to())
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ProviderError> {
        self.request_as("eth_getBalance", json!([address, "latest"])).await
    }

    /// `eth_sendTransaction`; the wallet signs and broadcasts, returning the hash.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, ProviderError> {
        self.request_as("eth_sendTransaction", json!([tx])).await
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, ProviderError> {
        self.request_as("eth_call", json!([tx, "latest"])).await
    }

    /// `None` while the transaction is still pending.
    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<ReceiptSummary>, ProviderError> {
        self.request_as("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        let number: U64 = self.request_as("eth_blockNumber", json!([])).await?;
        Ok(number.to())
    }
}

impl<P: WalletProvider + ?Sized> WalletProviderExt for P {}
