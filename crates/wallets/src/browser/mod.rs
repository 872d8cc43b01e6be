//! Wallet access through a browser page.
//!
//! A local `axum` server serves a small page that talks to the injected `window.ethereum`
//! provider (EIP-1193). Provider calls are queued on the server; the page pulls them, forwards
//! them to the wallet and posts the results back. Wallet notifications travel the same way.
//! Every API call must carry the per-run `X-Session-Token` embedded in the page.

mod app;
mod handlers;
mod queue;
mod router;
mod server;
mod state;
pub mod types;

pub use server::BrowserWalletServer;

use crate::{
    error::{BrowserWalletError, ProviderError},
    provider::{ProviderEvent, WalletProvider},
};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// [`WalletProvider`] backed by a [`BrowserWalletServer`].
#[derive(Debug, Clone)]
pub struct BrowserProvider {
    server: BrowserWalletServer,
}

impl BrowserProvider {
    pub fn new(server: BrowserWalletServer) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &BrowserWalletServer {
        &self.server
    }

    pub async fn shutdown(&self) -> Result<(), BrowserWalletError> {
        self.server.stop().await
    }
}

#[async_trait]
impl WalletProvider for BrowserProvider {
    async fn is_available(&self) -> bool {
        self.server.is_available()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.server.request(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.server.subscribe()
    }
}
