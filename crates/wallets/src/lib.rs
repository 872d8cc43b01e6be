//! # dpay-wallets
//!
//! Access to an injected EIP-1193 wallet and the wallet session lifecycle.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod browser;
pub mod error;
pub mod provider;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use browser::{BrowserProvider, BrowserWalletServer};
pub use error::{BrowserWalletError, ProviderError, ProviderRpcError, WalletError};
pub use provider::{ProviderEvent, ReceiptSummary, WalletProvider, WalletProviderExt};
pub use session::{SessionEvent, SessionManager, SessionState, WalletSession};
