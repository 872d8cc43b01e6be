//! Shared fixtures.

use alloy_primitives::{Address, B256, TxHash, address, b256};
use dpay::{Dashboard, RecordingNotifier};
use dpay_config::Config;
use dpay_wallets::testing::MockProvider;
use serde_json::{Value, json};
use std::sync::Arc;

pub const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
pub const CONTRACT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
pub const TOKEN: &str = "0x1234567890abcdef1234567890abcdef12345678";
pub const RECIPIENT: &str = "0xABCDEF1234567890ABCDEF1234567890ABCDEF12";

pub const TX_HASH: TxHash =
    b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

/// A wallet holding 1.2346 ETH on Sepolia that accepts every transaction.
pub fn wallet() -> MockProvider {
    MockProvider::new()
        .with_response("eth_requestAccounts", json!([ALICE]))
        .with_response("eth_chainId", json!("0xaa36a7"))
        .with_response("eth_getBalance", json!("0x112210f4768db400"))
        .with_response("eth_sendTransaction", json!(TX_HASH))
        .with_response("eth_getTransactionReceipt", receipt(TX_HASH, true))
}

pub fn receipt(hash: B256, success: bool) -> Value {
    json!({
        "transactionHash": hash,
        "blockNumber": "0x10",
        "status": if success { "0x1" } else { "0x0" },
    })
}

pub fn config() -> Config {
    Config { contract_address: Some(CONTRACT), poll_interval: 5, ..Default::default() }
}

pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub dashboard: Arc<Dashboard>,
}

impl Harness {
    pub fn new(provider: MockProvider) -> Self {
        Self::with_config(provider, config())
    }

    pub fn with_config(provider: MockProvider, config: Config) -> Self {
        let provider = Arc::new(provider);
        let notifier = Arc::new(RecordingNotifier::new());
        let dashboard = Arc::new(Dashboard::new(config, provider.clone(), notifier.clone()));
        Self { provider, notifier, dashboard }
    }

    /// Connects and forgets everything the connection produced.
    pub async fn connected(provider: MockProvider) -> Self {
        let harness = Self::new(provider);
        harness.dashboard.connect().await.unwrap();
        harness.provider.clear_requests();
        harness.notifier.take();
        harness
    }

    /// The single `eth_sendTransaction` sent so far.
    pub fn sent_transaction(&self) -> Value {
        let sent = self.provider.requests_for("eth_sendTransaction");
        assert_eq!(sent.len(), 1, "{sent:?}");
        sent[0].params[0].clone()
    }
}
