use crate::utils::*;
use alloy_primitives::U256;
use dpay::{MockHistory, TransferForm, history::EMPTY_HISTORY};
use dpay_wallets::{
    ProviderEvent, ProviderRpcError, SessionState, WalletError, testing::MockProvider,
};
use serde_json::json;
use similar_asserts::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn connects_and_loads_history() {
    let harness = Harness::new(wallet());
    let session = harness.dashboard.connect().await.unwrap();
    assert_eq!(session.address, ALICE);
    assert_eq!(session.chain_id, 11155111);
    assert_eq!(session.display_balance(), "1.2346");

    let notifications = harness.notifier.take();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Wallet Connected");
    assert_eq!(notifications[0].description, "Connected to 0xf39F...2266");

    assert_eq!(harness.dashboard.history().entries().len(), 2);
    assert_eq!(
        harness.provider.requests().iter().map(|r| r.method.as_str()).collect::<Vec<_>>(),
        ["eth_requestAccounts", "eth_chainId", "eth_getBalance"]
    );
}

#[tokio::test]
async fn connect_without_wallet() {
    let harness = Harness::new(MockProvider::unavailable());
    let err = harness.dashboard.connect().await.unwrap_err();
    assert!(matches!(err, WalletError::ProviderUnavailable));
    assert!(harness.dashboard.session().is_none());

    let notifications = harness.notifier.notifications();
    assert_eq!(notifications[0].title, "MetaMask Required");
    assert_eq!(notifications[0].description, "Please install MetaMask to connect your wallet");
    assert!(harness.provider.requests().is_empty());
}

#[tokio::test]
async fn connect_rejected_by_user() {
    let provider = MockProvider::new()
        .with_error(
            "eth_requestAccounts",
            ProviderRpcError::new(4001, "User rejected the request."),
        );
    let harness = Harness::new(provider);
    assert!(harness.dashboard.connect().await.is_err());
    assert_eq!(harness.dashboard.sessions().state(), SessionState::Disconnected);

    let notifications = harness.notifier.notifications();
    assert_eq!(notifications[0].title, "Connection Failed");
    assert_eq!(notifications[0].description, "User rejected the request.");
    assert!(harness.dashboard.history().entries().is_empty());
}

#[tokio::test]
async fn disconnect_clears_page() {
    let harness = Harness::connected(wallet()).await;
    harness.dashboard.disconnect();

    assert!(harness.dashboard.session().is_none());
    assert_eq!(harness.dashboard.history().render(chrono::Utc::now()), EMPTY_HISTORY);
    assert_eq!(harness.notifier.titles(), ["Wallet Disconnected"]);
    // Disconnecting is local only
    assert!(harness.provider.requests().is_empty());
}

#[tokio::test]
async fn emptied_accounts_disconnect() {
    let harness = Harness::connected(wallet()).await;
    let listener = harness.dashboard.spawn_event_listener();
    let mut state = harness.dashboard.sessions().watch();

    harness.provider.emit(ProviderEvent::AccountsChanged(vec![]));
    state.wait_for(|state| *state == SessionState::Disconnected).await.unwrap();
    settle().await;

    assert_eq!(harness.notifier.titles(), ["Wallet Disconnected"]);
    assert!(harness.dashboard.history().entries().is_empty());
    listener.abort();
}

#[tokio::test]
async fn switched_account_resyncs() {
    let harness = Harness::connected(wallet()).await;

    harness.dashboard.handle_provider_event(ProviderEvent::AccountsChanged(vec![BOB])).await;
    let session = harness.dashboard.session().unwrap();
    assert_eq!(session.address, BOB);
    assert_eq!(harness.provider.requests_for("eth_getBalance")[0].params, json!([BOB, "latest"]));
    assert_eq!(harness.dashboard.history().entries().len(), 2);

    // The same account again is a no-op
    harness.provider.clear_requests();
    harness.dashboard.handle_provider_event(ProviderEvent::AccountsChanged(vec![BOB])).await;
    assert!(harness.provider.requests().is_empty());
}

#[tokio::test]
async fn chain_change_resets_page() {
    let harness = Harness::connected(wallet()).await;
    harness.dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));
    harness.dashboard.token().set_form(TransferForm::token(TOKEN, RECIPIENT, "1"));
    let listener = harness.dashboard.spawn_event_listener();
    let mut state = harness.dashboard.sessions().watch();

    harness.provider.emit(ProviderEvent::ChainChanged(1));
    state.wait_for(|state| !state.is_connected()).await.unwrap();
    settle().await;

    assert!(harness.dashboard.native().form().is_empty());
    assert!(harness.dashboard.token().form().is_empty());
    assert!(harness.dashboard.history().entries().is_empty());
    assert_eq!(harness.notifier.titles(), ["Network Changed"]);
    listener.abort();
}

#[tokio::test]
async fn history_needs_contract() {
    let config = dpay_config::Config { contract_address: None, ..config() };
    let harness = Harness::with_config(wallet(), config);
    harness.dashboard.connect().await.unwrap();
    assert_eq!(harness.dashboard.history().render(chrono::Utc::now()), EMPTY_HISTORY);
}

#[tokio::test]
async fn pinned_history_renders() {
    let now = chrono::Utc::now();
    let provider = std::sync::Arc::new(wallet());
    let notifier = std::sync::Arc::new(dpay::RecordingNotifier::new());
    let dashboard = dpay::Dashboard::with_history_source(
        config(),
        provider,
        notifier,
        std::sync::Arc::new(MockHistory::at(now)),
    );
    dashboard.connect().await.unwrap();

    let rendered = dashboard.history().render(now);
    let lines: Vec<_> = rendered.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[ETH] 0.5 ETH  To: 0xabCD...eF12  30m ago"), "{}", lines[0]);
    assert!(lines[1].starts_with("[Token] 100 Tokens  To: 0x1234...5678  2h ago"), "{}", lines[1]);
}

#[tokio::test]
async fn contract_balance() {
    let harness = Harness::connected(wallet().with_response(
        "eth_call",
        json!("0x0000000000000000000000000000000000000000000000000de0b6b3a7640000"),
    ))
    .await;
    let balance = harness.dashboard.contract_balance().await.unwrap();
    assert_eq!(balance, U256::from(1_000_000_000_000_000_000u64));

    let harness = Harness::with_config(wallet(), dpay_config::Config::default());
    assert!(harness.dashboard.contract_balance().await.is_err());
}

/// Lets the event listener finish handling the last notification.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn disconnect_during_connect_wins() {
    let provider = wallet().with_delay("eth_requestAccounts", Duration::from_millis(50));
    let harness = Harness::new(provider);
    let connect = tokio::spawn({
        let dashboard = harness.dashboard.clone();
        async move { dashboard.connect().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.dashboard.sessions().state(), SessionState::Connecting);

    harness.dashboard.disconnect();
    assert!(matches!(connect.await.unwrap(), Err(WalletError::Interrupted)));
    assert_eq!(harness.dashboard.sessions().state(), SessionState::Disconnected);
    assert!(harness.dashboard.history().entries().is_empty());
    assert_eq!(harness.notifier.titles(), ["Wallet Disconnected"]);
}
