use crate::utils::*;
use alloy_primitives::{U256, address, hex};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use dpay::{TransferError, TransferForm, TransferStatus};
use dpay_common::{AssetKind, IERC20Metadata, PaymentGateway};
use dpay_wallets::{ProviderRpcError, testing::MockProvider};
use serde_json::json;
use similar_asserts::assert_eq;
use std::time::Duration;

/// `decimals()` return data.
fn encoded_decimals(decimals: u8) -> String {
    hex::encode_prefixed(U256::from(decimals).to_be_bytes::<32>())
}

#[tokio::test]
async fn sends_native_transfer() {
    let harness = Harness::connected(wallet()).await;
    let dashboard = &harness.dashboard;
    let mut outcomes = dashboard.native().subscribe();

    dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));
    let outcome = dashboard.send_native().await.unwrap();
    assert_eq!(outcome.status, TransferStatus::Confirmed);
    assert_eq!(outcome.tx_hash, Some(TX_HASH));

    let tx: TransactionRequest = serde_json::from_value(harness.sent_transaction()).unwrap();
    assert_eq!(tx.from, Some(ALICE));
    assert_eq!(tx.to, Some(CONTRACT.into()));
    assert_eq!(tx.value, Some(U256::from(100_000_000_000_000_000u64)));
    let input = tx.input.input().unwrap();
    assert_eq!(input[..4], hex!("0x48c981e2"));
    let call = PaymentGateway::sendEtherCall::abi_decode(input).unwrap();
    assert_eq!(call.recipient, address!("0xabcdef1234567890abcdef1234567890abcdef12"));

    assert_eq!(harness.notifier.titles(), ["Transaction Submitted", "ETH Sent Successfully!"]);
    let notifications = harness.notifier.notifications();
    assert_eq!(notifications[0].description, "Transaction hash: 0x11111111...");
    assert_eq!(notifications[1].description, "0.1 ETH sent to 0xabCD...eF12");

    assert!(dashboard.native().form().is_empty());
    assert!(!dashboard.native().is_loading());
    assert_eq!(outcomes.recv().await.unwrap().status, TransferStatus::Submitted);
    assert_eq!(outcomes.recv().await.unwrap().status, TransferStatus::Confirmed);
}

#[tokio::test]
async fn waits_for_receipt() {
    let harness = Harness::connected(
        MockProvider::new()
            .with_response("eth_requestAccounts", json!([ALICE]))
            .with_response("eth_chainId", json!("0xaa36a7"))
            .with_response("eth_getBalance", json!("0x0"))
            .with_response("eth_sendTransaction", json!(TX_HASH))
            .with_response("eth_getTransactionReceipt", json!(null)),
    )
    .await;
    harness.provider.push_response("eth_getTransactionReceipt", json!(null));
    harness.provider.push_response("eth_getTransactionReceipt", receipt(TX_HASH, true));

    harness.dashboard.native().set_form(TransferForm::native(RECIPIENT, "1"));
    harness.dashboard.send_native().await.unwrap();
    assert_eq!(harness.provider.requests_for("eth_getTransactionReceipt").len(), 3);
}

#[tokio::test]
async fn rejected_transaction_keeps_form() {
    let provider = MockProvider::new()
        .with_response("eth_requestAccounts", json!([ALICE]))
        .with_response("eth_chainId", json!("0xaa36a7"))
        .with_response("eth_getBalance", json!("0x0"))
        .with_error(
            "eth_sendTransaction",
            ProviderRpcError::new(4001, "User denied transaction signature."),
        );
    let harness = Harness::connected(provider).await;
    let form = TransferForm::native(RECIPIENT, "0.1");
    harness.dashboard.native().set_form(form.clone());

    let err = harness.dashboard.send_native().await.unwrap_err();
    assert_eq!(
        err,
        TransferError::SubmissionFailed {
            hash: None,
            reason: "User denied transaction signature.".to_string()
        }
    );
    assert_eq!(harness.dashboard.native().form(), form);
    assert!(!harness.dashboard.native().is_loading());

    let notifications = harness.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Transaction Failed");
    assert!(notifications[0].is_error());
}

#[tokio::test]
async fn reverted_receipt_fails() {
    let provider = MockProvider::new()
        .with_response("eth_requestAccounts", json!([ALICE]))
        .with_response("eth_chainId", json!("0xaa36a7"))
        .with_response("eth_getBalance", json!("0x0"))
        .with_response("eth_sendTransaction", json!(TX_HASH))
        .with_response("eth_getTransactionReceipt", receipt(TX_HASH, false));
    let harness = Harness::connected(provider).await;
    harness.dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));

    let err = harness.dashboard.send_native().await.unwrap_err();
    assert_eq!(
        err,
        TransferError::SubmissionFailed {
            hash: Some(TX_HASH),
            reason: "transaction execution reverted".to_string()
        }
    );
    assert_eq!(harness.notifier.titles(), ["Transaction Submitted", "Transaction Failed"]);
    assert!(!harness.dashboard.native().form().is_empty());
}

#[tokio::test]
async fn requires_connection() {
    let harness = Harness::new(wallet());
    harness.dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));

    assert_eq!(harness.dashboard.send_native().await.unwrap_err(), TransferError::NotConnected);
    assert!(harness.provider.requests().is_empty());
    assert_eq!(harness.notifier.titles(), ["Connection Required"]);

    // Disconnecting makes the next submission fail the same way
    harness.dashboard.connect().await.unwrap();
    harness.dashboard.disconnect();
    harness.provider.clear_requests();
    assert_eq!(harness.dashboard.send_native().await.unwrap_err(), TransferError::NotConnected);
    assert!(harness.provider.requests().is_empty());
}

#[tokio::test]
async fn requires_contract_address() {
    let config = dpay_config::Config { contract_address: None, ..config() };
    let harness = Harness::with_config(wallet(), config);
    harness.dashboard.connect().await.unwrap();
    harness.provider.clear_requests();

    harness.dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));
    assert_eq!(harness.dashboard.send_native().await.unwrap_err(), TransferError::NotConnected);
    assert!(harness.provider.requests().is_empty());
}

#[tokio::test]
async fn invalid_forms_make_no_requests() {
    let harness = Harness::connected(wallet()).await;
    let cases = [
        (TransferForm::native("", "0.1"), "Missing Information"),
        (TransferForm::native("0x123", "0.1"), "Invalid Address"),
        (TransferForm::native(RECIPIENT, "0"), "Invalid Amount"),
        (TransferForm::native(RECIPIENT, "0.0000000000000000001"), "Invalid Amount"),
    ];
    for (form, title) in cases {
        harness.dashboard.native().set_form(form.clone());
        assert!(harness.dashboard.send_native().await.is_err(), "{form:?}");
        assert_eq!(harness.notifier.take()[0].title, title, "{form:?}");
        // The form survives the failure
        assert_eq!(harness.dashboard.native().form(), form);
    }

    harness.dashboard.token().set_form(TransferForm::token("0xnot-a-token", RECIPIENT, "1"));
    assert!(harness.dashboard.send_token().await.is_err());
    assert_eq!(harness.notifier.take()[0].title, "Invalid Token Address");

    harness.dashboard.token().set_form(TransferForm::token(TOKEN, "0x123", "1"));
    assert!(harness.dashboard.send_token().await.is_err());
    assert_eq!(harness.notifier.take()[0].title, "Invalid Recipient Address");

    assert!(harness.provider.requests().is_empty());
}

#[tokio::test]
async fn sends_token_with_queried_decimals() {
    let harness =
        Harness::connected(wallet().with_response("eth_call", json!(encoded_decimals(6)))).await;

    harness.dashboard.token().set_form(TransferForm::token(TOKEN, RECIPIENT, "100"));
    harness.dashboard.send_token().await.unwrap();

    let calls = harness.provider.requests_for("eth_call");
    assert_eq!(calls.len(), 1);
    let query: TransactionRequest = serde_json::from_value(calls[0].params[0].clone()).unwrap();
    assert_eq!(query.input.input().unwrap()[..], IERC20Metadata::decimalsCall::SELECTOR);

    let tx: TransactionRequest = serde_json::from_value(harness.sent_transaction()).unwrap();
    assert_eq!(tx.value, Some(U256::ZERO));
    let call = PaymentGateway::sendERC20Call::abi_decode(tx.input.input().unwrap()).unwrap();
    assert_eq!(call.token, address!("0x1234567890abcdef1234567890abcdef12345678"));
    assert_eq!(call.amount, U256::from(100_000_000u64));

    assert_eq!(harness.notifier.titles(), ["Transaction Submitted", "Token Sent Successfully!"]);
    assert_eq!(harness.notifier.notifications()[1].description, "100 tokens sent to 0xabCD...eF12");
    assert!(harness.dashboard.token().form().is_empty());
}

#[tokio::test]
async fn token_decimals_fall_back_to_18() {
    // `eth_call` is unscripted, so the decimals query fails
    let harness = Harness::connected(wallet()).await;
    harness.dashboard.token().set_form(TransferForm::token(TOKEN, RECIPIENT, "1.5"));
    harness.dashboard.send_token().await.unwrap();

    let tx: TransactionRequest = serde_json::from_value(harness.sent_transaction()).unwrap();
    let call = PaymentGateway::sendERC20Call::abi_decode(tx.input.input().unwrap()).unwrap();
    assert_eq!(call.amount, U256::from(1_500_000_000_000_000_000u64));
}

#[tokio::test]
async fn configured_decimals_skip_query() {
    let config = dpay_config::Config { token_decimals: Some(2), ..config() };
    let harness = Harness::with_config(wallet(), config);
    harness.dashboard.connect().await.unwrap();
    harness.dashboard.token().set_form(TransferForm::token(TOKEN, RECIPIENT, "1.25"));
    harness.dashboard.send_token().await.unwrap();

    assert!(harness.provider.requests_for("eth_call").is_empty());
    let tx: TransactionRequest = serde_json::from_value(harness.sent_transaction()).unwrap();
    let call = PaymentGateway::sendERC20Call::abi_decode(tx.input.input().unwrap()).unwrap();
    assert_eq!(call.amount, U256::from(125));
}

#[tokio::test]
async fn native_and_token_transfers_run_concurrently() {
    let provider = MockProvider::new()
        .with_response("eth_requestAccounts", json!([ALICE]))
        .with_response("eth_chainId", json!("0xaa36a7"))
        .with_response("eth_getBalance", json!("0x0"))
        .with_response("eth_sendTransaction", json!(TX_HASH))
        .with_response("eth_getTransactionReceipt", receipt(TX_HASH, true))
        .with_response("eth_call", json!(encoded_decimals(18)))
        .with_delay("eth_sendTransaction", Duration::from_millis(50));
    let harness = Harness::connected(provider).await;
    let dashboard = harness.dashboard.clone();

    dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));
    dashboard.token().set_form(TransferForm::token(TOKEN, RECIPIENT, "5"));
    let (native, token) = tokio::join!(dashboard.send_native(), dashboard.send_token());
    native.unwrap();
    token.unwrap();

    assert_eq!(harness.provider.requests_for("eth_sendTransaction").len(), 2);
    let titles = harness.notifier.titles();
    assert!(titles.contains(&"ETH Sent Successfully!".to_string()), "{titles:?}");
    assert!(titles.contains(&"Token Sent Successfully!".to_string()), "{titles:?}");
    assert!(dashboard.native().form().is_empty());
    assert!(dashboard.token().form().is_empty());
}

#[tokio::test]
async fn loading_while_in_flight() {
    let provider = wallet().with_delay("eth_sendTransaction", Duration::from_millis(100));
    let harness = Harness::connected(provider).await;
    let dashboard = harness.dashboard.clone();
    dashboard.native().set_form(TransferForm::native(RECIPIENT, "0.1"));

    let handle = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.send_native().await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(dashboard.native().is_loading());
    assert!(!dashboard.token().is_loading());

    handle.await.unwrap().unwrap();
    assert!(!dashboard.native().is_loading());
}

#[tokio::test]
async fn spawned_transfer_holds_the_form() {
    let provider = wallet().with_delay("eth_sendTransaction", Duration::from_millis(50));
    let harness = Harness::connected(provider).await;
    let dashboard = &harness.dashboard;

    let first = dashboard.spawn_transfer(AssetKind::Native, TransferForm::native(RECIPIENT, "0.1"));
    let second = dashboard.spawn_transfer(AssetKind::Native, TransferForm::native(TOKEN, "7"));
    assert!(second.is_none());
    assert!(!dashboard.native().try_begin(TransferForm::native(TOKEN, "7")));
    assert_eq!(dashboard.native().form(), TransferForm::native(RECIPIENT, "0.1"));

    // The other form is independent
    let incomplete = TransferForm::token(TOKEN, RECIPIENT, "");
    let token = dashboard.spawn_transfer(AssetKind::Token, incomplete);
    assert_eq!(token.unwrap().await.unwrap().unwrap_err(), TransferError::MissingFields);
    assert!(!dashboard.token().is_loading());

    let outcome = first.unwrap().await.unwrap().unwrap();
    assert_eq!(outcome.status, TransferStatus::Confirmed);
    let tx: TransactionRequest = serde_json::from_value(harness.sent_transaction()).unwrap();
    assert_eq!(tx.value, Some(U256::from(100_000_000_000_000_000u64)));
    assert!(!dashboard.native().is_loading());

    // Released once confirmed
    let again = dashboard.spawn_transfer(AssetKind::Native, TransferForm::native(RECIPIENT, "x"));
    assert_eq!(again.unwrap().await.unwrap().unwrap_err().notification().title, "Invalid Amount");
    assert!(!dashboard.native().is_loading());
}
