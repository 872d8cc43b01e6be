//! Native and token transfers through the payment contract.
//!
//! A submission validates the form, converts the amount to base units and asks the wallet to send
//! the contract call. Once the wallet returns a hash the transfer is reported as
//! [`TransferStatus::Submitted`], then receipts are polled until it is confirmed or fails.

use crate::notify::{Notification, Notifier};
use alloy_primitives::{Address, TxHash, U256};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use dpay_common::{
    AssetKind, IERC20Metadata, PaymentGateway,
    fmt::{short_address, short_hash},
    is_positive_amount, parse_address,
    units::{AmountError, FALLBACK_TOKEN_DECIMALS, NATIVE_DECIMALS, to_base_units},
};
use dpay_config::Config;
use dpay_wallets::{ProviderError, WalletProvider, WalletProviderExt, WalletSession};
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::broadcast;

/// Raw form input, exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferForm {
    /// Token contract address. Ignored for native transfers.
    pub token: String,
    pub recipient: String,
    pub amount: String,
}

impl TransferForm {
    pub fn native(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self { token: String::new(), recipient: recipient.into(), amount: amount.into() }
    }

    pub fn token(
        token: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self { token: token.into(), recipient: recipient.into(), amount: amount.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty() && self.recipient.is_empty() && self.amount.is_empty()
    }
}

/// Which address field failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressField {
    Token,
    Recipient,
}

/// A validated transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub kind: AssetKind,
    /// Set for token transfers only.
    pub token: Option<Address>,
    pub recipient: Address,
    /// Human amount, e.g. `0.1`.
    pub amount: String,
}

impl TransferRequest {
    /// Validates a form in the order the user sees the checks: missing fields, token address,
    /// recipient address, amount.
    pub fn from_form(kind: AssetKind, form: &TransferForm) -> Result<Self, TransferError> {
        let (token, recipient, amount) =
            (form.token.trim(), form.recipient.trim(), form.amount.trim());
        let token_missing = kind == AssetKind::Token && token.is_empty();
        if token_missing || recipient.is_empty() || amount.is_empty() {
            return Err(TransferError::MissingFields);
        }

        let token = match kind {
            AssetKind::Native => None,
            AssetKind::Token => Some(parse_address(token).ok_or(TransferError::InvalidAddress {
                kind,
                field: AddressField::Token,
            })?),
        };
        let recipient = parse_address(recipient)
            .ok_or(TransferError::InvalidAddress { kind, field: AddressField::Recipient })?;
        if !is_positive_amount(amount) {
            return Err(TransferError::InvalidAmount(AMOUNT_NOT_POSITIVE.to_string()));
        }

        Ok(Self { kind, token, recipient, amount: amount.to_string() })
    }

    /// Encodes the payment contract call and the value attached to it.
    pub fn calldata(&self, base_units: U256) -> (Vec<u8>, U256) {
        match self.token {
            None => (
                PaymentGateway::sendEtherCall { recipient: self.recipient }.abi_encode(),
                base_units,
            ),
            Some(token) => (
                PaymentGateway::sendERC20Call {
                    token,
                    recipient: self.recipient,
                    amount: base_units,
                }
                .abi_encode(),
                U256::ZERO,
            ),
        }
    }
}

const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than 0";

/// Why a submission did not go through.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Please connect your wallet first")]
    NotConnected,
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("invalid {field:?} address")]
    InvalidAddress { kind: AssetKind, field: AddressField },
    #[error("{0}")]
    InvalidAmount(String),
    #[error("{reason}")]
    SubmissionFailed { hash: Option<TxHash>, reason: String },
}

impl TransferError {
    /// The notification shown for this error.
    pub fn notification(&self) -> Notification {
        match self {
            Self::NotConnected => Notification::error("Connection Required", self.to_string()),
            Self::MissingFields => Notification::error("Missing Information", self.to_string()),
            Self::InvalidAddress { field: AddressField::Token, .. } => Notification::error(
                "Invalid Token Address",
                "Please enter a valid token contract address",
            ),
            Self::InvalidAddress { kind, field: AddressField::Recipient } => {
                let title = match kind {
                    AssetKind::Native => "Invalid Address",
                    AssetKind::Token => "Invalid Recipient Address",
                };
                Notification::error(title, "Please enter a valid Ethereum address")
            }
            Self::InvalidAmount(reason) => Notification::error("Invalid Amount", reason.clone()),
            Self::SubmissionFailed { reason, .. } => {
                Notification::error("Transaction Failed", reason.clone())
            }
        }
    }

    fn submission(hash: Option<TxHash>, kind: AssetKind, err: &ProviderError) -> Self {
        let reason = err
            .reason()
            .or_else(|| (!matches!(err, ProviderError::Rpc(_))).then(|| err.to_string()))
            .unwrap_or_else(|| generic_failure(kind).to_string());
        Self::SubmissionFailed { hash, reason }
    }
}

fn generic_failure(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Native => "Failed to send ETH",
        AssetKind::Token => "Failed to send token",
    }
}

impl From<AmountError> for TransferError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::NotPositive(_) => Self::InvalidAmount(AMOUNT_NOT_POSITIVE.to_string()),
            err => Self::InvalidAmount(err.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    Submitted,
    Confirmed,
    Failed,
}

/// Progress of a submitted transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub status: TransferStatus,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
}

impl TransferOutcome {
    fn submitted(hash: TxHash) -> Self {
        Self { status: TransferStatus::Submitted, tx_hash: Some(hash), error: None }
    }

    fn confirmed(hash: TxHash) -> Self {
        Self { status: TransferStatus::Confirmed, tx_hash: Some(hash), error: None }
    }

    fn failed(hash: Option<TxHash>, reason: String) -> Self {
        Self { status: TransferStatus::Failed, tx_hash: hash, error: Some(reason) }
    }
}

/// One transfer form and its submission workflow.
#[derive(Debug)]
pub struct TransferSubmitter {
    kind: AssetKind,
    provider: Arc<dyn WalletProvider>,
    notifier: Arc<dyn Notifier>,
    contract: Option<Address>,
    token_decimals: Option<u8>,
    poll_interval: Duration,
    confirmations: u64,
    form: Mutex<TransferForm>,
    loading: AtomicBool,
    outcomes: broadcast::Sender<TransferOutcome>,
}

impl TransferSubmitter {
    pub fn new(
        kind: AssetKind,
        config: &Config,
        provider: Arc<dyn WalletProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            kind,
            provider,
            notifier,
            contract: config.contract_address,
            token_decimals: config.token_decimals,
            poll_interval: config.poll_interval(),
            confirmations: config.confirmations.max(1),
            form: Mutex::new(TransferForm::default()),
            loading: AtomicBool::new(false),
            outcomes: broadcast::channel(16).0,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn form(&self) -> TransferForm {
        self.form.lock().clone()
    }

    pub fn set_form(&self, form: TransferForm) {
        *self.form.lock() = form;
    }

    pub fn clear_form(&self) {
        *self.form.lock() = TransferForm::default();
    }

    /// Whether a submission is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Every [`TransferOutcome`] this submitter produces, including `Submitted`.
    pub fn subscribe(&self) -> broadcast::Receiver<TransferOutcome> {
        self.outcomes.subscribe()
    }

    /// Submits the current form through `session`.
    ///
    /// Returns the `Confirmed` outcome. Any error is also shown as a notification; a failed
    /// submission leaves the form untouched.
    pub async fn submit(
        &self,
        session: Option<&WalletSession>,
    ) -> Result<TransferOutcome, TransferError> {
        let result = self.try_submit(session, None).await;
        self.report(result)
    }

    /// Marks the submitter busy and loads `form` into it, unless a submission is already in
    /// flight. On `false` the pending form is left untouched.
    ///
    /// A successful claim must be followed by [`submit_claimed`](Self::submit_claimed).
    pub fn try_begin(&self, form: TransferForm) -> bool {
        let claimed =
            self.loading.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);
        if claimed.is_err() {
            return false;
        }
        self.set_form(form);
        true
    }

    /// Submits the form loaded by [`try_begin`](Self::try_begin) and releases the claim.
    pub async fn submit_claimed(
        &self,
        session: Option<&WalletSession>,
    ) -> Result<TransferOutcome, TransferError> {
        let claim = LoadingGuard(&self.loading);
        let result = self.try_submit(session, Some(claim)).await;
        self.report(result)
    }

    fn report(
        &self,
        result: Result<TransferOutcome, TransferError>,
    ) -> Result<TransferOutcome, TransferError> {
        if let Err(err) = &result {
            if let TransferError::SubmissionFailed { hash, reason } = err {
                error!(kind = %self.kind, tx_hash = ?hash, %reason, "transfer failed");
                self.publish(TransferOutcome::failed(*hash, reason.clone()));
            } else {
                debug!(kind = %self.kind, %err, "transfer rejected");
            }
            self.notifier.notify(err.notification());
        }
        result
    }

    async fn try_submit(
        &self,
        session: Option<&WalletSession>,
        claim: Option<LoadingGuard<'_>>,
    ) -> Result<TransferOutcome, TransferError> {
        let (Some(session), Some(contract)) = (session, self.contract) else {
            return Err(TransferError::NotConnected);
        };
        let form = self.form();
        let request = TransferRequest::from_form(self.kind, &form)?;

        let _loading = claim.unwrap_or_else(|| LoadingGuard::new(&self.loading));
        let decimals = self.decimals(request.token).await;
        let base_units = to_base_units(&request.amount, decimals)?;
        let (input, value) = request.calldata(base_units);
        let tx = TransactionRequest::default()
            .from(session.address)
            .to(contract)
            .value(value)
            .input(TransactionInput::both(input.into()));

        debug!(
            kind = %self.kind,
            %contract,
            recipient = %request.recipient,
            %base_units,
            "submitting transfer"
        );
        let hash = self
            .provider
            .send_transaction(&tx)
            .await
            .map_err(|err| TransferError::submission(None, self.kind, &err))?;

        info!(kind = %self.kind, tx_hash = %hash, "transfer submitted");
        self.notifier.notify(Notification::info(
            "Transaction Submitted",
            format!("Transaction hash: {}", short_hash(&hash)),
        ));
        self.publish(TransferOutcome::submitted(hash));

        self.wait_for_confirmation(hash).await?;

        info!(kind = %self.kind, tx_hash = %hash, "transfer confirmed");
        self.notifier.notify(self.success(&request));
        self.clear_form();
        let outcome = TransferOutcome::confirmed(hash);
        self.publish(outcome.clone());
        Ok(outcome)
    }

    /// Polls for the receipt until it has the configured number of confirmations.
    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<(), TransferError> {
        let failed = |err: ProviderError| TransferError::submission(Some(hash), self.kind, &err);
        loop {
            if let Some(receipt) = self.provider.transaction_receipt(hash).await.map_err(failed)? {
                if !receipt.succeeded() {
                    return Err(TransferError::SubmissionFailed {
                        hash: Some(hash),
                        reason: "transaction execution reverted".to_string(),
                    });
                }
                if self.confirmations <= 1 {
                    return Ok(());
                }
                let head = self.provider.block_number().await.map_err(failed)?;
                if receipt.confirmations(head) >= self.confirmations {
                    return Ok(());
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Decimal places used to scale the amount.
    async fn decimals(&self, token: Option<Address>) -> u8 {
        let Some(token) = token else { return NATIVE_DECIMALS };
        if let Some(decimals) = self.token_decimals {
            return decimals;
        }

        let call = TransactionRequest::default()
            .to(token)
            .input(TransactionInput::both(IERC20Metadata::decimalsCall {}.abi_encode().into()));
        let decimals = match self.provider.call(&call).await {
            Ok(data) => IERC20Metadata::decimalsCall::abi_decode_returns(&data)
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        decimals.unwrap_or_else(|err| {
            warn!(
                %token,
                %err,
                "could not read token decimals, assuming {FALLBACK_TOKEN_DECIMALS}"
            );
            FALLBACK_TOKEN_DECIMALS
        })
    }

    fn success(&self, request: &TransferRequest) -> Notification {
        let to = short_address(&request.recipient);
        match self.kind {
            AssetKind::Native => Notification::info(
                "ETH Sent Successfully!",
                format!("{} ETH sent to {to}", request.amount),
            ),
            AssetKind::Token => Notification::info(
                "Token Sent Successfully!",
                format!("{} tokens sent to {to}", request.amount),
            ),
        }
    }

    fn publish(&self, outcome: TransferOutcome) {
        let _ = self.outcomes.send(outcome);
    }
}

/// Holds the loading flag for the lifetime of a submission.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
