//! The payment page: wallet connection, both transfer forms and the history list.

use crate::{
    history::{HistorySource, HistoryViewer, MockHistory},
    notify::{Notification, Notifier},
    transfer::{TransferError, TransferForm, TransferOutcome, TransferSubmitter},
};
use alloy_primitives::{Address, U256};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use dpay_common::{AssetKind, PaymentGateway};
use dpay_config::Config;
use dpay_wallets::{
    ProviderEvent, SessionEvent, SessionManager, WalletError, WalletProvider, WalletProviderExt,
    WalletSession,
};
use std::sync::{Arc, Weak};
use tokio::{sync::broadcast, task::JoinHandle};

/// Composes the session manager, the two transfer submitters and the history viewer.
///
/// The active [`WalletSession`] is read from the session manager at the moment each action runs,
/// so components never hold on to a stale session.
#[derive(Debug)]
pub struct Dashboard {
    config: Arc<Config>,
    sessions: SessionManager,
    native: TransferSubmitter,
    token: TransferSubmitter,
    history: HistoryViewer,
    notifier: Arc<dyn Notifier>,
}

impl Dashboard {
    /// Creates a dashboard showing placeholder history.
    pub fn new(
        config: Config,
        provider: Arc<dyn WalletProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_history_source(config, provider, notifier, Arc::new(MockHistory::default()))
    }

    pub fn with_history_source(
        config: Config,
        provider: Arc<dyn WalletProvider>,
        notifier: Arc<dyn Notifier>,
        history: Arc<dyn HistorySource>,
    ) -> Self {
        let config = Arc::new(config);
        let submitter =
            |kind| TransferSubmitter::new(kind, &config, provider.clone(), notifier.clone());
        Self {
            native: submitter(AssetKind::Native),
            token: submitter(AssetKind::Token),
            history: HistoryViewer::new(history, config.clone()),
            sessions: SessionManager::new(provider.clone()).with_expected_chain(config.chain_id),
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn session(&self) -> Option<Arc<WalletSession>> {
        self.sessions.session()
    }

    pub fn native(&self) -> &TransferSubmitter {
        &self.native
    }

    pub fn token(&self) -> &TransferSubmitter {
        &self.token
    }

    pub fn history(&self) -> &HistoryViewer {
        &self.history
    }

    /// Connects the wallet and loads the history of the connected account.
    pub async fn connect(&self) -> Result<Arc<WalletSession>, WalletError> {
        match self.sessions.connect().await {
            Ok(session) => {
                self.notifier.notify(Notification::info(
                    "Wallet Connected",
                    format!("Connected to {}", session.short_address()),
                ));
                self.history.refresh(Some(&session)).await;
                Ok(session)
            }
            Err(err) => {
                if let Some(notification) = Notification::for_wallet_error(&err) {
                    self.notifier.notify(notification);
                }
                Err(err)
            }
        }
    }

    pub fn disconnect(&self) {
        self.sessions.disconnect();
        self.on_disconnected();
    }

    fn on_disconnected(&self) {
        self.history.clear();
        self.notifier.notify(Notification::info(
            "Wallet Disconnected",
            "Your wallet has been disconnected",
        ));
    }

    /// Submits the native transfer form.
    pub async fn send_native(&self) -> Result<TransferOutcome, TransferError> {
        self.native.submit(self.session().as_deref()).await
    }

    /// Submits the token transfer form.
    pub async fn send_token(&self) -> Result<TransferOutcome, TransferError> {
        self.token.submit(self.session().as_deref()).await
    }

    pub fn submitter(&self, kind: AssetKind) -> &TransferSubmitter {
        match kind {
            AssetKind::Native => &self.native,
            AssetKind::Token => &self.token,
        }
    }

    /// Loads `form` and submits it on a background task.
    ///
    /// Returns `None`, leaving the pending form untouched, while a transfer of the same kind is
    /// still in flight.
    pub fn spawn_transfer(
        self: &Arc<Self>,
        kind: AssetKind,
        form: TransferForm,
    ) -> Option<JoinHandle<Result<TransferOutcome, TransferError>>> {
        if !self.submitter(kind).try_begin(form) {
            return None;
        }
        let this = self.clone();
        Some(tokio::spawn(async move {
            this.submitter(kind).submit_claimed(this.session().as_deref()).await
        }))
    }

    pub async fn refresh_history(&self) {
        self.history.refresh(self.session().as_deref()).await;
    }

    /// Clears all page state after a network switch. In-flight transfers keep running.
    pub fn reload(&self) {
        self.native.clear_form();
        self.token.clear_form();
        self.history.clear();
    }

    /// Applies a wallet notification to the page.
    pub async fn handle_provider_event(&self, event: ProviderEvent) {
        match self.sessions.handle_event(event).await {
            Some(SessionEvent::Connected(session)) => {
                self.history.refresh(Some(&session)).await;
            }
            Some(SessionEvent::Disconnected) => self.on_disconnected(),
            Some(SessionEvent::ChainChanged(chain_id)) => {
                self.reload();
                self.notifier.notify(Notification::info(
                    "Network Changed",
                    format!("Switched to chain {chain_id}, please reconnect"),
                ));
            }
            None => {}
        }
    }

    /// Handles wallet notifications in the background until the dashboard is dropped.
    pub fn spawn_event_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.sessions.provider().subscribe();
        let dashboard: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed wallet notifications");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(dashboard) = dashboard.upgrade() else { break };
                dashboard.handle_provider_event(event).await;
            }
            trace!("wallet event listener stopped");
        })
    }

    /// Native balance held by the payment contract.
    pub async fn contract_balance(&self) -> eyre::Result<U256> {
        let contract = self.contract()?;
        let call = TransactionRequest::default()
            .to(contract)
            .input(TransactionInput::both(PaymentGateway::getBalanceCall {}.abi_encode().into()));
        let data = self.sessions.provider().call(&call).await?;
        Ok(PaymentGateway::getBalanceCall::abi_decode_returns(&data)?)
    }

    fn contract(&self) -> eyre::Result<Address> {
        self.config.contract_address.ok_or_else(|| {
            eyre::eyre!(
                "no payment contract configured; \
                 set `contract_address` in dpay.toml or DPAY_CONTRACT_ADDRESS"
            )
        })
    }
}
