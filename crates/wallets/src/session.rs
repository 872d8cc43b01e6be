//! Wallet connection lifecycle.
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!       ^             |             |
//!       +-------------+-------------+  (failure, disconnect, accounts emptied, chain changed)
//! ```

use crate::{
    error::WalletError,
    provider::{ProviderEvent, WalletProvider, WalletProviderExt},
};
use alloy_primitives::{Address, U256};
use dpay_common::{fmt::short_address, units::format_native_balance};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::{broadcast, watch};

/// An active wallet connection.
///
/// Sessions are immutable. Account switches replace the whole session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Address,
    /// Native balance in wei, read at connect time.
    pub balance: U256,
    pub chain_id: u64,
}

impl WalletSession {
    /// Balance in ether with four decimals.
    pub fn display_balance(&self) -> String {
        format_native_balance(self.balance)
    }

    pub fn short_address(&self) -> String {
        short_address(&self.address)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Arc<WalletSession>),
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn session(&self) -> Option<Arc<WalletSession>> {
        match self {
            Self::Connected(session) => Some(session.clone()),
            _ => None,
        }
    }
}

/// Lifecycle notifications delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was established, or replaced after an account switch.
    Connected(Arc<WalletSession>),
    Disconnected,
    /// The wallet switched networks. The session is already cleared when this is delivered.
    ChainChanged(u64),
}

/// Owns the wallet session and keeps it in sync with the provider.
///
/// Connects and account switches suspend on the wallet. Their result is only applied if no reset
/// (disconnect, emptied accounts, chain change or a newer connect) happened in the meantime.
#[derive(Debug)]
pub struct SessionManager {
    provider: Arc<dyn WalletProvider>,
    expected_chain: Option<u64>,
    state: watch::Sender<SessionState>,
    /// Bumped on every transition that invalidates in-flight work. Only changed while holding the
    /// `state` lock.
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            expected_chain: None,
            state: watch::Sender::new(SessionState::Disconnected),
            generation: AtomicU64::new(0),
            events: broadcast::channel(16).0,
        }
    }

    /// Logs a warning when the wallet connects on a different chain.
    pub fn with_expected_chain(mut self, chain_id: u64) -> Self {
        self.expected_chain = Some(chain_id);
        self
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The active session, if connected.
    pub fn session(&self) -> Option<Arc<WalletSession>> {
        self.state.borrow().session()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Requests account access and establishes a session.
    ///
    /// Suspends until the user approves or rejects the request in the wallet. Fails with
    /// [`WalletError::Interrupted`] if the session was reset while waiting.
    pub async fn connect(&self) -> Result<Arc<WalletSession>, WalletError> {
        if !self.provider.is_available().await {
            return Err(WalletError::ProviderUnavailable);
        }

        let mut started = None;
        self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Connecting) {
                return false;
            }
            let previous = std::mem::replace(state, SessionState::Connecting);
            started = Some((previous, self.bump_generation()));
            true
        });
        let Some((previous, generation)) = started else {
            return Err(WalletError::ConnectionPending);
        };

        debug!("requesting wallet accounts");
        match self.establish().await {
            Ok(session) => {
                if !self.settle_connect(generation, SessionState::Connected(session.clone())) {
                    debug!(
                        address = %session.address,
                        "wallet changed while connecting, dropping session"
                    );
                    return Err(WalletError::Interrupted);
                }
                info!(address = %session.address, chain_id = session.chain_id, "wallet connected");
                let _ = self.events.send(SessionEvent::Connected(session.clone()));
                Ok(session)
            }
            Err(err) => {
                warn!(%err, "wallet connection failed");
                self.settle_connect(generation, previous);
                Err(err)
            }
        }
    }

    async fn establish(&self) -> Result<Arc<WalletSession>, WalletError> {
        let accounts =
            self.provider.request_accounts().await.map_err(WalletError::from_provider)?;
        let Some(&address) = accounts.first() else {
            return Err(WalletError::ConnectionRejected("No accounts available".to_string()));
        };
        let chain_id = self.provider.chain_id().await.map_err(WalletError::from_provider)?;
        if let Some(expected) = self.expected_chain
            && expected != chain_id
        {
            warn!(chain_id, expected, "wallet is connected to an unexpected chain");
        }
        let balance =
            self.provider.get_balance(address).await.map_err(WalletError::from_provider)?;
        Ok(Arc::new(WalletSession { address, balance, chain_id }))
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Ends the connect started at `generation` with `next`, unless it was superseded.
    fn settle_connect(&self, generation: u64, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            let current = matches!(state, SessionState::Connecting)
                && self.generation.load(Ordering::Acquire) == generation;
            if current {
                *state = next;
            }
            current
        })
    }

    /// Replaces the state, invalidating pending connects and account switches.
    fn reset(&self) -> SessionState {
        let mut previous = SessionState::Disconnected;
        self.state.send_modify(|state| {
            self.bump_generation();
            previous = std::mem::replace(state, SessionState::Disconnected);
        });
        previous
    }

    /// Clears the session. Wallets have no programmatic disconnect, so the provider is not called.
    pub fn disconnect(&self) {
        if self.reset().is_connected() {
            info!("wallet disconnected");
        }
        let _ = self.events.send(SessionEvent::Disconnected);
    }

    /// Applies a provider notification, returning the transition it caused.
    pub async fn handle_event(&self, event: ProviderEvent) -> Option<SessionEvent> {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match (self.state(), accounts.first()) {
                (SessionState::Disconnected, _) => {
                    trace!("ignoring account change while disconnected");
                    None
                }
                (_, None) => {
                    debug!("wallet exposed no accounts");
                    self.disconnect();
                    Some(SessionEvent::Disconnected)
                }
                // a pending connect reads the accounts itself
                (SessionState::Connecting, Some(_)) => None,
                (SessionState::Connected(current), Some(&address)) => {
                    if address == current.address {
                        None
                    } else {
                        self.switch_account(current, address).await
                    }
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                info!(chain_id, "wallet switched chain, resetting session");
                self.reset();
                let event = SessionEvent::ChainChanged(chain_id);
                let _ = self.events.send(event.clone());
                Some(event)
            }
        }
    }

    /// Replaces `current` with a session for `address`. Returns `None` if `current` stopped being
    /// the active session while the balance was read.
    async fn switch_account(
        &self,
        current: Arc<WalletSession>,
        address: Address,
    ) -> Option<SessionEvent> {
        let generation = self.generation.load(Ordering::Acquire);
        let balance = self.provider.get_balance(address).await;

        let (next, event) = match balance {
            Ok(balance) => {
                let session =
                    Arc::new(WalletSession { address, balance, chain_id: current.chain_id });
                (SessionState::Connected(session.clone()), SessionEvent::Connected(session))
            }
            Err(err) => {
                warn!(%address, %err, "failed to read balance of switched account");
                (SessionState::Disconnected, SessionEvent::Disconnected)
            }
        };
        let applied = self.state.send_if_modified(|state| {
            let unchanged = matches!(state, SessionState::Connected(s) if Arc::ptr_eq(s, &current))
                && self.generation.load(Ordering::Acquire) == generation;
            if unchanged {
                self.bump_generation();
                *state = next;
            }
            unchanged
        });
        if !applied {
            debug!(%address, "session changed while switching account");
            return None;
        }

        let connected = matches!(event, SessionEvent::Connected(_));
        info!(%address, connected, "wallet switched account");
        let _ = self.events.send(event.clone());
        Some(event)
    }
}
