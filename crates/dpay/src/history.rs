//! Past transfers of the connected account.

use alloy_primitives::{Address, TxHash, address, b256};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dpay_common::{
    AssetKind,
    fmt::{relative_time, short_address},
};
use dpay_config::Config;
use dpay_wallets::WalletSession;
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

/// Text shown when there is nothing to list.
pub const EMPTY_HISTORY: &str = "No transactions yet";

/// A transfer made through the payment contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tx_hash: TxHash,
    pub kind: AssetKind,
    pub recipient: Address,
    /// Human amount, e.g. `0.5`.
    pub amount: String,
    pub timestamp: DateTime<Utc>,
}

/// Supplies the transfers of a session's account.
///
/// An implementation backed by the contract's `EtherSent`/`TokenSent` logs or an indexer can
/// replace [`MockHistory`] without touching callers.
#[async_trait]
pub trait HistorySource: Send + Sync + fmt::Debug {
    async fn fetch_history(&self, session: &WalletSession) -> eyre::Result<Vec<HistoryEntry>>;
}

/// Placeholder history: one native and one token transfer, aged relative to the fetch time.
#[derive(Clone, Debug, Default)]
pub struct MockHistory {
    now: Option<DateTime<Utc>>,
}

impl MockHistory {
    /// Pins the clock, so entry ages are deterministic.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    pub fn entries(now: DateTime<Utc>) -> Vec<HistoryEntry> {
        vec![
            HistoryEntry {
                tx_hash: b256!(
                    "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"
                ),
                kind: AssetKind::Native,
                recipient: address!("0xabcdef1234567890abcdef1234567890abcdef12"),
                amount: "0.5".to_string(),
                timestamp: now - Duration::minutes(30),
            },
            HistoryEntry {
                tx_hash: b256!(
                    "0xabcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890"
                ),
                kind: AssetKind::Token,
                recipient: address!("0x1234567890abcdef1234567890abcdef12345678"),
                amount: "100".to_string(),
                timestamp: now - Duration::hours(2),
            },
        ]
    }
}

#[async_trait]
impl HistorySource for MockHistory {
    async fn fetch_history(&self, _session: &WalletSession) -> eyre::Result<Vec<HistoryEntry>> {
        Ok(Self::entries(self.now.unwrap_or_else(Utc::now)))
    }
}

/// One rendered history row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    /// `ETH` or `Token`.
    pub badge: &'static str,
    pub amount: String,
    pub to: String,
    pub age: String,
    pub url: String,
}

impl fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}  {}  {}  {}", self.badge, self.amount, self.to, self.age, self.url)
    }
}

/// Holds and renders the fetched history.
///
/// Only the latest refresh is stored: a fetch that completes after [`clear`](Self::clear) or
/// after a newer refresh started is dropped.
#[derive(Debug)]
pub struct HistoryViewer {
    source: Arc<dyn HistorySource>,
    config: Arc<Config>,
    entries: Mutex<Vec<HistoryEntry>>,
    loading: AtomicBool,
    /// Bumped by every refresh and clear.
    generation: AtomicU64,
}

impl HistoryViewer {
    pub fn new(source: Arc<dyn HistorySource>, config: Arc<Config>) -> Self {
        Self {
            source,
            config,
            entries: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Re-fetches the history of `session`.
    ///
    /// Does nothing without a session or a contract address. A failed fetch is logged and the
    /// current entries are kept.
    pub async fn refresh(&self, session: Option<&WalletSession>) -> Vec<HistoryEntry> {
        let (Some(session), Some(_)) = (session, self.config.contract_address) else {
            return self.entries();
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.loading.store(true, Ordering::Release);
        let fetched = self.source.fetch_history(session).await;

        let mut current = self.entries.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(account = %session.address, "dropping superseded history");
            return current.clone();
        }
        self.loading.store(false, Ordering::Release);
        match fetched {
            Ok(entries) => {
                debug!(account = %session.address, count = entries.len(), "fetched history");
                *current = entries.clone();
                entries
            }
            Err(err) => {
                error!(%err, "failed to fetch transactions");
                current.clone()
            }
        }
    }

    /// Empties the list and drops any refresh still in flight.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.loading.store(false, Ordering::Release);
        entries.clear();
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<HistoryRow> {
        self.entries.lock().iter().map(|entry| self.row(entry, now)).collect()
    }

    fn row(&self, entry: &HistoryEntry, now: DateTime<Utc>) -> HistoryRow {
        let unit = match entry.kind {
            AssetKind::Native => "ETH",
            AssetKind::Token => "Tokens",
        };
        HistoryRow {
            badge: entry.kind.label(),
            amount: format!("{} {unit}", entry.amount),
            to: format!("To: {}", short_address(&entry.recipient)),
            age: relative_time(entry.timestamp, now),
            url: self.config.tx_url(&entry.tx_hash),
        }
    }

    /// Renders all rows, one per line, or [`EMPTY_HISTORY`].
    pub fn render(&self, now: DateTime<Utc>) -> String {
        let rows = self.rows(now);
        if rows.is_empty() {
            return EMPTY_HISTORY.to_string();
        }
        rows.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    }
}
