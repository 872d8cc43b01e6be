//! # dpay
//!
//! Send native currency and fungible tokens through a payment contract, signing with a browser
//! wallet.
//!
//! The [`Dashboard`] wires together the wallet session, one [`TransferSubmitter`] per asset kind
//! and the [`HistoryViewer`].

#[macro_use]
extern crate tracing;

pub mod dashboard;
pub mod history;
pub mod notify;
pub mod transfer;

pub use dashboard::Dashboard;
pub use history::{HistoryEntry, HistorySource, HistoryViewer, MockHistory};
pub use notify::{Notification, Notifier, RecordingNotifier, Variant};
pub use transfer::{
    TransferError, TransferForm, TransferOutcome, TransferRequest, TransferStatus,
    TransferSubmitter,
};
