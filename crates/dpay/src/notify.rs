//! Transient user notifications.

use dpay_wallets::WalletError;
use parking_lot::Mutex;
use std::fmt;

/// Visual weight of a [`Notification`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Default,
    /// Failures the user has to act on.
    Destructive,
}

/// A short, dismissible message with a title and a description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: Variant::Default }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), variant: Variant::Destructive }
    }

    pub fn is_error(&self) -> bool {
        self.variant == Variant::Destructive
    }

    /// The notification shown for a failed connect, if any.
    pub fn for_wallet_error(err: &WalletError) -> Option<Self> {
        match err {
            WalletError::ProviderUnavailable => {
                Some(Self::error("MetaMask Required", err.to_string()))
            }
            WalletError::ConnectionRejected(reason) => {
                Some(Self::error("Connection Failed", reason.clone()))
            }
            WalletError::ConnectionPending | WalletError::Interrupted => None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Where notifications are shown.
pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, notification: Notification);
}

/// Keeps every notification in order of arrival.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.seen.lock().iter().map(|n| n.title.clone()).collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
