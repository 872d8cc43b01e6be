//! Helpers for formatting addresses, hashes and timestamps for display.

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};

/// Shortens an address to `0x1234...abcd` using its checksummed form.
///
/// # Examples
///
/// ```
/// use alloy_primitives::address;
/// use dpay_common::fmt::short_address;
///
/// let addr = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
/// assert_eq!(short_address(&addr), "0x7099...79C8");
/// ```
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Shortens a transaction hash to its first ten characters followed by `...`.
pub fn short_hash(hash: &B256) -> String {
    let full = format!("{hash:#x}");
    format!("{}...", &full[..10])
}

/// Formats the age of `then` relative to `now`: `3d ago`, `2h ago`, `30m ago` or `Just now`.
///
/// Timestamps in the future render as `Just now`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let (days, hours, minutes) = (elapsed.num_days(), elapsed.num_hours(), elapsed.num_minutes());
    if days > 0 {
        format!("{days}d ago")
    } else if hours > 0 {
        format!("{hours}h ago")
    } else if minutes > 0 {
        format!("{minutes}m ago")
    } else {
        "Just now".to_string()
    }
}
