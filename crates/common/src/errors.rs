//! Helpers for rendering error chains to users.

use std::error::Error;

/// Collects the deduplicated messages of an error and all of its sources.
///
/// Sources whose message is already contained in the previous entry are dropped, collapsing the
/// common `wrapper: inner; inner` pattern to `wrapper: inner`.
pub fn dedup_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    dedup_chain_with(error, |cause| cause.to_string())
}

/// Same as [`dedup_chain`], rendering each cause with `render`.
pub fn dedup_chain_with(
    error: &(dyn Error + 'static),
    render: impl Fn(&(dyn Error + 'static)) -> String,
) -> Vec<String> {
    let mut causes: Vec<String> =
        eyre::Chain::new(error).map(|cause| render(cause).trim().to_string()).collect();
    causes.dedup_by(|next, prev| prev.contains(next.as_str()));
    causes
}
