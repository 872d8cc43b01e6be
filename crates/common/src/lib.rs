//! Common utilities for building and using dpay's tools.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod contract;
pub mod errors;
pub mod fmt;
pub mod units;
pub mod validate;

pub use contract::{IERC20Metadata, PaymentGateway};
pub use units::{AssetKind, NATIVE_DECIMALS, NATIVE_SYMBOL};
pub use validate::{is_positive_amount, is_valid_address, parse_address};
