//! Fixed-point conversion between human amounts and base units.

use crate::validate::split_decimal;
use alloy_primitives::{
    U256,
    utils::{ParseUnits, UnitsError, format_units, parse_units},
};

/// Decimal places of the native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Display symbol of the native currency.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Decimal places assumed for a token whose `decimals()` cannot be read.
pub const FALLBACK_TOKEN_DECIMALS: u8 = 18;

/// The asset moved by a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AssetKind {
    /// The chain's native currency, attached as call value.
    Native,
    /// A fungible token moved by the payment contract.
    Token,
}

impl AssetKind {
    /// Short label used in badges and history rows.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Native => NATIVE_SYMBOL,
            Self::Token => "Token",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors converting a human amount into base units.
#[derive(Debug, thiserror::Error)]
pub enum AmountError {
    /// The amount is not a decimal number greater than zero.
    #[error("amount {0:?} is not a positive decimal number")]
    NotPositive(String),
    /// The amount has more fractional digits than the asset supports.
    #[error("amount {amount:?} has more than {decimals} decimal places")]
    TooPrecise {
        /// The rejected input.
        amount: String,
        /// Decimal places of the asset.
        decimals: u8,
    },
    /// Conversion failed inside the units parser.
    #[error(transparent)]
    Units(#[from] UnitsError),
}

/// Converts a decimal amount into base units scaled by `decimals`.
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use dpay_common::units::to_base_units;
///
/// assert_eq!(to_base_units("0.1", 18)?, U256::from(100_000_000_000_000_000u64));
/// assert_eq!(to_base_units("12.5", 6)?, U256::from(12_500_000u64));
/// # Ok::<_, dpay_common::units::AmountError>(())
/// ```
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let Some((int, frac)) = split_decimal(amount) else {
        return Err(AmountError::NotPositive(amount.to_string()));
    };
    // `parse_units` silently truncates excess precision, so reject it up front.
    if frac.len() > decimals as usize {
        return Err(AmountError::TooPrecise { amount: amount.to_string(), decimals });
    }

    let int = if int.is_empty() { "0" } else { int };
    let normalized = if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") };
    let value = parse_units(&normalized, decimals)?.get_absolute();
    if value.is_zero() {
        return Err(AmountError::NotPositive(amount.to_string()));
    }
    Ok(value)
}

/// Formats base units as a decimal string with all `decimals` fractional digits.
pub fn from_base_units(value: U256, decimals: u8) -> Result<String, UnitsError> {
    format_units(ParseUnits::U256(value), decimals)
}

/// Formats a native balance rounded to four decimal places, e.g. `1.2346`.
pub fn format_native_balance(wei: U256) -> String {
    let ether = from_base_units(wei, NATIVE_DECIMALS).unwrap_or_else(|_| wei.to_string());
    let value: f64 = ether.parse().unwrap_or_default();
    format!("{value:.4}")
}
