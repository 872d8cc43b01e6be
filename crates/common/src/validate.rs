//! Input validation for addresses and amounts entered by the user.
//!
//! Both validators are pure: they never touch the network.

use alloy_primitives::Address;

/// Number of hex characters in the body of an address.
const ADDRESS_HEX_LEN: usize = 40;

/// Returns `true` if `s` is a well-formed `0x`-prefixed address.
///
/// All-lowercase and all-uppercase bodies are accepted as-is. A mixed-case body must carry a
/// valid EIP-55 checksum.
///
/// # Examples
///
/// ```
/// use dpay_common::is_valid_address;
///
/// assert!(is_valid_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
/// assert!(is_valid_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
/// assert!(!is_valid_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92267"));
/// assert!(!is_valid_address(""));
/// ```
pub fn is_valid_address(s: &str) -> bool {
    parse_address(s).is_some()
}

/// Parses a user supplied address, applying the same rules as [`is_valid_address`].
pub fn parse_address(s: &str) -> Option<Address> {
    let body = s.strip_prefix("0x")?;
    if body.len() != ADDRESS_HEX_LEN || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(s, None).ok();
    }

    s.parse().ok()
}

/// Returns `true` if `s` is a plain decimal number strictly greater than zero.
///
/// Only digits with at most one decimal point are accepted, so signs, exponents, `inf` and `NaN`
/// are all rejected.
///
/// # Examples
///
/// ```
/// use dpay_common::is_positive_amount;
///
/// assert!(is_positive_amount("0.1"));
/// assert!(is_positive_amount("12"));
/// assert!(!is_positive_amount("0"));
/// assert!(!is_positive_amount("-1"));
/// assert!(!is_positive_amount("abc"));
/// ```
pub fn is_positive_amount(s: &str) -> bool {
    let Some((int, frac)) = split_decimal(s) else { return false };
    int.bytes().chain(frac.bytes()).any(|b| b != b'0')
}

/// Splits a plain decimal string into its integer and fractional digits.
///
/// Returns `None` if the string is not made of ASCII digits with at most one `.`, or if it has no
/// digits at all.
pub(crate) fn split_decimal(s: &str) -> Option<(&str, &str)> {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (s, ""),
    };
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    (digits(int) && digits(frac)).then_some((int, frac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_and_uppercase() {
        assert!(is_valid_address("0xabcdef1234567890abcdef1234567890abcdef12"));
        assert!(is_valid_address("0xABCDEF1234567890ABCDEF1234567890ABCDEF12"));
        assert!(is_valid_address("0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn checks_mixed_case_checksum() {
        assert!(is_valid_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"));
        // flipped case of a single letter
        assert!(!is_valid_address("0x70997970c51812dc3A010C7d01b50e0d17dc79C8"));
    }

    #[test]
    fn rejects_malformed() {
        for s in [
            "",
            "0x",
            "0x123",
            "70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8aa",
            "0xGG997970C51812dc3A010C7d01b50e0d17dc79C8",
            "0xYourDeployedContractAddress",
            " 0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
        ] {
            assert!(!is_valid_address(s), "{s:?} should be rejected");
        }
    }

    #[test]
    fn parses_to_checksummed_address() {
        let addr = parse_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        assert_eq!(addr.to_checksum(None), "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    }

    #[test]
    fn positive_amounts() {
        for s in ["1", "0.1", ".5", "5.", "000.0001", "100000000"] {
            assert!(is_positive_amount(s), "{s:?} should be accepted");
        }
        for s in ["", ".", "0", "0.0", "-1", "+1", "1e18", "abc", "1.2.3", "NaN", "inf", " 1"] {
            assert!(!is_positive_amount(s), "{s:?} should be rejected");
        }
    }
}
