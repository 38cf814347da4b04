//! ERC-20 allowance values and address handling.
//!
//! The chain is the only source of truth for allowances; these types describe
//! a single read or approval and are never cached across requests.

use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};

use crate::error::GatewayError;

/// Amount requested when an approval does not name one: the largest
/// representable `uint256`, i.e. "approve once, never again".
pub const MAX_APPROVAL: U256 = U256::MAX;

/// Allowance snapshot for the gateway wallet towards the facilitator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceState {
    /// Address authorized to pull payment.
    pub facilitator: Address,
    /// Allowance read from chain.
    pub current: U256,
    /// Amount an approval would request.
    pub requested: U256,
}

impl AllowanceState {
    /// Whether the current allowance covers `needed`.
    #[must_use]
    pub fn covers(&self, needed: U256) -> bool {
        self.current >= needed
    }

    /// Whether a payment failure should trigger a fresh approval.
    ///
    /// A max approval is topped up once less than half of it remains, so a
    /// small or spent finite approval is replaced rather than trusted.
    #[must_use]
    pub fn needs_top_up(&self) -> bool {
        self.current < self.requested / U256::from(2u8)
    }
}

/// Parses a `0x`-prefixed 20-byte hex address.
///
/// Checksums are not enforced; mixed-case input is accepted as long as every
/// character is a hex digit.
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` naming `field` when the input is malformed.
pub fn parse_address(raw: &str, field: &str) -> Result<Address, GatewayError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| GatewayError::validation(format!("{field} must be 0x-prefixed")))?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(GatewayError::validation(format!(
            "{field} must be a 0x-prefixed 20-byte hex string"
        )));
    }
    Address::from_str(trimmed)
        .map_err(|e| GatewayError::validation(format!("{field} is not a valid address: {e}")))
}

/// Parses a base-10 token amount that must fit in 256 bits.
///
/// # Errors
///
/// Returns a `VALIDATION_ERROR` for empty, non-decimal or overflowing input.
pub fn parse_amount(raw: &str) -> Result<U256, GatewayError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::validation("amount cannot be empty"));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::validation(
            "amount must be a decimal string of digits",
        ));
    }
    U256::from_str_radix(trimmed, 10)
        .map_err(|_| GatewayError::validation("amount exceeds the uint256 range"))
}

/// Lowercase `0x`-prefixed hex of `bytes`.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Lowercase `0x`-prefixed hex of an address, as JSON-RPC expects it.
#[must_use]
pub fn address_hex(address: &Address) -> String {
    to_hex(address.as_slice())
}

/// Lowercase `0x`-prefixed hex of a transaction hash.
#[must_use]
pub fn tx_hash_hex(hash: &B256) -> String {
    to_hex(hash.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const WALLET: &str = "0x9431Cf5DA0CE60664661341db650763B08286B18";

    #[test]
    fn parses_mixed_case_address() {
        let address = parse_address(WALLET, "walletAddress").unwrap();
        assert_eq!(
            address_hex(&address),
            "0x9431cf5da0ce60664661341db650763b08286b18"
        );
    }

    #[test]
    fn rejects_address_without_prefix() {
        let err = parse_address(&WALLET[2..], "walletAddress").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert!(err.message.contains("walletAddress"));
    }

    #[test]
    fn rejects_short_or_non_hex_address() {
        assert!(parse_address("0x1234", "walletAddress").is_err());
        assert!(parse_address("0xZZ31Cf5DA0CE60664661341db650763B08286B18", "walletAddress").is_err());
    }

    #[test]
    fn parses_decimal_amounts() {
        assert_eq!(parse_amount("1000000").unwrap(), U256::from(1_000_000u64));
        assert_eq!(parse_amount(&U256::MAX.to_string()).unwrap(), MAX_APPROVAL);
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("0x10").is_err());
        assert!(parse_amount("1.5").is_err());
        // 2^256 does not fit.
        let overflow =
            "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        let err = parse_amount(overflow).unwrap_err();
        assert!(err.message.contains("uint256"));
    }

    #[test]
    fn covers_compares_against_current() {
        let state = AllowanceState {
            facilitator: Address::ZERO,
            current: U256::from(10u64),
            requested: MAX_APPROVAL,
        };
        assert!(state.covers(U256::from(10u64)));
        assert!(!state.covers(U256::from(11u64)));
    }

    #[test]
    fn small_or_spent_allowances_need_top_up() {
        let state = |current: U256| AllowanceState {
            facilitator: Address::ZERO,
            current,
            requested: MAX_APPROVAL,
        };
        assert!(state(U256::ZERO).needs_top_up());
        assert!(state(U256::from(1u64)).needs_top_up());
        assert!(state(U256::from(1_000_000_000u64)).needs_top_up());
        assert!(!state(MAX_APPROVAL).needs_top_up());
        assert!(!state(MAX_APPROVAL / U256::from(2u8)).needs_top_up());
    }
}
