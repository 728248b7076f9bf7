//! # Token Descriptors

use alloy_primitives::{Address, U256};
use serde::Serialize;
use std::fmt;

use super::amount::{format_units, AmountError, AmountSpec, MAX_DECIMALS};
use crate::error::{AppError, Result};
use lib_utils::validation::{validate_max_len, validate_not_empty};

const MAX_SYMBOL_LEN: usize = 32;

/// An ERC-20 token as supplied by the caller.
///
/// `decimals` governs every conversion between decimal strings and smallest units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDescriptor {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenDescriptor {
    /// Build a validated descriptor.
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Result<Self> {
        let symbol = symbol.into();
        validate_not_empty(&symbol, "symbol").map_err(AppError::InvalidInput)?;
        validate_max_len(&symbol, MAX_SYMBOL_LEN, "symbol").map_err(AppError::InvalidInput)?;

        if address.is_zero() {
            return Err(AppError::InvalidInput(format!("{} address cannot be the zero address", symbol)));
        }

        if decimals > MAX_DECIMALS {
            return Err(AmountError::DecimalsOutOfRange(decimals).into());
        }

        Ok(Self { address, symbol, decimals })
    }

    /// Parse a strictly positive decimal amount at this token's precision.
    pub fn parse_amount(&self, value: &str) -> Result<AmountSpec> {
        AmountSpec::parse(value, self.decimals)
            .map_err(|e| AppError::InvalidInput(format!("{} amount: {}", self.symbol, e)))
    }

    /// Render smallest units of this token as a decimal string.
    pub fn format_amount(&self, value: U256) -> String {
        format_units(value, self.decimals)
    }
}

impl fmt::Display for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_new_validates_fields() {
        let weth = address!("fFf9976782d46CC05630D1f6eBAb18b2324d6B14");
        assert!(TokenDescriptor::new(weth, "WETH", 18).is_ok());
        assert!(TokenDescriptor::new(weth, "", 18).is_err());
        assert!(TokenDescriptor::new(weth, "WETH", 40).is_err());
        assert!(TokenDescriptor::new(Address::ZERO, "WETH", 18).is_err());
    }

    #[test]
    fn test_parse_amount_error_names_token() {
        let usdc = TokenDescriptor::new(address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"), "USDC", 6).unwrap();
        let err = usdc.parse_amount("1.0000001").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg.starts_with("USDC amount")));
        assert_eq!(usdc.format_amount(U256::from(2_500_000u64)), "2.5");
    }
}
