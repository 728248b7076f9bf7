//! # Swap Data Transfer Objects
//!
//! ## Endpoint
//!
//! - `POST /api/defi/swap` - Swap `swapAmount` of `tokenIn` for `tokenOut`
//!
//! ## Wire Format
//!
//! Field names are **camelCase**. `decimals` is accepted as a number or a numeric
//! string; `swapAmount` must be a decimal string so no precision is lost in JSON.
//!
//! ```json
//! {
//!   "tokenIn":  { "address": "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14", "symbol": "WETH", "decimals": 18 },
//!   "tokenOut": { "address": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238", "symbol": "USDC", "decimals": 6 },
//!   "swapAmount": "0.01"
//! }
//! ```
//!
//! Response:
//! ```json
//! {
//!   "txHash": "0x5c50…",
//!   "explorerUrl": "https://sepolia.etherscan.io/tx/0x5c50…",
//!   "blockNumber": 7012345,
//!   "amountIn": "0.01",
//!   "quotedAmountOut": "30.0005",
//!   "amountOutMinimum": "29.850497",
//!   "fee": 3000,
//!   "approvalTxHash": "0x9d1e…",
//!   "wrapTxHash": null,
//!   "stages": ["Init", "AllowanceChecked", "Approved", "PoolResolved", "Quoted", "ParamsBuilt", "Executed"]
//! }
//! ```

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::model::{AmountSpec, SwapOutcome, SwapState, TokenDescriptor};

/// Token decimals as sent by clients: `18` or `"18"`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DecimalsInput {
    Number(u64),
    Text(String),
}

impl DecimalsInput {
    fn parse(&self, field: &str) -> Result<u8> {
        let value = match self {
            DecimalsInput::Number(n) => *n,
            DecimalsInput::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| AppError::InvalidInput(format!("{}.decimals must be an integer, got '{}'", field, s)))?,
        };
        u8::try_from(value).map_err(|_| AppError::InvalidInput(format!("{}.decimals is out of range: {}", field, value)))
    }
}

/// Token as it appears in the request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenDescriptorDto {
    pub address: String,
    pub symbol: String,
    pub decimals: DecimalsInput,
}

impl TokenDescriptorDto {
    fn validate(&self, field: &str) -> Result<TokenDescriptor> {
        let address = Address::from_str(self.address.trim())
            .map_err(|e| AppError::InvalidInput(format!("{}.address is not a valid address: {}", field, e)))?;
        let decimals = self.decimals.parse(field)?;
        TokenDescriptor::new(address, self.symbol.trim(), decimals)
    }
}

/// Request body for `POST /api/defi/swap`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub token_in: TokenDescriptorDto,
    pub token_out: TokenDescriptorDto,
    pub swap_amount: String,
}

/// A swap request whose tokens and amount passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSwap {
    pub token_in: TokenDescriptor,
    pub token_out: TokenDescriptor,
    pub amount_in: AmountSpec,
}

impl SwapRequest {
    /// Check every field before any ledger interaction.
    pub fn validate(&self) -> Result<ValidatedSwap> {
        let token_in = self.token_in.validate("tokenIn")?;
        let token_out = self.token_out.validate("tokenOut")?;

        if token_in.address == token_out.address {
            return Err(AppError::InvalidInput("tokenIn and tokenOut must be different tokens".to_string()));
        }

        let amount_in = token_in.parse_amount(&self.swap_amount)?;

        Ok(ValidatedSwap { token_in, token_out, amount_in })
    }
}

/// Successful swap response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub tx_hash: String,
    pub explorer_url: String,
    pub block_number: Option<u64>,
    pub amount_in: String,
    pub quoted_amount_out: String,
    pub amount_out_minimum: String,
    pub fee: u32,
    pub approval_tx_hash: Option<String>,
    pub wrap_tx_hash: Option<String>,
    pub stages: Vec<String>,
}

impl SwapResponse {
    pub fn from_outcome(
        outcome: &SwapOutcome,
        token_out: &TokenDescriptor,
        stages: &[SwapState],
        explorer_tx_url: &str,
    ) -> Self {
        Self {
            tx_hash: outcome.receipt.tx_hash.to_string(),
            explorer_url: outcome.receipt.explorer_url(explorer_tx_url),
            block_number: outcome.receipt.block_number,
            amount_in: outcome.amount_in.decimal.clone(),
            quoted_amount_out: outcome.quote.amount_out_decimal.clone(),
            amount_out_minimum: token_out.format_amount(outcome.params.amount_out_minimum),
            fee: outcome.params.fee,
            approval_tx_hash: outcome.approval.map(|r| r.tx_hash.to_string()),
            wrap_tx_hash: outcome.wrap.map(|r| r.tx_hash.to_string()),
            stages: stages.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn request(amount: &str) -> SwapRequest {
        serde_json::from_value(serde_json::json!({
            "tokenIn": { "address": "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14", "symbol": "WETH", "decimals": 18 },
            "tokenOut": { "address": "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238", "symbol": "USDC", "decimals": "6" },
            "swapAmount": amount,
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_accepts_numeric_and_string_decimals() {
        let validated = request("1.0").validate().unwrap();
        assert_eq!(validated.token_in.decimals, 18);
        assert_eq!(validated.token_out.decimals, 6);
        assert_eq!(validated.amount_in.smallest_unit, U256::from(10u64).pow(U256::from(18u64)));
    }

    #[test]
    fn test_validate_rejects_same_token() {
        let mut req = request("1.0");
        req.token_out = req.token_in.clone();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_bad_amounts() {
        for amount in ["0", "-1", "abc", "0.0000000000000000001"] {
            assert!(request(amount).validate().is_err(), "{amount} should be rejected");
        }
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let mut req = request("1.0");
        req.token_in.address = "0x1234".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("tokenIn.address"));
    }

    #[test]
    fn test_validate_rejects_oversized_decimals() {
        let mut req = request("1.0");
        req.token_out.decimals = DecimalsInput::Number(300);
        assert!(req.validate().is_err());
    }
}
