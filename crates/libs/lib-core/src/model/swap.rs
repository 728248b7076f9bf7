//! # Swap Pipeline Values
//!
//! Values produced by one pipeline stage and consumed by the next.

use alloy_primitives::{aliases::U160, Address, B256, U256};
use serde::Serialize;
use std::fmt;

use super::amount::AmountSpec;

/// Basis-point denominator (100% = 10_000 bps).
const BPS_DENOMINATOR: u64 = 10_000;

/// A liquidity pool resolved from a token pair.
///
/// `token0`/`token1` are stored in the order the pool reports them, which is
/// not necessarily the caller's `tokenIn`/`tokenOut` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub pool_address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
}

impl PoolInfo {
    /// Whether the pool trades exactly this pair, in either order.
    pub fn matches_pair(&self, a: Address, b: Address) -> bool {
        (self.token0 == a && self.token1 == b) || (self.token0 == b && self.token1 == a)
    }
}

/// Snapshot of an owner's delegated spending rights. Re-read on every swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceState {
    pub owner: Address,
    pub spender: Address,
    pub current_allowance: U256,
    pub required_amount: U256,
}

impl AllowanceState {
    pub fn is_sufficient(&self) -> bool {
        self.current_allowance >= self.required_amount
    }
}

/// Expected output of a single-hop exact-input swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub fee: u32,
    pub amount_in: U256,
    /// Expected output in the output token's smallest units
    pub amount_out: U256,
    /// Expected output as a decimal string at the output token's precision
    pub amount_out_decimal: String,
    /// Unix timestamp after which the quote must not be used
    pub deadline: u64,
}

impl Quote {
    pub fn is_expired(&self, now_unix: u64) -> bool {
        now_unix > self.deadline
    }
}

/// Subtract a slippage tolerance from a quoted amount, rounding down.
pub fn apply_slippage(quoted: U256, slippage_bps: u16) -> U256 {
    let keep = U256::from(BPS_DENOMINATOR.saturating_sub(u64::from(slippage_bps)));
    quoted.saturating_mul(keep) / U256::from(BPS_DENOMINATOR)
}

/// Parameters of a router `exactInputSingle` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub amount_in: U256,
    /// Slippage floor; never zero
    pub amount_out_minimum: U256,
    /// Zero disables the price limit
    pub sqrt_price_limit_x96: U160,
}

/// Reference to a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceiptRef {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

impl TxReceiptRef {
    pub fn new(tx_hash: B256, block_number: Option<u64>) -> Self {
        Self { tx_hash, block_number }
    }

    /// Block-explorer link, e.g. `https://sepolia.etherscan.io/tx/0x…`.
    pub fn explorer_url(&self, explorer_tx_url: &str) -> String {
        format!("{}{}", explorer_tx_url, self.tx_hash)
    }
}

impl fmt::Display for TxReceiptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tx_hash)
    }
}

/// Everything a completed swap produced.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// Confirmed swap transaction
    pub receipt: TxReceiptRef,
    /// Confirmed approval transaction, when the allowance had to be raised
    pub approval: Option<TxReceiptRef>,
    /// Confirmed wrap transaction, when native currency had to be wrapped
    pub wrap: Option<TxReceiptRef>,
    pub amount_in: AmountSpec,
    pub quote: Quote,
    pub params: SwapParams,
    pub pool: PoolInfo,
}
