//! # Domain Model
//!
//! Call-scoped values that flow through one swap: token descriptors, amounts,
//! pool information, allowance snapshots, quotes, swap parameters and receipts.
//! None of them is persisted; each swap request creates and discards its own.

pub mod amount;
pub mod state;
pub mod swap;
pub mod token;

pub use amount::{format_units, parse_units, AmountError, AmountSpec};
pub use state::{SwapProgress, SwapState};
pub use swap::{
    apply_slippage, AllowanceState, PoolInfo, Quote, SwapOutcome, SwapParams, TxReceiptRef,
};
pub use token::TokenDescriptor;
