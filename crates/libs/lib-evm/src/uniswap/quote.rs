//! # Quote Engine
//!
//! Simulates a single-hop exact-input swap on the quoter through a read-only
//! call and stamps the result with a validity deadline.
//!
//! The quoter is a non-view contract that reverts internally to report its
//! result, so it must only ever be reached through `eth_call`; a submitted
//! transaction would spend gas for nothing.

use alloy::primitives::{aliases::{U160, U24}, Address, U256};
use lib_core::{AppError, Quote, Result, SwapStage, TokenDescriptor};
use lib_utils::unix_deadline;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::abi::IQuoterV2;
use crate::gateway::{call_typed, LedgerGateway};

#[derive(Clone)]
pub struct QuoteEngine {
    gateway: Arc<dyn LedgerGateway>,
    quoter: Address,
    validity_secs: u64,
}

impl QuoteEngine {
    pub fn new(gateway: Arc<dyn LedgerGateway>, quoter: Address, validity_secs: u64) -> Self {
        Self { gateway, quoter, validity_secs }
    }

    /// Expected output of swapping `amount_in` of `token_in` into `token_out`
    /// through the pool with `fee`.
    ///
    /// A zero output is reported as [`AppError::Quote`]: it would make any
    /// slippage floor meaningless.
    #[instrument(skip(self, token_in, token_out), fields(token_in = %token_in.symbol, token_out = %token_out.symbol))]
    pub async fn quote(
        &self,
        fee: u32,
        amount_in: U256,
        token_in: &TokenDescriptor,
        token_out: &TokenDescriptor,
    ) -> Result<Quote> {
        let call = IQuoterV2::quoteExactInputSingleCall {
            params: IQuoterV2::QuoteExactInputSingleParams {
                tokenIn: token_in.address,
                tokenOut: token_out.address,
                amountIn: amount_in,
                fee: U24::from(fee),
                sqrtPriceLimitX96: U160::ZERO,
            },
        };

        let result = call_typed(self.gateway.as_ref(), self.quoter, call)
            .await
            .map_err(|e| e.at(SwapStage::Quote))?;

        if result.amountOut.is_zero() {
            return Err(AppError::Quote {
                stage: SwapStage::Quote,
                message: format!(
                    "quoter returned no output for {} {}",
                    token_in.format_amount(amount_in),
                    token_in.symbol
                ),
            });
        }

        let quote = Quote {
            fee,
            amount_in,
            amount_out: result.amountOut,
            amount_out_decimal: token_out.format_amount(result.amountOut),
            deadline: unix_deadline(self.validity_secs),
        };

        info!(
            deadline = quote.deadline,
            "quoted {} {} for {} {}",
            quote.amount_out_decimal,
            token_out.symbol,
            token_in.format_amount(amount_in),
            token_in.symbol
        );
        Ok(quote)
    }
}
