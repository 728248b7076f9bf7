//! Submits the router swap and waits for it to be mined.

use alloy::primitives::{aliases::U24, Address};
use lib_core::{AppError, Result, SwapParams, SwapStage, TxReceiptRef};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::abi::ISwapRouter02;
use crate::gateway::{submit_and_confirm, LedgerGateway, TxRequest};

#[derive(Clone)]
pub struct SwapExecutor {
    gateway: Arc<dyn LedgerGateway>,
    router: Address,
}

impl SwapExecutor {
    pub fn new(gateway: Arc<dyn LedgerGateway>, router: Address) -> Self {
        Self { gateway, router }
    }

    /// Execute `exactInputSingle` with `params`.
    ///
    /// Parameters with a zero output floor are refused before anything is sent.
    #[instrument(skip(self, params), fields(router = %self.router, amount_in = %params.amount_in))]
    pub async fn execute(&self, params: &SwapParams) -> Result<TxReceiptRef> {
        if params.amount_out_minimum.is_zero() {
            return Err(AppError::Execution(
                "refusing to swap without a minimum output".to_string(),
            ));
        }

        let call = ISwapRouter02::exactInputSingleCall {
            params: ISwapRouter02::ExactInputSingleParams {
                tokenIn: params.token_in,
                tokenOut: params.token_out,
                fee: U24::from(params.fee),
                recipient: params.recipient,
                amountIn: params.amount_in,
                amountOutMinimum: params.amount_out_minimum,
                sqrtPriceLimitX96: params.sqrt_price_limit_x96,
            },
        };

        let receipt = submit_and_confirm(self.gateway.as_ref(), TxRequest::new(self.router, &call))
            .await
            .map_err(|e| e.at(SwapStage::Execution))?;

        info!(tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "swap confirmed");
        Ok(receipt)
    }
}
