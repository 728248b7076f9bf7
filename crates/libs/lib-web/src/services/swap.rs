//! # Swap Service
//!
//! Orchestrates one single-hop exact-input swap on Uniswap V3.
//!
//! ## Pipeline
//!
//! ```text
//! Init
//!   │  AllowanceManager::ensure_allowance   (may wrap + approve, confirmed)
//!   ▼
//! AllowanceChecked ─► (WrapPending) ─► Approved
//!   │  PoolResolver::resolve                 (fixed fee tier)
//!   ▼
//! PoolResolved
//!   │  QuoteEngine::quote                    (read-only simulation)
//!   ▼
//! Quoted
//!   │  build_params                          (deadline + slippage floor)
//!   ▼
//! ParamsBuilt
//!   │  SwapExecutor::execute                 (confirmed)
//!   ▼
//! Executed
//! ```
//!
//! Any failure moves the swap to `Failed(stage)` and is returned to the caller.
//! Nothing is retried and nothing is rolled back: a confirmed wrap or approval
//! stays on the ledger, and the next attempt re-reads the allowance from scratch.
//!
//! ## Concurrency
//!
//! Each call owns its own [`SwapProgress`]; concurrent swaps share only the
//! gateway. Dropping the returned future before a transaction is submitted aborts
//! the pipeline. Once a transaction is broadcast its effect cannot be retracted,
//! dropping the future only stops waiting for it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lib_evm::EvmState;
//! use lib_web::services::SwapService;
//! use std::sync::Arc;
//!
//! # async fn example(evm: EvmState, weth: lib_core::TokenDescriptor, usdc: lib_core::TokenDescriptor) -> lib_core::Result<()> {
//! let service = SwapService::new(Arc::new(evm));
//! let outcome = service.swap("1.0", &weth, &usdc).await?;
//! println!("swap confirmed: {}", outcome.receipt);
//! # Ok(())
//! # }
//! ```

use alloy_primitives::{aliases::U160, Address};
use lib_core::model::apply_slippage;
use lib_core::{
    AmountSpec, AppError, Quote, Result, SwapOutcome, SwapParams, SwapProgress, SwapStage,
    SwapState, TokenDescriptor,
};
use lib_evm::EvmState;
use lib_utils::now_utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// Swap orchestration over the shared EVM components.
#[derive(Clone)]
pub struct SwapService {
    evm: Arc<EvmState>,
}

impl SwapService {
    pub fn new(evm: Arc<EvmState>) -> Self {
        Self { evm }
    }

    pub fn explorer_tx_url(&self) -> &str {
        &self.evm.explorer_tx_url
    }

    /// Swap `amount` (decimal, at `token_in` precision) of `token_in` into `token_out`.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidInput` - same token on both sides or malformed amount,
    ///   reported before any ledger interaction
    /// - Any stage error from [`SwapService::run`]
    pub async fn swap(
        &self,
        amount: &str,
        token_in: &TokenDescriptor,
        token_out: &TokenDescriptor,
    ) -> Result<SwapOutcome> {
        if token_in.address == token_out.address {
            return Err(AppError::InvalidInput(
                "tokenIn and tokenOut must be different tokens".to_string(),
            ));
        }
        let amount_in = token_in.parse_amount(amount)?;

        let mut progress = SwapProgress::new();
        self.run(token_in, token_out, amount_in, &mut progress).await
    }

    /// Run the pipeline for an already validated amount, recording every state in `progress`.
    ///
    /// On failure `progress` ends in `Failed(stage)` and the stage error is returned.
    #[instrument(
        skip(self, token_in, token_out, amount_in, progress),
        fields(
            token_in = %token_in.symbol,
            token_out = %token_out.symbol,
            amount = %amount_in.decimal,
        )
    )]
    pub async fn run(
        &self,
        token_in: &TokenDescriptor,
        token_out: &TokenDescriptor,
        amount_in: AmountSpec,
        progress: &mut SwapProgress,
    ) -> Result<SwapOutcome> {
        match self.pipeline(token_in, token_out, amount_in, progress).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let err = progress.fail(err);
                tracing::warn!(state = %progress.state(), error = %err, "swap failed");
                Err(err)
            }
        }
    }

    async fn pipeline(
        &self,
        token_in: &TokenDescriptor,
        token_out: &TokenDescriptor,
        amount_in: AmountSpec,
        progress: &mut SwapProgress,
    ) -> Result<SwapOutcome> {
        let evm = self.evm.as_ref();
        let owner = evm.gateway.signer_address();
        let explorer = &evm.explorer_tx_url;

        let allowance = evm
            .allowance
            .ensure_allowance(token_in, amount_in.smallest_unit, owner)
            .await?;
        progress.advance(SwapState::AllowanceChecked)?;
        if let Some(wrap) = &allowance.wrap {
            progress.advance(SwapState::WrapPending)?;
            info!(explorer_url = %wrap.explorer_url(explorer), "wrapped {} {}", amount_in, token_in.symbol);
        }
        if let Some(approval) = &allowance.approval {
            info!(explorer_url = %approval.explorer_url(explorer), "approval transaction confirmed");
        }
        progress.advance(SwapState::Approved)?;

        let pool = evm.pools.resolve(token_in, token_out).await?;
        progress.advance(SwapState::PoolResolved)?;

        let quote = evm
            .quotes
            .quote(pool.fee, amount_in.smallest_unit, token_in, token_out)
            .await?;
        progress.advance(SwapState::Quoted)?;

        let now = u64::try_from(now_utc().timestamp()).unwrap_or_default();
        let params = build_params(
            token_in,
            token_out,
            owner,
            &quote,
            evm.settings.slippage_bps,
            now,
        )?;
        progress.advance(SwapState::ParamsBuilt)?;

        let receipt = evm.executor.execute(&params).await?;
        progress.advance(SwapState::Executed)?;
        info!(
            tx_hash = %receipt.tx_hash,
            explorer_url = %receipt.explorer_url(explorer),
            "swapped {} {} for at least {} {}",
            amount_in,
            token_in.symbol,
            token_out.format_amount(params.amount_out_minimum),
            token_out.symbol
        );

        Ok(SwapOutcome {
            receipt,
            approval: allowance.approval,
            wrap: allowance.wrap,
            amount_in,
            quote,
            params,
            pool,
        })
    }
}

/// Turn a quote into router parameters.
///
/// Fails with `AppError::Quote` at stage `ParamsBuild` when the quote is past its
/// deadline or when the slippage floor rounds down to zero.
pub fn build_params(
    token_in: &TokenDescriptor,
    token_out: &TokenDescriptor,
    recipient: Address,
    quote: &Quote,
    slippage_bps: u16,
    now_unix: u64,
) -> Result<SwapParams> {
    if quote.is_expired(now_unix) {
        return Err(AppError::Quote {
            stage: SwapStage::ParamsBuild,
            message: format!("quote expired at {} (now {})", quote.deadline, now_unix),
        });
    }

    let amount_out_minimum = apply_slippage(quote.amount_out, slippage_bps);
    if amount_out_minimum.is_zero() {
        return Err(AppError::Quote {
            stage: SwapStage::ParamsBuild,
            message: format!(
                "quoted {} {} leaves no minimum output at {} bps slippage",
                quote.amount_out_decimal, token_out.symbol, slippage_bps
            ),
        });
    }

    Ok(SwapParams {
        token_in: token_in.address,
        token_out: token_out.address,
        fee: quote.fee,
        recipient,
        amount_in: quote.amount_in,
        amount_out_minimum,
        sqrt_price_limit_x96: U160::ZERO,
    })
}
