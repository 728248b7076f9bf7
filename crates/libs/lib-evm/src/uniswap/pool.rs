//! Pool lookup at a single fixed fee tier.

use alloy::primitives::{aliases::U24, Address};
use lib_core::{AppError, PoolInfo, Result, SwapStage, TokenDescriptor};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::abi::{IUniswapV3Factory, IUniswapV3Pool};
use crate::gateway::{call_typed, LedgerGateway};

#[derive(Clone)]
pub struct PoolResolver {
    gateway: Arc<dyn LedgerGateway>,
    factory: Address,
    fee_tier: u32,
}

impl PoolResolver {
    pub fn new(gateway: Arc<dyn LedgerGateway>, factory: Address, fee_tier: u32) -> Self {
        Self { gateway, factory, fee_tier }
    }

    /// Find the pool for the pair at the configured fee tier and read its
    /// token order and fee.
    ///
    /// Fails with [`AppError::PoolNotFound`] when the factory has no pool, or
    /// when the pool it returns does not trade this pair at this tier.
    #[instrument(skip(self, token_in, token_out), fields(pair = %format!("{}/{}", token_in.symbol, token_out.symbol), fee = self.fee_tier))]
    pub async fn resolve(
        &self,
        token_in: &TokenDescriptor,
        token_out: &TokenDescriptor,
    ) -> Result<PoolInfo> {
        let gateway = self.gateway.as_ref();
        let pool_address = call_typed(
            gateway,
            self.factory,
            IUniswapV3Factory::getPoolCall {
                tokenA: token_in.address,
                tokenB: token_out.address,
                fee: U24::from(self.fee_tier),
            },
        )
        .await
        .map_err(|e| e.at(SwapStage::PoolResolution))?;

        if pool_address.is_zero() {
            return Err(AppError::PoolNotFound(format!(
                "no {}/{} pool at fee tier {}",
                token_in.symbol, token_out.symbol, self.fee_tier
            )));
        }

        let (token0, token1, fee) = tokio::try_join!(
            call_typed(gateway, pool_address, IUniswapV3Pool::token0Call {}),
            call_typed(gateway, pool_address, IUniswapV3Pool::token1Call {}),
            call_typed(gateway, pool_address, IUniswapV3Pool::feeCall {}),
        )
        .map_err(|e| e.at(SwapStage::PoolResolution))?;

        let pool = PoolInfo {
            pool_address,
            token0,
            token1,
            fee: fee.to::<u32>(),
        };

        if !pool.matches_pair(token_in.address, token_out.address) || pool.fee != self.fee_tier {
            return Err(AppError::PoolNotFound(format!(
                "pool {} trades {}/{} at fee {}, expected {}/{} at fee {}",
                pool_address, token0, token1, pool.fee, token_in.address, token_out.address, self.fee_tier
            )));
        }

        debug!(pool = %pool_address, %token0, %token1, "pool resolved");
        Ok(pool)
    }
}
