//! Converts native currency into the wrapped ERC-20 form when the owner holds
//! too little of the wrapped token.

use alloy::primitives::{Address, U256};
use lib_core::{Result, SwapStage, TxReceiptRef};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::abi::{IERC20, IWETH9};
use crate::gateway::{call_typed, submit_and_confirm, LedgerGateway, TxRequest};

#[derive(Clone)]
pub struct NativeWrapper {
    gateway: Arc<dyn LedgerGateway>,
    wrapped_native: Address,
}

impl NativeWrapper {
    pub fn new(gateway: Arc<dyn LedgerGateway>, wrapped_native: Address) -> Self {
        Self { gateway, wrapped_native }
    }

    pub fn is_wrapped_native(&self, token: Address) -> bool {
        token == self.wrapped_native
    }

    /// Wrapped-token balance of `owner`.
    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        call_typed(
            self.gateway.as_ref(),
            self.wrapped_native,
            IERC20::balanceOfCall { account: owner },
        )
        .await
        .map_err(|e| e.at(SwapStage::Wrap))
    }

    /// Deposit exactly `amount` of native currency when `owner`'s wrapped
    /// balance is below `amount`.
    ///
    /// Returns the confirmed deposit, or `None` when the balance already covers it.
    /// The native balance itself is not checked; an underfunded deposit fails at
    /// submission.
    #[instrument(skip(self), fields(wrapped_native = %self.wrapped_native))]
    pub async fn wrap_if_short(&self, amount: U256, owner: Address) -> Result<Option<TxReceiptRef>> {
        let balance = self.balance_of(owner).await?;
        if balance >= amount {
            return Ok(None);
        }

        info!(%balance, %amount, "wrapped balance short, wrapping native currency");
        let tx = TxRequest::new(self.wrapped_native, &IWETH9::depositCall {}).with_value(amount);
        let receipt = submit_and_confirm(self.gateway.as_ref(), tx)
            .await
            .map_err(|e| e.at(SwapStage::Wrap))?;

        info!(tx_hash = %receipt.tx_hash, "wrap confirmed");
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, FakeLedger, SubmissionKind};
    use lib_core::AppError;

    #[tokio::test]
    async fn test_no_wrap_when_balance_covers_amount() {
        let ledger = Arc::new(FakeLedger::new().with_balance(fixtures::WETH, U256::from(10u64)));
        let wrapper = NativeWrapper::new(ledger.clone(), fixtures::WETH);

        let receipt = wrapper.wrap_if_short(U256::from(10u64), ledger.signer()).await.unwrap();

        assert!(receipt.is_none());
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_wraps_full_amount_when_short() {
        let ledger = Arc::new(FakeLedger::new().with_balance(fixtures::WETH, U256::from(3u64)));
        let wrapper = NativeWrapper::new(ledger.clone(), fixtures::WETH);

        let receipt = wrapper.wrap_if_short(U256::from(10u64), ledger.signer()).await.unwrap();

        assert!(receipt.is_some());
        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].kind, SubmissionKind::Wrap);
        assert_eq!(submissions[0].value, U256::from(10u64));
        assert_eq!(ledger.balance(fixtures::WETH), U256::from(13u64));
    }

    #[tokio::test]
    async fn test_reverted_deposit_is_wrap_error() {
        let ledger = Arc::new(FakeLedger::new().reverting(SubmissionKind::Wrap));
        let wrapper = NativeWrapper::new(ledger.clone(), fixtures::WETH);

        let err = wrapper.wrap_if_short(U256::from(1u64), ledger.signer()).await.unwrap_err();
        assert!(matches!(err, AppError::Wrap(_)));
    }
}
