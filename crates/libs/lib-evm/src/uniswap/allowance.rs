//! # Allowance Management
//!
//! Makes sure the router may spend at least the swap amount of the input token.
//!
//! ```text
//! read allowance(owner, router)
//!     │
//!     ├─ ≥ required ─────────────────────────────► done, no transactions
//!     │
//!     └─ < required ─┬─ token is wrapped native ─► wrap_if_short(required)
//!                    │                                   │
//!                    └───────────────────────────────────┴─► approve(router, required) ─► confirm
//! ```
//!
//! The approval is for exactly the required amount; it is never unlimited.

use alloy::primitives::{Address, U256};
use lib_core::{AllowanceState, Result, SwapStage, TokenDescriptor, TxReceiptRef};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::abi::IERC20;
use crate::gateway::{call_typed, submit_and_confirm, LedgerGateway, TxRequest};
use crate::uniswap::wrapper::NativeWrapper;

/// What [`AllowanceManager::ensure_allowance`] had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceOutcome {
    /// Allowance as read before any transaction
    pub initial: AllowanceState,
    /// Confirmed wrap, if native currency had to be wrapped first
    pub wrap: Option<TxReceiptRef>,
    /// Confirmed approval, if the allowance had to be raised
    pub approval: Option<TxReceiptRef>,
}

impl AllowanceOutcome {
    pub fn was_sufficient(&self) -> bool {
        self.approval.is_none()
    }
}

#[derive(Clone)]
pub struct AllowanceManager {
    gateway: Arc<dyn LedgerGateway>,
    spender: Address,
    wrapper: NativeWrapper,
}

impl AllowanceManager {
    /// `spender` is the swap router.
    pub fn new(gateway: Arc<dyn LedgerGateway>, spender: Address, wrapper: NativeWrapper) -> Self {
        Self { gateway, spender, wrapper }
    }

    /// Current allowance of `owner` toward the router for `token`.
    pub async fn read_allowance(
        &self,
        token: &TokenDescriptor,
        required_amount: U256,
        owner: Address,
    ) -> Result<AllowanceState> {
        let current_allowance = call_typed(
            self.gateway.as_ref(),
            token.address,
            IERC20::allowanceCall { owner, spender: self.spender },
        )
        .await
        .map_err(|e| e.at(SwapStage::Allowance))?;

        Ok(AllowanceState {
            owner,
            spender: self.spender,
            current_allowance,
            required_amount,
        })
    }

    /// Raise the router's allowance to `required_amount` if it is lower.
    ///
    /// When the token is the wrapped native token, a short wrapped balance is
    /// topped up first. Each transaction is confirmed before the next one is sent.
    #[instrument(skip(self, token), fields(token = %token.symbol, spender = %self.spender))]
    pub async fn ensure_allowance(
        &self,
        token: &TokenDescriptor,
        required_amount: U256,
        owner: Address,
    ) -> Result<AllowanceOutcome> {
        let initial = self.read_allowance(token, required_amount, owner).await?;
        if initial.is_sufficient() {
            info!(allowance = %initial.current_allowance, "allowance sufficient, skipping approval");
            return Ok(AllowanceOutcome { initial, wrap: None, approval: None });
        }

        let wrap = if self.wrapper.is_wrapped_native(token.address) {
            self.wrapper.wrap_if_short(required_amount, owner).await?
        } else {
            None
        };

        info!(
            allowance = %initial.current_allowance,
            required = %required_amount,
            "approving router for {} {}",
            token.format_amount(required_amount),
            token.symbol
        );
        let approve = IERC20::approveCall { spender: self.spender, amount: required_amount };
        let approval = submit_and_confirm(self.gateway.as_ref(), TxRequest::new(token.address, &approve))
            .await
            .map_err(|e| e.at(SwapStage::Approval))?;

        info!(tx_hash = %approval.tx_hash, "approval confirmed");
        Ok(AllowanceOutcome { initial, wrap, approval: Some(approval) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, FakeLedger, SubmissionKind};
    use lib_core::AppError;

    fn manager(ledger: &Arc<FakeLedger>) -> AllowanceManager {
        let wrapper = NativeWrapper::new(ledger.clone(), fixtures::WETH);
        AllowanceManager::new(ledger.clone(), fixtures::ROUTER, wrapper)
    }

    #[tokio::test]
    async fn test_sufficient_allowance_submits_nothing() {
        let amount = U256::from(1_000u64);
        let ledger = Arc::new(FakeLedger::new().with_allowance(fixtures::USDC, fixtures::ROUTER, amount));

        let outcome = manager(&ledger)
            .ensure_allowance(&fixtures::usdc(), amount, ledger.signer())
            .await
            .unwrap();

        assert!(outcome.was_sufficient());
        assert!(outcome.wrap.is_none());
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_approves_exact_amount() {
        let amount = U256::from(1_000u64);
        let ledger = Arc::new(FakeLedger::new().with_allowance(fixtures::USDC, fixtures::ROUTER, U256::from(5u64)));

        let outcome = manager(&ledger)
            .ensure_allowance(&fixtures::usdc(), amount, ledger.signer())
            .await
            .unwrap();

        assert!(outcome.approval.is_some());
        assert_eq!(outcome.initial.current_allowance, U256::from(5u64));
        assert_eq!(ledger.submission_kinds(), vec![SubmissionKind::Approve]);
        assert_eq!(ledger.allowance(fixtures::USDC, fixtures::ROUTER), amount);
    }

    #[tokio::test]
    async fn test_second_call_is_a_no_op() {
        let amount = U256::from(1_000u64);
        let ledger = Arc::new(FakeLedger::new());
        let manager = manager(&ledger);

        manager.ensure_allowance(&fixtures::usdc(), amount, ledger.signer()).await.unwrap();
        let second = manager.ensure_allowance(&fixtures::usdc(), amount, ledger.signer()).await.unwrap();

        assert!(second.was_sufficient());
        assert_eq!(ledger.submission_kinds(), vec![SubmissionKind::Approve]);
    }

    #[tokio::test]
    async fn test_non_native_token_is_never_wrapped() {
        let ledger = Arc::new(FakeLedger::new());

        let outcome = manager(&ledger)
            .ensure_allowance(&fixtures::usdc(), U256::from(1u64), ledger.signer())
            .await
            .unwrap();

        assert!(outcome.wrap.is_none());
        assert_eq!(ledger.submission_kinds(), vec![SubmissionKind::Approve]);
    }

    #[tokio::test]
    async fn test_wraps_before_approving_native() {
        let amount = U256::from(10u64).pow(U256::from(18u64));
        let ledger = Arc::new(FakeLedger::new());

        let outcome = manager(&ledger)
            .ensure_allowance(&fixtures::weth(), amount, ledger.signer())
            .await
            .unwrap();

        assert!(outcome.wrap.is_some());
        assert!(outcome.approval.is_some());
        assert_eq!(ledger.submission_kinds(), vec![SubmissionKind::Wrap, SubmissionKind::Approve]);
    }

    #[tokio::test]
    async fn test_failed_approval_is_allowance_error() {
        let ledger = Arc::new(FakeLedger::new().reverting(SubmissionKind::Approve));

        let err = manager(&ledger)
            .ensure_allowance(&fixtures::usdc(), U256::from(1u64), ledger.signer())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Allowance { stage: SwapStage::Approval, .. }));
        assert_eq!(ledger.allowance(fixtures::USDC, fixtures::ROUTER), U256::ZERO);
    }

    #[tokio::test]
    async fn test_failed_wrap_stops_before_approval() {
        // -- Arrange: no WETH, no allowance, deposits revert
        let ledger = Arc::new(FakeLedger::new().reverting(SubmissionKind::Wrap));

        // -- Act
        let err = manager(&ledger)
            .ensure_allowance(&fixtures::weth(), U256::from(1u64), ledger.signer())
            .await
            .unwrap_err();

        // -- Assert
        assert!(matches!(err, AppError::Wrap(_)));
        assert_eq!(err.stage(), Some(SwapStage::Wrap));
        assert_eq!(ledger.submission_kinds(), vec![SubmissionKind::Wrap]);
        assert_eq!(ledger.allowance(fixtures::WETH, fixtures::ROUTER), U256::ZERO);
    }

    #[tokio::test]
    async fn test_unreachable_node_during_read() {
        let ledger = Arc::new(FakeLedger::new());
        ledger.set_unavailable(true);

        let err = manager(&ledger)
            .ensure_allowance(&fixtures::usdc(), U256::from(1u64), ledger.signer())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LedgerUnavailable { stage: SwapStage::Allowance, .. }));
    }
}
