//! # In-Memory Ledger
//!
//! [`FakeLedger`] implements [`LedgerGateway`] over a small in-memory model of
//! the contracts the pipeline touches: ERC-20 allowances and balances of the
//! signer, the factory's pools, pool immutables, and a canned quoter result.
//!
//! Calls are dispatched on the 4-byte selector. Every read and submission is
//! recorded so tests can assert on ordering and on what was (not) sent.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream crates.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use lib_core::TxReceiptRef;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::abi::{IERC20, IQuoterV2, ISwapRouter02, IUniswapV3Factory, IUniswapV3Pool, IWETH9};
use crate::gateway::{LedgerError, LedgerGateway, PendingTx, TxRequest};

/// Addresses and tokens shared by tests.
pub mod fixtures {
    use alloy::primitives::{address, Address};
    use lib_core::config::{ContractAddresses, SwapSettings};
    use lib_core::TokenDescriptor;

    pub const SIGNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    pub const WETH: Address = address!("fff9976782d46cc05630d1f6ebab18b2324d6b14");
    pub const USDC: Address = address!("1c7d4b196cb0c7b01d743fbc6116a902379c7238");
    pub const POOL: Address = address!("3289680dd4d6c10bb19b899729cda5aef58a0d9b");
    pub const FACTORY: Address = address!("0227628f3f023bb0b980b67d528571c95c6dac1c");
    pub const QUOTER: Address = address!("ed1f6473345f45b75f8179591dd5ba1888cf2fb3");
    pub const ROUTER: Address = address!("3bfa4769fb09eefc5a80d6e87c3b9c650f7ae48e");

    pub fn weth() -> TokenDescriptor {
        TokenDescriptor {
            address: WETH,
            symbol: "WETH".to_string(),
            decimals: 18,
        }
    }

    pub fn usdc() -> TokenDescriptor {
        TokenDescriptor {
            address: USDC,
            symbol: "USDC".to_string(),
            decimals: 6,
        }
    }

    pub fn contracts() -> ContractAddresses {
        ContractAddresses {
            factory: FACTORY,
            quoter: QUOTER,
            router: ROUTER,
            wrapped_native: WETH,
        }
    }

    pub fn settings() -> SwapSettings {
        SwapSettings::default()
    }
}

/// Kind of a submitted transaction, derived from its selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionKind {
    Approve,
    Wrap,
    Swap,
    Other,
}

/// A transaction the fake ledger received.
#[derive(Debug, Clone)]
pub struct Submission {
    pub kind: SubmissionKind,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub hash: B256,
}

impl Submission {
    /// Router parameters, if this is a swap.
    pub fn decode_swap(&self) -> Option<ISwapRouter02::ExactInputSingleParams> {
        ISwapRouter02::exactInputSingleCall::abi_decode(&self.data)
            .ok()
            .map(|call| call.params)
    }
}

#[derive(Default)]
struct LedgerModel {
    /// (token, spender) -> allowance granted by the signer
    allowances: HashMap<(Address, Address), U256>,
    /// token -> signer balance
    balances: HashMap<Address, U256>,
    /// (lower token, higher token, fee) -> pool
    pools: HashMap<(Address, Address, u32), Address>,
    /// pool -> (token0, token1, fee)
    pool_tokens: HashMap<Address, (Address, Address, u32)>,
    quote: Option<Result<U256, String>>,
    reverting: HashSet<SubmissionKind>,
    unavailable: bool,
    reads: usize,
    pool_lookups: Vec<(Address, Address, u32)>,
    quote_requests: Vec<IQuoterV2::QuoteExactInputSingleParams>,
    submissions: Vec<Submission>,
    confirmed: HashSet<B256>,
}

pub struct FakeLedger {
    signer: Address,
    model: Mutex<LedgerModel>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            signer: fixtures::SIGNER,
            model: Mutex::new(LedgerModel::default()),
        }
    }

    fn model(&self) -> MutexGuard<'_, LedgerModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn model_mut(&mut self) -> &mut LedgerModel {
        self.model.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    // -- setup --------------------------------------------------------------

    pub fn with_allowance(mut self, token: Address, spender: Address, amount: U256) -> Self {
        self.model_mut().allowances.insert((token, spender), amount);
        self
    }

    pub fn with_balance(mut self, token: Address, amount: U256) -> Self {
        self.model_mut().balances.insert(token, amount);
        self
    }

    /// Register a pool for the pair at `fee`. Token order is normalized the way
    /// the factory sorts it.
    pub fn with_pool(mut self, token_a: Address, token_b: Address, fee: u32, pool: Address) -> Self {
        let (token0, token1) = sorted(token_a, token_b);
        let model = self.model_mut();
        model.pools.insert((token0, token1, fee), pool);
        model.pool_tokens.insert(pool, (token0, token1, fee));
        self
    }

    pub fn with_quote(mut self, amount_out: U256) -> Self {
        self.model_mut().quote = Some(Ok(amount_out));
        self
    }

    /// Make the quoter simulation fail with `reason`.
    pub fn with_failing_quote(mut self, reason: &str) -> Self {
        self.model_mut().quote = Some(Err(reason.to_string()));
        self
    }

    /// Make every transaction of `kind` revert on confirmation.
    pub fn reverting(mut self, kind: SubmissionKind) -> Self {
        self.model_mut().reverting.insert(kind);
        self
    }

    /// Simulate the node going away (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.model().unavailable = unavailable;
    }

    // -- inspection ---------------------------------------------------------

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.model().allowances.get(&(token, spender)).copied().unwrap_or_default()
    }

    pub fn balance(&self, token: Address) -> U256 {
        self.model().balances.get(&token).copied().unwrap_or_default()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.model().submissions.clone()
    }

    pub fn submission_kinds(&self) -> Vec<SubmissionKind> {
        self.model().submissions.iter().map(|s| s.kind).collect()
    }

    /// Number of read-only calls served.
    pub fn reads(&self) -> usize {
        self.model().reads
    }

    /// `getPool` arguments in call order, fee as a plain integer.
    pub fn pool_lookups(&self) -> Vec<(Address, Address, u32)> {
        self.model().pool_lookups.clone()
    }

    pub fn quote_requests(&self) -> Vec<IQuoterV2::QuoteExactInputSingleParams> {
        self.model().quote_requests.clone()
    }

    // -- dispatch -----------------------------------------------------------

    fn dispatch_call(&self, to: Address, data: &[u8]) -> Result<Bytes, LedgerError> {
        let mut model = self.model();
        model.reads += 1;

        let selector = data.get(..4).unwrap_or_default();
        let encoded = if selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(data).map_err(decode_err)?;
            let amount = model.allowances.get(&(to, call.spender)).copied().unwrap_or_default();
            amount.abi_encode()
        } else if selector == IERC20::balanceOfCall::SELECTOR {
            model.balances.get(&to).copied().unwrap_or_default().abi_encode()
        } else if selector == IUniswapV3Factory::getPoolCall::SELECTOR {
            let call = IUniswapV3Factory::getPoolCall::abi_decode(data).map_err(decode_err)?;
            let fee = call.fee.to::<u32>();
            model.pool_lookups.push((call.tokenA, call.tokenB, fee));
            let (token0, token1) = sorted(call.tokenA, call.tokenB);
            model.pools.get(&(token0, token1, fee)).copied().unwrap_or_default().abi_encode()
        } else if selector == IUniswapV3Pool::token0Call::SELECTOR {
            pool_tokens(&model, to)?.0.abi_encode()
        } else if selector == IUniswapV3Pool::token1Call::SELECTOR {
            pool_tokens(&model, to)?.1.abi_encode()
        } else if selector == IUniswapV3Pool::feeCall::SELECTOR {
            U256::from(pool_tokens(&model, to)?.2).abi_encode()
        } else if selector == IQuoterV2::quoteExactInputSingleCall::SELECTOR {
            let call = IQuoterV2::quoteExactInputSingleCall::abi_decode(data).map_err(decode_err)?;
            model.quote_requests.push(call.params);
            match &model.quote {
                Some(Ok(amount_out)) => (*amount_out, U256::ZERO, U256::ZERO, U256::ZERO).abi_encode_params(),
                Some(Err(reason)) => return Err(LedgerError::Rejected(reason.clone())),
                None => return Err(LedgerError::Rejected("execution reverted".to_string())),
            }
        } else {
            return Err(LedgerError::Rejected(format!(
                "unknown selector {}",
                alloy::hex::encode_prefixed(selector)
            )));
        };

        Ok(Bytes::from(encoded))
    }

    fn apply(&self, model: &mut LedgerModel, kind: SubmissionKind, tx: &TxRequest) {
        match kind {
            SubmissionKind::Approve => {
                if let Ok(call) = IERC20::approveCall::abi_decode(&tx.data) {
                    model.allowances.insert((tx.to, call.spender), call.amount);
                }
            }
            SubmissionKind::Wrap => {
                let balance = model.balances.entry(tx.to).or_default();
                *balance = balance.saturating_add(tx.value);
            }
            SubmissionKind::Swap | SubmissionKind::Other => {}
        }
    }
}

fn sorted(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn pool_tokens(model: &LedgerModel, pool: Address) -> Result<(Address, Address, u32), LedgerError> {
    model
        .pool_tokens
        .get(&pool)
        .copied()
        .ok_or_else(|| LedgerError::Rejected(format!("no contract at {}", pool)))
}

fn decode_err(err: alloy::sol_types::Error) -> LedgerError {
    LedgerError::Decode(err.to_string())
}

fn kind_of(data: &[u8]) -> SubmissionKind {
    let selector = data.get(..4).unwrap_or_default();
    if selector == IERC20::approveCall::SELECTOR {
        SubmissionKind::Approve
    } else if selector == IWETH9::depositCall::SELECTOR {
        SubmissionKind::Wrap
    } else if selector == ISwapRouter02::exactInputSingleCall::SELECTOR {
        SubmissionKind::Swap
    } else {
        SubmissionKind::Other
    }
}

#[async_trait]
impl LedgerGateway for FakeLedger {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        if self.model().unavailable {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }
        self.dispatch_call(to, &data)
    }

    async fn submit(&self, tx: TxRequest) -> Result<PendingTx, LedgerError> {
        let mut model = self.model();
        if model.unavailable {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }

        let kind = kind_of(&tx.data);
        let hash = B256::left_padding_from(&(model.submissions.len() as u64 + 1).to_be_bytes());
        if !model.reverting.contains(&kind) {
            self.apply(&mut model, kind, &tx);
            model.confirmed.insert(hash);
        }

        model.submissions.push(Submission {
            kind,
            to: tx.to,
            data: tx.data,
            value: tx.value,
            hash,
        });
        Ok(PendingTx { hash })
    }

    async fn await_confirmation(&self, pending: PendingTx) -> Result<TxReceiptRef, LedgerError> {
        let model = self.model();
        if model.unavailable {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }

        let block = model
            .submissions
            .iter()
            .position(|s| s.hash == pending.hash)
            .ok_or_else(|| LedgerError::Rejected(format!("unknown transaction {}", pending.hash)))?;

        if !model.confirmed.contains(&pending.hash) {
            return Err(LedgerError::Reverted(pending.hash));
        }
        Ok(TxReceiptRef::new(pending.hash, Some(block as u64 + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_selector_is_rejected() {
        let ledger = FakeLedger::new();
        let err = ledger.call(fixtures::WETH, Bytes::from(vec![1, 2, 3, 4])).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
        assert_eq!(ledger.reads(), 1);
    }

    #[tokio::test]
    async fn test_reverted_submission_has_no_effect() {
        let ledger = FakeLedger::new().reverting(SubmissionKind::Approve);
        let approve = IERC20::approveCall { spender: fixtures::ROUTER, amount: U256::from(9u64) };

        let pending = ledger.submit(TxRequest::new(fixtures::USDC, &approve)).await.unwrap();
        let err = ledger.await_confirmation(pending).await.unwrap_err();

        assert_eq!(err, LedgerError::Reverted(pending.hash));
        assert_eq!(ledger.allowance(fixtures::USDC, fixtures::ROUTER), U256::ZERO);
    }
}
