//! # EVM Library
//!
//! Ledger access and the Uniswap V3 swap components built on top of it.
//!
//! ```text
//! ┌─────────────────┐
//! │    EvmState     │  ← shared across requests
//! └────────┬────────┘
//!          │
//!          ├─► AllowanceManager ─► NativeWrapper
//!          ├─► PoolResolver
//!          ├─► QuoteEngine
//!          ├─► SwapExecutor
//!          └─► dyn LedgerGateway (EvmClient in production, FakeLedger in tests)
//! ```

pub mod abi;
pub mod client;
pub mod gateway;
pub mod state;
pub mod uniswap;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::EvmClient;
pub use gateway::{LedgerError, LedgerGateway, PendingTx, TxRequest};
pub use state::EvmState;
pub use uniswap::{
    AllowanceManager, AllowanceOutcome, NativeWrapper, PoolResolver, QuoteEngine, SwapExecutor,
};
