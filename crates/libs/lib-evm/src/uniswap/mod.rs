//! Uniswap V3 swap components.
//!
//! Each component owns one pipeline stage and tags its failures with that stage.

pub mod allowance;
pub mod executor;
pub mod pool;
pub mod quote;
pub mod wrapper;

pub use allowance::{AllowanceManager, AllowanceOutcome};
pub use executor::SwapExecutor;
pub use pool::PoolResolver;
pub use quote::QuoteEngine;
pub use wrapper::NativeWrapper;
