//! # Core Library
//!
//! Core models, configuration, errors and request/response types for the swap service.

pub mod config;
pub mod error;
pub mod model;
pub mod dto;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result, SwapStage};
pub use model::{
    AllowanceState, AmountSpec, PoolInfo, Quote, SwapOutcome, SwapParams, SwapProgress,
    SwapState, TokenDescriptor, TxReceiptRef,
};
