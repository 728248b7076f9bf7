//! # Services Layer
//!
//! Business logic between the HTTP handlers and the EVM components:
//!
//! ```text
//! Handlers (HTTP) → SwapService → lib-evm components → LedgerGateway
//! ```
//!
//! Services return `Result<T, AppError>`; handlers turn the error into the JSON
//! error body through `AppError`'s `IntoResponse`.

pub mod swap;

pub use swap::SwapService;
