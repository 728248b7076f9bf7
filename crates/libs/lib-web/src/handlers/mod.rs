//! # HTTP Request Handlers
//!
//! - **[`swap`]**: `POST /api/defi/swap` - run a swap end to end
//!
//! Handlers validate the request body into strongly typed values, delegate to
//! [`crate::services`], and return `AppError` on failure so every error leaves
//! the server as `{ "error", "code", "stage" }`.

pub mod swap;
