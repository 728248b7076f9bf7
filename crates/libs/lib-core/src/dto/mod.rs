//! # Data Transfer Objects (DTOs)
//!
//! Wire-level structures accepted and returned by the HTTP API. Incoming payloads
//! are validated into domain types before they reach the swap pipeline.

pub mod swap;

pub use swap::*;
