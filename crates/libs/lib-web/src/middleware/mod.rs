//! # Middleware
//!
//! - **[`mw_req_stamp`]**: request ID and timestamp stamping
//! - **[`mw_logging`]**: structured request/response logging

pub mod mw_logging;
pub mod mw_req_stamp;

pub use mw_logging::log_requests;
pub use mw_req_stamp::{stamp_req, RequestStamp, REQUEST_ID_HEADER};
