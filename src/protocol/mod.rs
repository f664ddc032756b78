//! HTTP protocol layer
//!
//! Request decoding, endpoint handlers, and the response envelope.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use responses::{ApiResponse, OperationResult};
