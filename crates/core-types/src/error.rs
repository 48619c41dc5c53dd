// In crates/core-types/src/error.rs

use std::time::Duration;
use thiserror::Error;

/// The failure kinds an exchange collaborator is required to surface.
///
/// Adapters map their transport and venue errors onto these variants so that
/// callers can tell network trouble apart from business-rule rejections
/// without knowing anything about a particular exchange's error hierarchy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// Connection refused/reset, DNS failure, gateway errors, rate limiting.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The exchange understood the request and refused it (insufficient
    /// balance, bad lot size, unknown symbol, ...).
    #[error("exchange rejected request: code {code}, msg: {msg}")]
    Rejected { code: i64, msg: String },

    /// Anything the adapter could not place in the other buckets, e.g. a
    /// response body that failed to decode.
    #[error("unexpected exchange failure: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
