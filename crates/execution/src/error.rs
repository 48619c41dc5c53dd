// In crates/execution/src/error.rs

use core_types::ExchangeError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures raised by the executor itself, before or instead of a terminal
/// [`OrderOutcome`](crate::OrderOutcome). None of these are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Order amount {amount} exceeds maximum allowed {max_amount}")]
    LimitExceeded { amount: Decimal, max_amount: Decimal },

    #[error("Price must be specified for limit orders")]
    MissingPrice,

    #[error("Invalid order parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid execution policy: {0}")]
    InvalidPolicy(String),

    #[error("Execution cancelled after {attempts} attempt(s)")]
    Cancelled {
        attempts: u32,
        last_error: Option<ExchangeError>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
