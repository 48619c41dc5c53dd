// In crates/engine/src/error.rs

use core_types::ExchangeError;
use thiserror::Error;

/// Why a trade cycle ended in the `Failed` phase.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("No market data for {symbol} ({timeframe})")]
    DataUnavailable { symbol: String, timeframe: String },

    #[error("Exchange call failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Sizing failed: {0}")]
    Risk(#[from] risk::Error),

    #[error("Execution failed: {0}")]
    Execution(#[from] execution::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
