// In crates/core-types/src/lib.rs

pub mod error;
pub mod exchange;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{ExchangeError, Result};
pub use exchange::{ExchangeClient, MarketData};
pub use types::{
    Balances, Candle, ClientOrderId, OrderReport, OrderRequest, OrderStatus, OrderType, Side,
    Symbol, Ticker, balance_of,
};
