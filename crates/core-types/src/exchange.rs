// In crates/core-types/src/exchange.rs

use crate::error::Result;
use crate::types::{Balances, Candle, ClientOrderId, OrderReport, OrderRequest, Symbol, Ticker};
use async_trait::async_trait;

/// The capability an exchange adapter must provide to the trading core.
///
/// Implementations must be safe for concurrent use: several executions may
/// share one client. Connection pooling and rate limiting are the adapter's
/// business.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// The name of the venue (e.g., "binance").
    fn name(&self) -> &'static str;

    /// Submits a new order. The price is sent only for limit orders.
    async fn create_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderReport>;

    /// Fetches total holdings keyed by currency code.
    async fn fetch_balance(&self) -> Result<Balances>;

    async fn fetch_ticker(&self, symbol: &Symbol) -> Result<Ticker>;

    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> Result<OrderReport>;

    /// Queries the current status of an existing order.
    async fn fetch_order(&self, symbol: &Symbol, order_id: &str) -> Result<OrderReport>;
}

/// Source of historical candles for signal generation.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Returns up to `limit` candles, oldest first. Failures are reported by
    /// the implementation and surface here as an empty sequence.
    async fn get_candles(&self, symbol: &Symbol, timeframe: &str, limit: u16) -> Vec<Candle>;
}
