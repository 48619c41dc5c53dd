// In crates/api-client/src/types.rs

use crate::rate_limit::RateLimiter;
use core_types::{OrderReport, OrderStatus};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

/// The main client for interacting with the Binance Spot REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The user's Binance API key.
    pub api_key: String,
    /// The user's Binance secret key.
    pub secret_key: String,
    /// The base URL for the Binance Spot API.
    pub base_url: String,
    /// How long a signed request stays valid on the server side.
    pub recv_window_ms: u64,
    /// Shared spacing between outgoing requests.
    pub rate_limiter: Arc<RateLimiter>,
}

/// Represents a single asset's balance in the spot account.
#[derive(Debug, Deserialize, Clone)]
pub struct AssetBalance {
    /// The asset's symbol (e.g., "USDT").
    pub asset: String,
    /// Available for trading.
    pub free: Decimal,
    /// Held by open orders.
    pub locked: Decimal,
}

impl AssetBalance {
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// The subset of `GET /api/v3/account` the client cares about.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub can_trade: bool,
    pub balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

/// Temporary struct to deserialize the kline response from Binance,
/// which is a JSON array of mixed types.
#[derive(Debug, Deserialize)]
pub struct RawKline(
    pub i64,    // 0: Open time
    pub String, // 1: Open
    pub String, // 2: High
    pub String, // 3: Low
    pub String, // 4: Close
    pub String, // 5: Volume
    pub i64,    // 6: Close time
    pub String, // 7: Quote asset volume
    pub i64,    // 8: Number of trades
    pub String, // 9: Taker buy base asset volume
    pub String, // 10: Taker buy quote asset volume
    pub String, // 11: Ignore
);

/// Order payload shared by the create, cancel and query endpoints.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: i64,
    pub client_order_id: Option<String>,
    /// Present on cancel responses, where `client_order_id` is the cancel's own id.
    pub orig_client_order_id: Option<String>,
    pub status: OrderStatus,
    pub executed_qty: Decimal,
}

impl OrderResponse {
    pub fn into_report(self, raw: serde_json::Value) -> OrderReport {
        OrderReport {
            order_id: self.order_id.to_string(),
            client_order_id: self.orig_client_order_id.or(self.client_order_id),
            status: self.status,
            executed_qty: self.executed_qty,
            raw,
        }
    }
}
