// In crates/core-types/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A trading pair identifier in `BASE/QUOTE` form (e.g. "BTC/USDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(pair: impl Into<String>) -> Self {
        Self(pair.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The base asset, e.g. "BTC" for "BTC/USDT".
    pub fn base(&self) -> Option<&str> {
        self.0.split_once('/').map(|(base, _)| base)
    }

    /// The quote asset, e.g. "USDT" for "BTC/USDT".
    pub fn quote(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, quote)| quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => f.write_str("market"),
            OrderType::Limit => f.write_str("limit"),
        }
    }
}

/// A request to place a single order.
///
/// Construction does not validate anything; the executor checks the request
/// against its policy before any network call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub amount: Decimal,
    pub order_type: OrderType,
    /// Required for limit orders, absent for market orders.
    pub price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: Symbol, side: Side, amount: Decimal) -> Self {
        Self {
            symbol,
            side,
            amount,
            order_type: OrderType::Market,
            price: None,
        }
    }

    pub fn limit(symbol: Symbol, side: Side, amount: Decimal, price: Decimal) -> Self {
        Self {
            symbol,
            side,
            amount,
            order_type: OrderType::Limit,
            price: Some(price),
        }
    }
}

/// Client-generated order identifier, reused across retries of one submission
/// so the exchange can de-duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(pub String);

impl ClientOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One OHLCV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub last: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    #[serde(other)]
    Unknown,
}

/// The exchange's view of an order, as returned by create/cancel/status calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
    /// Exchange-assigned order id.
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub executed_qty: Decimal,
    /// The untouched response body, kept for diagnosis and persistence.
    pub raw: serde_json::Value,
}

/// Total holdings per currency code.
pub type Balances = HashMap<String, Decimal>;

/// Holdings of one currency, zero when the account has none.
pub fn balance_of(balances: &Balances, currency: &str) -> Decimal {
    balances
        .get(currency)
        .or_else(|| balances.get(&currency.to_uppercase()))
        .copied()
        .unwrap_or(Decimal::ZERO)
}
