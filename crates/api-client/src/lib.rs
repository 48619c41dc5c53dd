// In crates/api-client/src/lib.rs

use app_config::types::BinanceSettings;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{
    Balances, Candle, ClientOrderId, ExchangeClient, ExchangeError, MarketData, OrderReport,
    OrderRequest, OrderType, Side, Symbol, Ticker,
};
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use sha2::Sha256;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

pub mod error;
pub mod rate_limit;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use rate_limit::RateLimiter;
pub use types::*;

/// Converts a `BASE/QUOTE` pair into Binance's concatenated market id.
pub fn market_id(symbol: &Symbol) -> String {
    symbol.as_str().replace('/', "").to_uppercase()
}

impl ApiClient {
    /// Constructs a new ApiClient from BinanceSettings.
    pub fn new(settings: &BinanceSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        let rate_limiter = if settings.enable_rate_limit {
            RateLimiter::new(Duration::from_millis(settings.rate_limit_ms))
        } else {
            RateLimiter::disabled()
        };

        Ok(ApiClient {
            http_client,
            api_key: settings.api_key.clone(),
            secret_key: settings.secret_key.clone(),
            base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
            recv_window_ms: settings.recv_window_ms,
            rate_limiter: Arc::new(rate_limiter),
        })
    }

    /// Generates an HMAC-SHA256 signature for a given query string.
    ///
    /// # Returns
    ///
    /// A hexadecimal string representation of the signature.
    fn sign(&self, query_string: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(query_string.as_bytes());
        let result = mac.finalize();
        hex::encode(result.into_bytes())
    }

    /// Appends `recvWindow`, the current timestamp and the signature.
    fn create_signed_query(&self, params: &mut String) {
        let timestamp = Utc::now().timestamp_millis();

        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&format!(
            "recvWindow={}&timestamp={}",
            self.recv_window_ms, timestamp
        ));

        let signature = self.sign(params);
        params.push_str(&format!("&signature={}", signature));
    }

    /// Sends one request and returns the decoded JSON body.
    ///
    /// Binance reports failures as `{"code": .., "msg": ..}` with a 4xx
    /// status; 418/429/5xx are surfaced as [`Error::HttpStatus`].
    async fn send(&self, method: Method, path: &str, mut params: String, signed: bool) -> Result<Value> {
        self.rate_limiter.acquire().await;

        if signed {
            self.create_signed_query(&mut params);
        }
        let url = if params.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, params)
        };

        let mut request = self.http_client.request(method, &url);
        if signed {
            request = request.header("X-MBX-APIKEY", &self.api_key);
        }

        let response = request.send().await.map_err(Error::RequestFailed)?;
        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;
        parse_response(status, &text)
    }

    /// Fetches the spot account and its balances.
    ///
    /// This corresponds to the `GET /api/v3/account` endpoint.
    pub async fn get_account(&self) -> Result<AccountState> {
        let value = self
            .send(Method::GET, "/api/v3/account", "omitZeroBalances=true".into(), true)
            .await?;
        let account: AccountState = serde_json::from_value(value)?;
        Ok(account)
    }

    /// Latest traded price. `GET /api/v3/ticker/price`.
    pub async fn get_ticker_price(&self, symbol: &Symbol) -> Result<TickerPrice> {
        let params = format!("symbol={}", market_id(symbol));
        let value = self
            .send(Method::GET, "/api/v3/ticker/price", params, false)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetches historical kline (candlestick) data.
    ///
    /// This corresponds to the `GET /api/v3/klines` endpoint.
    ///
    /// # Arguments
    ///
    /// * `symbol`: The pair to fetch klines for.
    /// * `interval`: The kline interval (e.g., "1m", "5m", "1h").
    /// * `limit`: Number of klines to return (max 1000).
    pub async fn get_historical_klines(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>> {
        let params = format!(
            "symbol={}&interval={}&limit={}",
            market_id(symbol),
            interval,
            limit
        );
        let value = self.send(Method::GET, "/api/v3/klines", params, false).await?;
        let raw_klines: Vec<RawKline> = serde_json::from_value(value)?;

        raw_klines
            .into_iter()
            .map(|raw| -> Result<Candle> {
                Ok(Candle {
                    open_time: raw.0,
                    open: parse_decimal(&raw.1)?,
                    high: parse_decimal(&raw.2)?,
                    low: parse_decimal(&raw.3)?,
                    close: parse_decimal(&raw.4)?,
                    volume: parse_decimal(&raw.5)?,
                    close_time: raw.6,
                })
            })
            .collect()
    }

    /// Places a new order. Corresponds to `POST /api/v3/order`.
    pub async fn place_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderReport> {
        let side_str = match request.side {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };

        let mut params = format!(
            "symbol={}&side={}&quantity={}&newClientOrderId={}",
            market_id(&request.symbol),
            side_str,
            request.amount.normalize(),
            client_order_id
        );
        match (request.order_type, request.price) {
            (OrderType::Limit, Some(price)) => {
                params.push_str(&format!("&type=LIMIT&timeInForce=GTC&price={}", price.normalize()));
            }
            (OrderType::Limit, None) => {
                return Err(Error::CustomError("limit order without a price".into()));
            }
            (OrderType::Market, _) => params.push_str("&type=MARKET"),
        }

        let value = self.send(Method::POST, "/api/v3/order", params, true).await?;
        order_report(value)
    }

    /// Cancels an open order. Corresponds to `DELETE /api/v3/order`.
    pub async fn cancel_open_order(&self, symbol: &Symbol, order_id: &str) -> Result<OrderReport> {
        let params = format!("symbol={}&orderId={}", market_id(symbol), order_id);
        let value = self.send(Method::DELETE, "/api/v3/order", params, true).await?;
        order_report(value)
    }

    /// Queries an order's status. Corresponds to `GET /api/v3/order`.
    pub async fn query_order(&self, symbol: &Symbol, order_id: &str) -> Result<OrderReport> {
        let params = format!("symbol={}&orderId={}", market_id(symbol), order_id);
        let value = self.send(Method::GET, "/api/v3/order", params, true).await?;
        order_report(value)
    }

    /// Same as [`ApiClient::query_order`], looking the order up by the id we
    /// assigned at placement (`origClientOrderId`).
    pub async fn query_order_by_client_id(
        &self,
        symbol: &Symbol,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderReport> {
        let params = format!(
            "symbol={}&origClientOrderId={}",
            market_id(symbol),
            client_order_id
        );
        let value = self.send(Method::GET, "/api/v3/order", params, true).await?;
        order_report(value)
    }
}

fn parse_response(status: StatusCode, text: &str) -> Result<Value> {
    let code = status.as_u16();
    if code == 418 || code == 429 || status.is_server_error() {
        return Err(Error::HttpStatus {
            status: code,
            body: text.to_string(),
        });
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(Error::HttpStatus {
                status: code,
                body: text.to_string(),
            });
        }
        Err(e) => return Err(Error::DeserializationFailed(e)),
    };

    // Binance returns an error object on failure, so we check for that first.
    if let Some(api_code) = value.get("code").and_then(Value::as_i64) {
        if !status.is_success() || api_code != 0 {
            let msg = value
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(Error::ApiError { code: api_code, msg });
        }
    }
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: code,
            body: text.to_string(),
        });
    }
    Ok(value)
}

fn order_report(value: Value) -> Result<OrderReport> {
    let response: OrderResponse = serde_json::from_value(value.clone())?;
    Ok(response.into_report(value))
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::CustomError(format!("invalid decimal {raw:?}: {e}")))
}

// Free function to allow api_client::new usage
pub fn new(settings: &BinanceSettings) -> Result<ApiClient> {
    ApiClient::new(settings)
}

#[async_trait]
impl ExchangeClient for ApiClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
    ) -> core_types::Result<OrderReport> {
        match self.place_order(request, client_order_id).await {
            Ok(report) => Ok(report),
            // An earlier attempt with this id reached the book even though we
            // never saw its acknowledgement. Report that order instead.
            Err(e) if e.is_duplicate_order() => {
                tracing::warn!(
                    symbol = %request.symbol,
                    client_order_id = %client_order_id,
                    error = %e,
                    "Order already placed, fetching it by client order id."
                );
                Ok(self
                    .query_order_by_client_id(&request.symbol, client_order_id)
                    .await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_balance(&self) -> core_types::Result<Balances> {
        let account = self.get_account().await?;
        Ok(account
            .balances
            .iter()
            .map(|balance| (balance.asset.clone(), balance.total()))
            .collect())
    }

    async fn fetch_ticker(&self, symbol: &Symbol) -> core_types::Result<Ticker> {
        let ticker = self.get_ticker_price(symbol).await?;
        Ok(Ticker {
            symbol: symbol.clone(),
            last: ticker.price,
        })
    }

    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> core_types::Result<OrderReport> {
        let report = self.cancel_open_order(symbol, order_id).await?;
        tracing::info!(symbol = %symbol, order_id, "Order canceled.");
        Ok(report)
    }

    async fn fetch_order(&self, symbol: &Symbol, order_id: &str) -> core_types::Result<OrderReport> {
        Ok(self.query_order(symbol, order_id).await?)
    }
}

#[async_trait]
impl MarketData for ApiClient {
    async fn get_candles(&self, symbol: &Symbol, timeframe: &str, limit: u16) -> Vec<Candle> {
        match self.get_historical_klines(symbol, timeframe, limit).await {
            Ok(candles) => candles,
            Err(e) => {
                let error = ExchangeError::from(e);
                tracing::error!(symbol = %symbol, timeframe, limit, error = %error, "Candle fetch failed.");
                Vec::new()
            }
        }
    }
}
