// In crates/app-config/src/types.rs

use core_types::OrderType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Settings for the Binance API.
    #[serde(default)]
    pub binance: BinanceSettings,
    /// Capital-preservation limits.
    #[serde(default)]
    pub risk: RiskSettings,
    /// Retry budget and order limits for the executor.
    #[serde(default)]
    pub execution: ExecutionSettings,
    /// What a trade cycle trades and how it reads the market.
    pub session: SessionSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The log level for the application. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct BinanceSettings {
    /// The API key for Binance. Only signed endpoints need it.
    #[serde(default)]
    pub api_key: String,
    /// The secret key for Binance.
    #[serde(default)]
    pub secret_key: String,
    /// The REST API base URL for Binance.
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
    /// Space requests at least `rate_limit_ms` apart.
    #[serde(default = "default_true")]
    pub enable_rate_limit: bool,
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    /// Transport-level timeout for a single HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BinanceSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            rest_base_url: default_rest_base_url(),
            enable_rate_limit: true,
            rate_limit_ms: default_rate_limit_ms(),
            recv_window_ms: default_recv_window_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BinanceSettings {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RiskSettings {
    /// New trades are blocked once drawdown reaches this fraction.
    pub max_drawdown_fraction: Decimal,
    /// Fraction of the portfolio put at risk by one trade.
    pub risk_per_trade_fraction: Decimal,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_drawdown_fraction: dec!(0.05),
            risk_per_trade_fraction: dec!(0.01),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExecutionSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_amount")]
    pub max_amount: Decimal,
    /// Backoff before retry `n` is `backoff_base^n` seconds.
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_amount: default_max_amount(),
            backoff_base: default_backoff_base(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionSettings {
    /// Pair in `BASE/QUOTE` form, e.g. "BTC/USDT".
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_candle_limit")]
    pub candle_limit: u16,
    /// Number of closes in the trend moving average.
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Percent, not fraction: 2.0 means a 2% stop.
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: Decimal,
    #[serde(default)]
    pub order_type: OrderType,
    /// Currency whose balance is the portfolio value.
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    /// Pause between cycles for the `run` command.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

// Helper functions for serde defaults
fn default_environment() -> String {
    "development".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_rest_base_url() -> String {
    "https://api.binance.com".into()
}
fn default_true() -> bool {
    true
}
fn default_rate_limit_ms() -> u64 {
    1200
}
fn default_recv_window_ms() -> u64 {
    5000
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_max_amount() -> Decimal {
    dec!(1000)
}
fn default_backoff_base() -> f64 {
    2.0
}
fn default_attempt_timeout_secs() -> u64 {
    10
}
fn default_max_backoff_secs() -> u64 {
    300
}
fn default_timeframe() -> String {
    "1h".into()
}
fn default_candle_limit() -> u16 {
    100
}
fn default_trend_window() -> usize {
    20
}
fn default_stop_loss_percent() -> Decimal {
    dec!(2.0)
}
fn default_quote_currency() -> String {
    "USDT".into()
}
fn default_interval_secs() -> u64 {
    3600
}
