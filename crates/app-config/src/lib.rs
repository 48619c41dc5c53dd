// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};
use execution::ExecutionPolicy;
use risk::RiskPolicy;
use std::time::Duration;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, BinanceSettings, ExecutionSettings, RiskSettings, SessionSettings, Settings,
};

/// Loads the application settings from the `config/` directory.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Same as [`load_settings`], reading the files from `dir`.
pub fn load_settings_from(dir: &str) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name(&format!("{dir}/base")))
        .add_source(File::with_name(&format!("{dir}/{environment}")).required(false))
        // e.g. `APP_SESSION__SYMBOL=ETH/USDT`, `APP_BINANCE__API_KEY=...`
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// Parses settings from a single TOML document, without file or env layers.
pub fn parse_settings(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Checks every section converts into the policies the core runs with.
    pub fn validate(&self) -> Result<()> {
        self.risk.policy()?;
        self.execution.policy()?;
        self.session.validate()
    }
}

impl RiskSettings {
    pub fn policy(&self) -> Result<RiskPolicy> {
        RiskPolicy::new(self.max_drawdown_fraction, self.risk_per_trade_fraction)
            .map_err(|e| Error::Validation(e.to_string()))
    }
}

impl ExecutionSettings {
    pub fn policy(&self) -> Result<ExecutionPolicy> {
        if self.attempt_timeout_secs == 0 {
            return Err(Error::Validation(
                "execution.attempt_timeout_secs must be positive".into(),
            ));
        }
        let policy = ExecutionPolicy::new(self.max_retries, self.max_amount, self.backoff_base)
            .map_err(|e| Error::Validation(e.to_string()))?
            .with_attempt_timeout(Duration::from_secs(self.attempt_timeout_secs))
            .with_max_backoff(Duration::from_secs(self.max_backoff_secs));
        Ok(policy)
    }
}

impl SessionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Validation("session.symbol must not be empty".into()));
        }
        if self.candle_limit == 0 {
            return Err(Error::Validation("session.candle_limit must be positive".into()));
        }
        if self.trend_window == 0 {
            return Err(Error::Validation("session.trend_window must be positive".into()));
        }
        if self.stop_loss_percent <= rust_decimal::Decimal::ZERO {
            return Err(Error::Validation(format!(
                "session.stop_loss_percent must be positive, got {}",
                self.stop_loss_percent
            )));
        }
        if self.quote_currency.trim().is_empty() {
            return Err(Error::Validation(
                "session.quote_currency must not be empty".into(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(Error::Validation("session.interval_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::OrderType;
    use rust_decimal_macros::dec;

    #[test]
    fn minimal_document_takes_defaults() {
        let settings = parse_settings(
            r#"
            [session]
            symbol = "BTC/USDT"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.environment, "development");
        assert_eq!(settings.binance.rest_base_url, "https://api.binance.com");
        assert!(settings.binance.enable_rate_limit);
        assert_eq!(settings.binance.rate_limit_ms, 1200);
        assert!(!settings.binance.has_credentials());

        let risk = settings.risk.policy().unwrap();
        assert_eq!(risk.max_drawdown_fraction(), dec!(0.05));
        assert_eq!(risk.risk_per_trade_fraction(), dec!(0.01));

        let execution = settings.execution.policy().unwrap();
        assert_eq!(execution.max_retries, 3);
        assert_eq!(execution.max_amount, dec!(1000));
        assert_eq!(execution.backoff_base, 2.0);
        assert_eq!(execution.attempt_timeout, Duration::from_secs(10));

        assert_eq!(settings.session.timeframe, "1h");
        assert_eq!(settings.session.candle_limit, 100);
        assert_eq!(settings.session.trend_window, 20);
        assert_eq!(settings.session.stop_loss_percent, dec!(2));
        assert_eq!(settings.session.order_type, OrderType::Market);
        assert_eq!(settings.session.quote_currency, "USDT");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let settings = parse_settings(
            r#"
            [risk]
            max_drawdown_fraction = "0.1"
            risk_per_trade_fraction = "0.02"

            [execution]
            max_retries = 5
            max_amount = "250.5"
            backoff_base = 1.5

            [session]
            symbol = "ETH/USDT"
            order_type = "limit"
            stop_loss_percent = "1.5"
            "#,
        )
        .unwrap();

        assert_eq!(settings.risk.policy().unwrap().max_drawdown_fraction(), dec!(0.1));
        let execution = settings.execution.policy().unwrap();
        assert_eq!(execution.max_retries, 5);
        assert_eq!(execution.max_amount, dec!(250.5));
        assert_eq!(execution.backoff_base, 1.5);
        assert_eq!(settings.session.order_type, OrderType::Limit);
        assert_eq!(settings.session.stop_loss_percent, dec!(1.5));
    }

    #[test]
    fn out_of_range_risk_fraction_is_rejected() {
        let result = parse_settings(
            r#"
            [risk]
            max_drawdown_fraction = "1.5"
            risk_per_trade_fraction = "0.01"

            [session]
            symbol = "BTC/USDT"
            "#,
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn zero_retries_is_rejected() {
        let result = parse_settings(
            r#"
            [execution]
            max_retries = 0

            [session]
            symbol = "BTC/USDT"
            "#,
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn session_requires_a_symbol() {
        assert!(matches!(
            parse_settings("[app]\nlog_level = \"debug\"\n"),
            Err(Error::LoadError(_))
        ));
        assert!(matches!(
            parse_settings("[session]\nsymbol = \"  \"\n"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn shipped_base_file_is_valid() {
        // Base layer only: exported APP_* variables must not leak in.
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/base.toml");
        let settings: Settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        settings.validate().unwrap();
        assert_eq!(settings.session.symbol, "BTC/USDT");
    }
}
