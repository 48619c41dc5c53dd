// In crates/risk/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The capital-preservation limits for a trading session.
///
/// Both fractions live in `(0, 1]`. Built once at session start and shared
/// read-only with the sizer and the drawdown guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPolicy {
    max_drawdown_fraction: Decimal,
    risk_per_trade_fraction: Decimal,
}

impl RiskPolicy {
    pub fn new(max_drawdown_fraction: Decimal, risk_per_trade_fraction: Decimal) -> Result<Self> {
        check_fraction("max_drawdown_fraction", max_drawdown_fraction)?;
        check_fraction("risk_per_trade_fraction", risk_per_trade_fraction)?;
        Ok(Self {
            max_drawdown_fraction,
            risk_per_trade_fraction,
        })
    }

    pub fn max_drawdown_fraction(&self) -> Decimal {
        self.max_drawdown_fraction
    }

    pub fn risk_per_trade_fraction(&self) -> Decimal {
        self.risk_per_trade_fraction
    }
}

impl Default for RiskPolicy {
    /// 5% drawdown ceiling, 1% of the portfolio at risk per trade.
    fn default() -> Self {
        Self {
            max_drawdown_fraction: dec!(0.05),
            risk_per_trade_fraction: dec!(0.01),
        }
    }
}

fn check_fraction(name: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(Error::InvalidParameters(format!(
            "{name} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Inputs for a single sizing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSizeRequest {
    pub portfolio_value: Decimal,
    /// Percent, not fraction: 2.0 means a 2% stop.
    pub stop_loss_percent: Decimal,
}

/// A non-negative position size quantized to six fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PositionSize(pub(crate) Decimal);

impl PositionSize {
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for PositionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<PositionSize> for Decimal {
    fn from(size: PositionSize) -> Self {
        size.0
    }
}

/// The realized drawdown at the time of a check. Tracking it over time is the
/// caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawdownState {
    pub current_drawdown_fraction: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_accepts_fractions_up_to_one() {
        let policy = RiskPolicy::new(dec!(1), dec!(0.01)).unwrap();
        assert_eq!(policy.max_drawdown_fraction(), dec!(1));
        assert_eq!(policy.risk_per_trade_fraction(), dec!(0.01));
    }

    #[test]
    fn policy_rejects_out_of_range_fractions() {
        assert!(matches!(
            RiskPolicy::new(dec!(0), dec!(0.01)),
            Err(Error::InvalidParameters(_))
        ));
        assert!(matches!(
            RiskPolicy::new(dec!(0.05), dec!(1.5)),
            Err(Error::InvalidParameters(_))
        ));
        assert!(matches!(
            RiskPolicy::new(dec!(-0.1), dec!(0.01)),
            Err(Error::InvalidParameters(_))
        ));
    }

    #[test]
    fn default_policy_matches_reference_limits() {
        let policy = RiskPolicy::default();
        assert_eq!(policy.max_drawdown_fraction(), dec!(0.05));
        assert_eq!(policy.risk_per_trade_fraction(), dec!(0.01));
    }
}
