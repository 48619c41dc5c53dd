// In crates/risk/src/sizer.rs

use crate::types::{PositionSize, PositionSizeRequest, RiskPolicy};
use crate::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Number of fractional digits every position size is quantized to.
pub const SIZE_DECIMALS: u32 = 6;

/// Computes a fixed-fractional position size.
///
/// `risk_amount = portfolio_value * risk_per_trade_fraction`, then
/// `size = risk_amount / (stop_loss_percent / 100)`, rounded half away from
/// zero to [`SIZE_DECIMALS`] digits.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `portfolio_value <= 0`,
/// `stop_loss_percent <= 0`, `risk_per_trade_fraction` is outside `(0, 1]`, or
/// the result does not fit in a `Decimal`.
pub fn compute_size(
    portfolio_value: Decimal,
    risk_per_trade_fraction: Decimal,
    stop_loss_percent: Decimal,
) -> Result<PositionSize> {
    if portfolio_value <= Decimal::ZERO {
        return Err(Error::InvalidInput(format!(
            "portfolio value must be positive, got {portfolio_value}"
        )));
    }
    if stop_loss_percent <= Decimal::ZERO {
        return Err(Error::InvalidInput(format!(
            "stop-loss percent must be positive, got {stop_loss_percent}"
        )));
    }
    if risk_per_trade_fraction <= Decimal::ZERO || risk_per_trade_fraction > Decimal::ONE {
        return Err(Error::InvalidInput(format!(
            "risk per trade must be in (0, 1], got {risk_per_trade_fraction}"
        )));
    }

    let overflow = || Error::InvalidInput("position size overflows decimal range".to_string());

    let risk_amount = portfolio_value
        .checked_mul(risk_per_trade_fraction)
        .ok_or_else(overflow)?;
    let stop_distance = stop_loss_percent / dec!(100);
    let raw = risk_amount.checked_div(stop_distance).ok_or_else(overflow)?;

    let mut size = raw.round_dp_with_strategy(SIZE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    // round_dp never widens the scale; pad so 5000 renders as 5000.000000.
    size.rescale(SIZE_DECIMALS);
    Ok(PositionSize(size))
}

/// Position sizing bound to a session's [`RiskPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RiskSizer {
    policy: RiskPolicy,
}

impl RiskSizer {
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    pub fn size(&self, request: &PositionSizeRequest) -> Result<PositionSize> {
        compute_size(
            request.portfolio_value,
            self.policy.risk_per_trade_fraction(),
            request.stop_loss_percent,
        )
    }
}
