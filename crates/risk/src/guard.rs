// In crates/risk/src/guard.rs

use crate::types::{DrawdownState, RiskPolicy};
use rust_decimal::Decimal;

/// Returns `true` when a new trade may be opened.
///
/// Allowed iff `current_drawdown_fraction < max_drawdown_fraction`; reaching
/// the ceiling exactly blocks. Negative inputs always block.
pub fn is_trade_allowed(current_drawdown_fraction: Decimal, max_drawdown_fraction: Decimal) -> bool {
    if current_drawdown_fraction.is_sign_negative() || max_drawdown_fraction.is_sign_negative() {
        return false;
    }
    current_drawdown_fraction < max_drawdown_fraction
}

/// Drawdown gate bound to a session's [`RiskPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct DrawdownGuard {
    policy: RiskPolicy,
}

impl DrawdownGuard {
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    pub fn allows(&self, state: &DrawdownState) -> bool {
        is_trade_allowed(
            state.current_drawdown_fraction,
            self.policy.max_drawdown_fraction(),
        )
    }

    pub fn max_drawdown_fraction(&self) -> Decimal {
        self.policy.max_drawdown_fraction()
    }
}
