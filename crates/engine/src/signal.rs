// In crates/engine/src/signal.rs

use core_types::{Candle, Side};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Direction of the market relative to its recent average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// `up` buys, `down` sells.
    pub fn side(self) -> Side {
        match self {
            Trend::Up => Side::Buy,
            Trend::Down => Side::Sell,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => f.write_str("up"),
            Trend::Down => f.write_str("down"),
        }
    }
}

/// What the market data said at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub trend: Trend,
    pub last_close: Decimal,
    /// Simple moving average of the closes in the window.
    pub sma: Decimal,
    /// Number of candles that went into the average.
    pub window: usize,
}

/// Derives the trend from candles ordered oldest first.
///
/// The last close is compared against the simple moving average of the last
/// `window` closes; a close at or above the average is an uptrend. Fewer
/// candles than `window` averages what is there. Returns `None` for an empty
/// slice.
pub fn derive_signal(candles: &[Candle], window: usize) -> Option<Signal> {
    let last_close = candles.last()?.close;
    let window = window.clamp(1, candles.len());

    let closes = &candles[candles.len() - window..];
    let sum: Decimal = closes.iter().map(|candle| candle.close).sum();
    let sma = sum / Decimal::from(window);

    let trend = if last_close >= sma { Trend::Up } else { Trend::Down };
    Some(Signal {
        trend,
        last_close,
        sma,
        window,
    })
}
