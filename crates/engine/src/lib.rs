// In crates/engine/src/lib.rs

pub mod error;
pub mod session;
pub mod signal;

pub use error::{Error, Result};
pub use session::{CycleOutcome, CycleReport, Phase, SessionConfig, TradingSession};
pub use signal::{Signal, Trend, derive_signal};

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Repeats trade cycles of one session on a fixed interval.
pub struct Engine {
    session: Arc<TradingSession>,
    interval: Duration,
}

impl Engine {
    pub fn new(session: Arc<TradingSession>, interval: Duration) -> Self {
        Self {
            session,
            // tokio's interval panics on zero.
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// The main run method for the loop.
    ///
    /// Runs a cycle immediately, then once per interval, until `cancel`
    /// fires. Cancellation also reaches the executor, so a cycle that is
    /// waiting out a retry backoff stops promptly. Returns the number of
    /// cycles started.
    ///
    /// `current_drawdown` is called once at the start of every cycle; pass
    /// `|| value` for a figure that stays fixed for the whole run.
    pub async fn run<F>(&self, current_drawdown: F, cancel: &CancellationToken) -> usize
    where
        F: Fn() -> Decimal,
    {
        let symbol = &self.session.config().symbol;
        tracing::info!(symbol = %symbol, interval = ?self.interval, "Starting trading loop.");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            cycles += 1;
            let drawdown = current_drawdown();
            let report = self.session.run_cycle(drawdown, cancel).await;
            tracing::debug!(symbol = %symbol, cycle = cycles, phase = ?report.phase(), "Cycle finished.");
        }

        tracing::info!(symbol = %symbol, cycles, "Trading loop stopped.");
        cycles
    }
}
