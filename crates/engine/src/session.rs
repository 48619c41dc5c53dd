// In crates/engine/src/session.rs

use crate::signal::{Signal, derive_signal};
use crate::{Error, Result};
use app_config::SessionSettings;
use core_types::{ExchangeClient, MarketData, OrderRequest, OrderType, Symbol, balance_of};
use execution::{Executor, OrderOutcome};
use risk::{DrawdownGuard, DrawdownState, PositionSize, PositionSizeRequest, RiskPolicy, RiskSizer};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The fixed inputs of every cycle a session runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub symbol: Symbol,
    pub timeframe: String,
    pub candle_limit: u16,
    pub trend_window: usize,
    /// Percent, not fraction: 2.0 means a 2% stop.
    pub stop_loss_percent: Decimal,
    pub order_type: OrderType,
    /// Currency whose balance is the portfolio value.
    pub quote_currency: String,
}

impl From<&SessionSettings> for SessionConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            symbol: Symbol::new(settings.symbol.trim()),
            timeframe: settings.timeframe.clone(),
            candle_limit: settings.candle_limit,
            trend_window: settings.trend_window,
            stop_loss_percent: settings.stop_loss_percent,
            order_type: settings.order_type,
            quote_currency: settings.quote_currency.trim().to_uppercase(),
        }
    }
}

/// States of one trade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SignalFetched,
    Sized,
    GuardChecked,
    Executing,
    Done,
    Blocked,
    Failed,
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The executor reached a terminal outcome (which may itself be a rejection).
    Done(OrderOutcome),
    /// The drawdown guard refused the trade; nothing was submitted.
    Blocked {
        current_drawdown: Decimal,
        max_drawdown: Decimal,
    },
    Failed(Error),
}

/// Everything observed during one [`TradingSession::run_cycle`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub symbol: Symbol,
    pub signal: Option<Signal>,
    pub size: Option<PositionSize>,
    pub request: Option<OrderRequest>,
    /// Phases visited, starting with [`Phase::Idle`].
    pub path: Vec<Phase>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn phase(&self) -> Phase {
        self.path.last().copied().unwrap_or(Phase::Idle)
    }
}

/// Runs single trade decisions: signal, sizing, drawdown gate, execution.
///
/// Scheduling across time is left to the caller; see [`crate::Engine`].
pub struct TradingSession {
    config: SessionConfig,
    sizer: RiskSizer,
    guard: DrawdownGuard,
    market_data: Arc<dyn MarketData>,
    exchange: Arc<dyn ExchangeClient>,
    executor: Arc<dyn Executor>,
}

impl TradingSession {
    pub fn new(
        config: SessionConfig,
        policy: RiskPolicy,
        market_data: Arc<dyn MarketData>,
        exchange: Arc<dyn ExchangeClient>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            config,
            sizer: RiskSizer::new(policy),
            guard: DrawdownGuard::new(policy),
            market_data,
            exchange,
            executor,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Runs one cycle and logs its final outcome exactly once.
    pub async fn run_cycle(
        &self,
        current_drawdown: Decimal,
        cancel: &CancellationToken,
    ) -> CycleReport {
        let mut progress = Progress {
            signal: None,
            size: None,
            request: None,
            path: vec![Phase::Idle],
        };

        let outcome = match self.advance(&mut progress, current_drawdown, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                progress.path.push(Phase::Failed);
                CycleOutcome::Failed(e)
            }
        };
        let report = CycleReport {
            symbol: self.config.symbol.clone(),
            signal: progress.signal,
            size: progress.size,
            request: progress.request,
            path: progress.path,
            outcome,
        };
        log_outcome(&report);
        report
    }

    async fn advance(
        &self,
        progress: &mut Progress,
        current_drawdown: Decimal,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome> {
        let symbol = &self.config.symbol;

        // 1. Market data -> signal.
        let candles = self
            .market_data
            .get_candles(symbol, &self.config.timeframe, self.config.candle_limit)
            .await;
        let signal = derive_signal(&candles, self.config.trend_window).ok_or_else(|| {
            Error::DataUnavailable {
                symbol: symbol.to_string(),
                timeframe: self.config.timeframe.clone(),
            }
        })?;
        tracing::debug!(
            symbol = %symbol,
            trend = %signal.trend,
            last_close = %signal.last_close,
            sma = %signal.sma,
            candles = candles.len(),
            "Signal derived."
        );
        progress.signal = Some(signal);
        progress.path.push(Phase::SignalFetched);

        // 2. Balance -> position size.
        let balances = self.exchange.fetch_balance().await?;
        let portfolio_value = balance_of(&balances, &self.config.quote_currency);
        let size = self.sizer.size(&PositionSizeRequest {
            portfolio_value,
            stop_loss_percent: self.config.stop_loss_percent,
        })?;
        tracing::debug!(
            symbol = %symbol,
            portfolio_value = %portfolio_value,
            currency = %self.config.quote_currency,
            size = %size,
            "Position sized."
        );
        progress.size = Some(size);
        progress.path.push(Phase::Sized);

        // 3. Drawdown gate.
        let allowed = self.guard.allows(&DrawdownState {
            current_drawdown_fraction: current_drawdown,
        });
        progress.path.push(Phase::GuardChecked);
        if !allowed {
            progress.path.push(Phase::Blocked);
            return Ok(CycleOutcome::Blocked {
                current_drawdown,
                max_drawdown: self.guard.max_drawdown_fraction(),
            });
        }

        // 4. Execute.
        let side = signal.trend.side();
        let request = match self.config.order_type {
            OrderType::Market => OrderRequest::market(symbol.clone(), side, size.value()),
            OrderType::Limit => {
                let ticker = self.exchange.fetch_ticker(symbol).await?;
                OrderRequest::limit(symbol.clone(), side, size.value(), ticker.last)
            }
        };
        progress.request = Some(request.clone());
        progress.path.push(Phase::Executing);

        let outcome = self.executor.execute(&request, cancel).await?;
        progress.path.push(Phase::Done);
        Ok(CycleOutcome::Done(outcome))
    }
}

/// What a cycle has established so far.
struct Progress {
    signal: Option<Signal>,
    size: Option<PositionSize>,
    request: Option<OrderRequest>,
    path: Vec<Phase>,
}

fn log_outcome(report: &CycleReport) {
    let symbol = &report.symbol;
    let trend = report.signal.map(|signal| signal.trend.to_string());
    let size = report.size.map(|size| size.to_string());
    match &report.outcome {
        CycleOutcome::Done(OrderOutcome::Filled { order_id, .. }) => {
            tracing::info!(symbol = %symbol, ?trend, ?size, order_id = %order_id, "Trade cycle done: order filled.");
        }
        CycleOutcome::Done(outcome) => {
            tracing::warn!(symbol = %symbol, ?trend, ?size, outcome = ?outcome, "Trade cycle done: order not filled.");
        }
        CycleOutcome::Blocked {
            current_drawdown,
            max_drawdown,
        } => {
            tracing::warn!(
                symbol = %symbol,
                current_drawdown = %current_drawdown,
                max_drawdown = %max_drawdown,
                "Trade blocked: drawdown limit reached."
            );
        }
        CycleOutcome::Failed(error) => {
            tracing::error!(symbol = %symbol, ?trend, ?size, error = %error, "Trade cycle failed.");
        }
    }
}
