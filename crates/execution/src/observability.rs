// In crates/execution/src/observability.rs

use crate::types::{FailureClass, OrderOutcome};
use core_types::{ClientOrderId, ExchangeError, Side, Symbol};
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::time::Duration;

/// The result of a single exchange call inside the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptStatus {
    Succeeded,
    Failed {
        class: FailureClass,
        error: ExchangeError,
        /// Set when another attempt will follow after this delay.
        retry_in: Option<Duration>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub client_order_id: ClientOrderId,
    pub symbol: Symbol,
    /// Counted from 1.
    pub attempt: u32,
    pub max_attempts: u32,
    pub elapsed: Duration,
    pub status: AttemptStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub client_order_id: ClientOrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub amount: Decimal,
    pub attempts: u32,
    pub elapsed: Duration,
    pub outcome: OrderOutcome,
}

/// Structured events emitted by the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Attempt(AttemptRecord),
    Outcome(OutcomeRecord),
    Cancelled {
        client_order_id: ClientOrderId,
        symbol: Symbol,
        attempts: u32,
    },
}

/// Receiver for everything the executor wants to report. The executor never
/// writes to a logger directly.
pub trait ObservabilitySink: Send + Sync {
    fn record(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
///
/// Attempts and outcomes go out at DEBUG; the orchestrator reports the final
/// result of a cycle. Failures of unknown class are raised to ERROR with the
/// full error so they can be diagnosed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::Attempt(record) => match &record.status {
                AttemptStatus::Succeeded => tracing::debug!(
                    client_order_id = %record.client_order_id,
                    symbol = %record.symbol,
                    attempt = record.attempt,
                    max_attempts = record.max_attempts,
                    latency_ms = record.elapsed.as_millis() as u64,
                    "Order attempt succeeded."
                ),
                AttemptStatus::Failed {
                    class: FailureClass::Unknown,
                    error,
                    ..
                } => tracing::error!(
                    client_order_id = %record.client_order_id,
                    symbol = %record.symbol,
                    attempt = record.attempt,
                    max_attempts = record.max_attempts,
                    latency_ms = record.elapsed.as_millis() as u64,
                    error = ?error,
                    "Order attempt failed with an unclassified error."
                ),
                AttemptStatus::Failed {
                    class,
                    error,
                    retry_in,
                } => tracing::debug!(
                    client_order_id = %record.client_order_id,
                    symbol = %record.symbol,
                    attempt = record.attempt,
                    max_attempts = record.max_attempts,
                    latency_ms = record.elapsed.as_millis() as u64,
                    ?class,
                    error = %error,
                    retry_in = ?retry_in,
                    "Order attempt failed."
                ),
            },
            ExecutionEvent::Outcome(record) => tracing::debug!(
                client_order_id = %record.client_order_id,
                symbol = %record.symbol,
                side = %record.side,
                amount = %record.amount,
                attempts = record.attempts,
                latency_ms = record.elapsed.as_millis() as u64,
                outcome = record.outcome.label(),
                "Order execution finished."
            ),
            ExecutionEvent::Cancelled {
                client_order_id,
                symbol,
                attempts,
            } => tracing::debug!(
                client_order_id = %client_order_id,
                symbol = %symbol,
                attempts,
                "Order execution cancelled."
            ),
        }
    }
}

/// Keeps every event in memory. Used to assert on what the executor emitted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn attempts(&self) -> Vec<AttemptRecord> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ExecutionEvent::Attempt(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ExecutionEvent::Outcome(record) => Some(record),
                _ => None,
            })
            .collect()
    }
}

impl ObservabilitySink for RecordingSink {
    fn record(&self, event: &ExecutionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
