// In crates/execution/src/executor.rs

use crate::observability::{
    AttemptRecord, AttemptStatus, ExecutionEvent, ObservabilitySink, OutcomeRecord,
};
use crate::types::{ExecutionPolicy, FailureClass, OrderOutcome, classify};
use crate::{Error, Executor, Result};
use async_trait::async_trait;
use core_types::{ClientOrderId, ExchangeClient, ExchangeError, OrderRequest};
use std::sync::Arc;
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Submits orders through an [`ExchangeClient`] with validation and bounded
/// retry-with-backoff.
///
/// Each `execute` call owns its retry state; the only thing shared between
/// concurrent calls is the exchange client.
pub struct OrderExecutor {
    exchange: Arc<dyn ExchangeClient>,
    policy: ExecutionPolicy,
    sink: Arc<dyn ObservabilitySink>,
}

impl OrderExecutor {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        policy: ExecutionPolicy,
        sink: Arc<dyn ObservabilitySink>,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            exchange,
            policy,
            sink,
        })
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    fn next_client_order_id() -> ClientOrderId {
        ClientOrderId(Uuid::new_v4().simple().to_string())
    }

    fn cancelled(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
        attempts: u32,
        last_error: Option<ExchangeError>,
    ) -> Error {
        self.sink.record(&ExecutionEvent::Cancelled {
            client_order_id: client_order_id.clone(),
            symbol: request.symbol.clone(),
            attempts,
        });
        Error::Cancelled {
            attempts,
            last_error,
        }
    }

    fn finish(
        &self,
        request: &OrderRequest,
        client_order_id: &ClientOrderId,
        attempts: u32,
        started: Instant,
        outcome: OrderOutcome,
    ) -> OrderOutcome {
        self.sink.record(&ExecutionEvent::Outcome(OutcomeRecord {
            client_order_id: client_order_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            amount: request.amount,
            attempts,
            elapsed: started.elapsed(),
            outcome: outcome.clone(),
        }));
        outcome
    }
}

#[async_trait]
impl Executor for OrderExecutor {
    fn name(&self) -> &'static str {
        "OrderExecutor"
    }

    async fn execute(
        &self,
        request: &OrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderOutcome> {
        // Validation failures never reach the exchange.
        self.policy.validate_request(request)?;

        let client_order_id = Self::next_client_order_id();
        let max_attempts = self.policy.max_retries;
        let started = Instant::now();
        let mut last_error: Option<ExchangeError> = None;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(self.cancelled(request, &client_order_id, attempt - 1, last_error));
            }

            // An in-flight submission is never abandoned on cancellation: the
            // order may already exist server-side. The attempt timeout bounds it.
            let attempt_started = Instant::now();
            let result = match timeout(
                self.policy.attempt_timeout,
                self.exchange.create_order(request, &client_order_id),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ExchangeError::Timeout(self.policy.attempt_timeout)),
            };
            let elapsed = attempt_started.elapsed();

            let error = match result {
                Ok(report) => {
                    self.sink.record(&ExecutionEvent::Attempt(AttemptRecord {
                        client_order_id: client_order_id.clone(),
                        symbol: request.symbol.clone(),
                        attempt,
                        max_attempts,
                        elapsed,
                        status: AttemptStatus::Succeeded,
                    }));
                    let outcome = OrderOutcome::Filled {
                        order_id: report.order_id.clone(),
                        details: report,
                    };
                    return Ok(self.finish(request, &client_order_id, attempt, started, outcome));
                }
                Err(error) => error,
            };

            let class = classify(&error);
            let retry_in = (class == FailureClass::Transient && attempt < max_attempts)
                .then(|| self.policy.backoff_delay(attempt));

            self.sink.record(&ExecutionEvent::Attempt(AttemptRecord {
                client_order_id: client_order_id.clone(),
                symbol: request.symbol.clone(),
                attempt,
                max_attempts,
                elapsed,
                status: AttemptStatus::Failed {
                    class,
                    error: error.clone(),
                    retry_in,
                },
            }));

            if class != FailureClass::Transient {
                let outcome = OrderOutcome::Rejected {
                    class,
                    reason: error,
                };
                return Ok(self.finish(request, &client_order_id, attempt, started, outcome));
            }

            last_error = Some(error);

            if let Some(delay) = retry_in {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(self.cancelled(request, &client_order_id, attempt, last_error));
                    }
                    _ = sleep(delay) => {}
                }
            }
        }

        let last_error = last_error
            .unwrap_or_else(|| ExchangeError::Unexpected("retry budget exhausted without an attempt".into()));
        let outcome = OrderOutcome::Exhausted {
            attempts: max_attempts,
            last_error,
        };
        Ok(self.finish(request, &client_order_id, max_attempts, started, outcome))
    }
}
