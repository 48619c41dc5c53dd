// In crates/execution/src/types.rs

use crate::{Error, Result};
use core_types::{ExchangeError, OrderReport, OrderRequest, OrderType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::time::Duration;

/// Limits and retry behaviour for one [`OrderExecutor`](crate::OrderExecutor).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPolicy {
    /// Total number of submission attempts, first one included.
    pub max_retries: u32,
    /// Largest order amount the executor will submit.
    pub max_amount: Decimal,
    /// The n-th transient failure waits `backoff_base^n` seconds.
    pub backoff_base: f64,
    /// Upper bound for a single exchange call; exceeding it counts as transient.
    pub attempt_timeout: Duration,
    /// Ceiling applied to any single backoff delay.
    pub max_backoff: Duration,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_amount: dec!(1000),
            backoff_base: 2.0,
            attempt_timeout: Duration::from_secs(10),
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl ExecutionPolicy {
    pub fn new(max_retries: u32, max_amount: Decimal, backoff_base: f64) -> Result<Self> {
        let policy = Self {
            max_retries,
            max_amount,
            backoff_base,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::InvalidPolicy("max_retries must be at least 1".into()));
        }
        if self.max_amount <= Decimal::ZERO {
            return Err(Error::InvalidPolicy(format!(
                "max_amount must be positive, got {}",
                self.max_amount
            )));
        }
        if !self.backoff_base.is_finite() || self.backoff_base < 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "backoff_base must be a finite non-negative number, got {}",
                self.backoff_base
            )));
        }
        if self.attempt_timeout.is_zero() {
            return Err(Error::InvalidPolicy("attempt_timeout must be non-zero".into()));
        }
        Ok(())
    }

    /// Delay before the attempt following failed attempt number `attempt`
    /// (counted from 1): `backoff_base^attempt` seconds, capped at `max_backoff`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_base.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Checks a request against this policy. Runs before any network call.
    pub fn validate_request(&self, request: &OrderRequest) -> Result<()> {
        if request.symbol.is_empty() {
            return Err(Error::InvalidParameter("symbol must not be empty".into()));
        }
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidParameter(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        if request.amount > self.max_amount {
            return Err(Error::LimitExceeded {
                amount: request.amount,
                max_amount: self.max_amount,
            });
        }
        match (request.order_type, request.price) {
            (OrderType::Limit, None) => Err(Error::MissingPrice),
            (OrderType::Limit, Some(price)) if price <= Decimal::ZERO => Err(
                Error::InvalidParameter(format!("limit price must be positive, got {price}")),
            ),
            (OrderType::Market, Some(price)) => Err(Error::InvalidParameter(format!(
                "market orders must not carry a price, got {price}"
            ))),
            _ => Ok(()),
        }
    }
}

/// How a failed exchange call is treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Network or timeout trouble; retried within budget.
    Transient,
    /// The exchange refused the order on business grounds; terminal.
    Rejected,
    /// Anything else; terminal and logged with full context.
    Unknown,
}

/// Maps an exchange error onto the retry policy's vocabulary.
pub fn classify(error: &ExchangeError) -> FailureClass {
    match error {
        ExchangeError::Network(_) | ExchangeError::Timeout(_) => FailureClass::Transient,
        ExchangeError::Rejected { .. } => FailureClass::Rejected,
        ExchangeError::Unexpected(_) => FailureClass::Unknown,
    }
}

/// The single terminal result of an [`execute`](crate::Executor::execute) call.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// The exchange accepted the order.
    Filled {
        order_id: String,
        details: OrderReport,
    },
    /// A non-retryable failure ended the loop (`Rejected` or `Unknown` class).
    Rejected {
        class: FailureClass,
        reason: ExchangeError,
    },
    /// Every attempt failed transiently.
    Exhausted {
        attempts: u32,
        last_error: ExchangeError,
    },
}

impl OrderOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, OrderOutcome::Filled { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderOutcome::Filled { .. } => "filled",
            OrderOutcome::Rejected { .. } => "rejected",
            OrderOutcome::Exhausted { .. } => "exhausted",
        }
    }
}
