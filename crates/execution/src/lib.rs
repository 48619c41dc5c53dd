// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::OrderRequest;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod executor;
pub mod observability;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use executor::OrderExecutor;
pub use observability::{
    AttemptRecord, AttemptStatus, ExecutionEvent, ObservabilitySink, OutcomeRecord,
    RecordingSink, TracingSink,
};
pub use types::{ExecutionPolicy, FailureClass, OrderOutcome, classify};

/// The universal interface for an execution handler.
///
/// An `Executor` takes an `OrderRequest`, checks it against its limits and
/// drives it to exactly one terminal [`OrderOutcome`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// The name of the executor (e.g., "OrderExecutor").
    fn name(&self) -> &'static str;

    /// Executes a given order request.
    ///
    /// # Returns
    ///
    /// * `Ok(OrderOutcome)`: filled, rejected or exhausted. Exchange failures are
    ///   values here, not errors.
    /// * `Err(Error)`: the request failed validation, or `cancel` fired before
    ///   a terminal outcome was reached.
    async fn execute(
        &self,
        request: &OrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderOutcome>;
}
