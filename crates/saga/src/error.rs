//! Saga error types.

use domain::{DomainError, OrderStatus};
use ports::RepositoryError;
use thiserror::Error;

/// Errors surfaced by the saga use cases and orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SagaError {
    /// Command validation failed before any state was touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// The order is not in a state the operation accepts.
    #[error("order {order_id} is {status}, expected one of {expected:?}")]
    InvalidOrderState {
        order_id: String,
        status: OrderStatus,
        expected: Vec<OrderStatus>,
    },

    /// A domain rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage failure from a repository port.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
