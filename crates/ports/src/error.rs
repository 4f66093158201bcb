//! Error types for the external ports.

use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// An execution already holds this idempotency key.
    #[error("idempotency key already in use: {0}")]
    DuplicateIdempotencyKey(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from the payment gateway and risk analysis services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The downstream service could not be reached or answered with a fault.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected before processing.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No payment exists with the given reference.
    #[error("unknown payment: {0}")]
    UnknownPayment(String),
}

/// Errors from notification delivery. Callers treat these as
/// best-effort and never propagate them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
