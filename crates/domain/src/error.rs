//! Domain error types.

use thiserror::Error;

use crate::money::Currency;
use crate::status::OrderStatus;

/// Errors that can occur inside the order aggregate and its value objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// The requested status transition is not in the transition table.
    #[error("cannot transition from {from} to {to}; allowed transitions: {allowed:?}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        allowed: &'static [OrderStatus],
    },

    /// A payment reference must be non-blank when stamped on a paid order.
    #[error("payment ID cannot be blank")]
    BlankPaymentId,

    /// Arithmetic between two amounts with different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// A monetary amount would become negative.
    #[error("monetary amount cannot be negative")]
    NegativeAmount,

    /// A currency code was not three uppercase ASCII letters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// A decimal amount string could not be parsed.
    #[error("invalid monetary amount: {0:?}")]
    InvalidAmount(String),

    /// An order number did not match the `ORD-<digits>` format.
    #[error("invalid order number: {0:?}, expected format ORD-<digits>")]
    InvalidOrderNumber(String),
}
