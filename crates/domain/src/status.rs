//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► PaymentPending ──┬──► Paid
///           ├──► Paid             └──► PaymentFailed ──► Canceled
///           ├──► PaymentFailed
///           └──► Canceled
/// ```
///
/// `Paid` and `Canceled` are terminal; no state may transition to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, awaiting payment processing.
    #[default]
    Pending,

    /// Payment accepted by the gateway but not yet confirmed.
    PaymentPending,

    /// Payment confirmed (terminal state).
    Paid,

    /// Payment processing failed; may still be canceled by compensation.
    PaymentFailed,

    /// Order canceled by the customer or by saga compensation (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns the statuses this status may transition to.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[
                OrderStatus::PaymentPending,
                OrderStatus::Paid,
                OrderStatus::PaymentFailed,
                OrderStatus::Canceled,
            ],
            OrderStatus::PaymentPending => &[OrderStatus::Paid, OrderStatus::PaymentFailed],
            OrderStatus::PaymentFailed => &[OrderStatus::Canceled],
            OrderStatus::Paid | OrderStatus::Canceled => &[],
        }
    }

    /// Returns true if a transition to `target` is permitted.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PaymentPending => "PAYMENT_PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    /// All statuses, useful for exhaustive transition checks.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::PaymentPending,
        OrderStatus::Paid,
        OrderStatus::PaymentFailed,
        OrderStatus::Canceled,
    ];
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::PaymentPending));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::PaymentFailed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Canceled));
    }

    #[test]
    fn test_payment_pending_transitions() {
        assert!(OrderStatus::PaymentPending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::PaymentPending.can_transition_to(OrderStatus::PaymentFailed));
        assert!(!OrderStatus::PaymentPending.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::PaymentPending.can_transition_to(OrderStatus::Canceled));
    }

    #[test]
    fn test_payment_failed_can_only_cancel() {
        assert_eq!(
            OrderStatus::PaymentFailed.allowed_transitions(),
            &[OrderStatus::Canceled]
        );
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        assert!(OrderStatus::Paid.allowed_transitions().is_empty());
        assert!(OrderStatus::Canceled.allowed_transitions().is_empty());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::PaymentPending.is_terminal());
        assert!(!OrderStatus::PaymentFailed.is_terminal());
    }

    #[test]
    fn test_no_self_transitions() {
        for status in OrderStatus::ALL {
            assert!(
                !status.can_transition_to(status),
                "{status} must not transition to itself"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "PENDING");
        assert_eq!(OrderStatus::PaymentPending.to_string(), "PAYMENT_PENDING");
        assert_eq!(OrderStatus::Paid.to_string(), "PAID");
        assert_eq!(OrderStatus::PaymentFailed.to_string(), "PAYMENT_FAILED");
        assert_eq!(OrderStatus::Canceled.to_string(), "CANCELED");
    }

    #[test]
    fn test_serialization_uses_screaming_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentPending).unwrap();
        assert_eq!(json, "\"PAYMENT_PENDING\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::PaymentPending);
    }
}
