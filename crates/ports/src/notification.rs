//! Customer notification port and adapters.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Order;

use crate::error::NotificationError;

/// Customer notification port. All notifications are fire-and-forget;
/// callers log failures and continue.
#[async_trait]
pub trait Notification: Send + Sync {
    async fn order_created(&self, order: &Order) -> Result<(), NotificationError>;

    async fn order_status_changed(&self, order: &Order) -> Result<(), NotificationError>;

    async fn payment_failed(&self, order: &Order, reason: &str) -> Result<(), NotificationError>;

    async fn order_canceled(&self, order: &Order) -> Result<(), NotificationError>;
}

/// Notification adapter that only writes structured logs. The default
/// for local runs, where no channel is wired up.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotification;

impl LoggingNotification {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notification for LoggingNotification {
    async fn order_created(&self, order: &Order) -> Result<(), NotificationError> {
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            customer_email = %order.customer_email,
            "notify: order created"
        );
        Ok(())
    }

    async fn order_status_changed(&self, order: &Order) -> Result<(), NotificationError> {
        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            "notify: order status changed"
        );
        Ok(())
    }

    async fn payment_failed(&self, order: &Order, reason: &str) -> Result<(), NotificationError> {
        tracing::info!(order_id = %order.id, reason, "notify: payment failed");
        Ok(())
    }

    async fn order_canceled(&self, order: &Order) -> Result<(), NotificationError> {
        tracing::info!(order_id = %order.id, "notify: order canceled");
        Ok(())
    }
}

/// A notification sent through the [`RecordingNotification`] adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    OrderCreated { order_number: String },
    StatusChanged { order_number: String, status: String },
    PaymentFailed { order_number: String, reason: String },
    OrderCanceled { order_number: String },
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<SentNotification>,
    fail_on_send: bool,
}

/// Notification adapter that records what was sent, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotification {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes send calls fail.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.state.read().unwrap().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    fn record(&self, notification: SentNotification) -> Result<(), NotificationError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(NotificationError::Delivery(
                "notification channel down".to_string(),
            ));
        }
        state.sent.push(notification);
        Ok(())
    }
}

#[async_trait]
impl Notification for RecordingNotification {
    async fn order_created(&self, order: &Order) -> Result<(), NotificationError> {
        self.record(SentNotification::OrderCreated {
            order_number: order.order_number.as_str().to_string(),
        })
    }

    async fn order_status_changed(&self, order: &Order) -> Result<(), NotificationError> {
        self.record(SentNotification::StatusChanged {
            order_number: order.order_number.as_str().to_string(),
            status: order.status.as_str().to_string(),
        })
    }

    async fn payment_failed(&self, order: &Order, reason: &str) -> Result<(), NotificationError> {
        self.record(SentNotification::PaymentFailed {
            order_number: order.order_number.as_str().to_string(),
            reason: reason.to_string(),
        })
    }

    async fn order_canceled(&self, order: &Order) -> Result<(), NotificationError> {
        self.record(SentNotification::OrderCanceled {
            order_number: order.order_number.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CustomerId;
    use domain::{Currency, Money, OrderItem};

    fn sample_order() -> Order {
        Order::new(
            CustomerId::new(),
            "Alice",
            "alice@example.com",
            vec![OrderItem::new(
                "SKU-001",
                "Widget",
                1,
                Money::from_cents(1000, Currency::BRL).unwrap(),
            )],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_recording_adapter_captures_notifications() {
        let notifier = RecordingNotification::new();
        let order = sample_order();

        notifier.order_created(&order).await.unwrap();
        notifier.payment_failed(&order, "declined").await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], SentNotification::OrderCreated { .. }));
        assert!(matches!(
            &sent[1],
            SentNotification::PaymentFailed { reason, .. } if reason == "declined"
        ));
    }

    #[tokio::test]
    async fn test_fail_on_send() {
        let notifier = RecordingNotification::new();
        notifier.set_fail_on_send(true);
        let result = notifier.order_created(&sample_order()).await;
        assert!(result.is_err());
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_logging_adapter_always_succeeds() {
        let notifier = LoggingNotification::new();
        let order = sample_order();
        assert!(notifier.order_created(&order).await.is_ok());
        assert!(notifier.order_status_changed(&order).await.is_ok());
        assert!(notifier.payment_failed(&order, "declined").await.is_ok());
        assert!(notifier.order_canceled(&order).await.is_ok());
    }
}
