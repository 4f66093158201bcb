//! Payment processing use case.

use std::sync::Arc;

use domain::{Order, OrderStatus};
use ports::{Notification, OrderRepository, PaymentGateway, PaymentRequest, PaymentResult};

use crate::command::ProcessPaymentCommand;
use crate::error::SagaError;

/// Charges a pending order through the payment gateway and records the
/// outcome on the order.
///
/// The gateway is expected to be wrapped in a resilient decorator, so
/// results arrive as values; a raw transport error is treated the same
/// as a declined payment.
pub struct ProcessPayment {
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notification>,
}

impl ProcessPayment {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notification>,
    ) -> Self {
        Self {
            orders,
            gateway,
            notifier,
        }
    }

    #[tracing::instrument(skip(self, command), fields(order_id = %command.order_id))]
    pub async fn execute(&self, command: ProcessPaymentCommand) -> Result<Order, SagaError> {
        let mut order = self
            .orders
            .find_by_id(command.order_id)
            .await?
            .ok_or_else(|| SagaError::OrderNotFound(command.order_id.to_string()))?;

        if !order.is_pending() {
            return Err(SagaError::InvalidOrderState {
                order_id: order.id.to_string(),
                status: order.status,
                expected: vec![OrderStatus::Pending],
            });
        }

        if command.currency != order.total_amount.currency() {
            return Err(SagaError::Validation(format!(
                "payment currency {} does not match order currency {}",
                command.currency,
                order.total_amount.currency()
            )));
        }

        let request = PaymentRequest::new(
            order.id,
            order.customer_id,
            order.total_amount,
            command.payment_method,
        )
        .map_err(|err| SagaError::Validation(err.to_string()))?;

        let result = match self.gateway.process_payment(request).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(order_id = %order.id, error = %err, "gateway returned an error, treating as declined");
                PaymentResult::failed(err.to_string())
            }
        };

        match (&result.payment_id, result.is_successful(), result.is_pending()) {
            (Some(payment_id), true, _) => {
                order.mark_as_paid(payment_id)?;
                tracing::info!(order_id = %order.id, payment_id, "payment confirmed");
            }
            (Some(payment_id), _, true) => {
                order.attach_payment_id(payment_id)?;
                order.transition(OrderStatus::PaymentPending)?;
                tracing::info!(order_id = %order.id, payment_id, "payment accepted, awaiting confirmation");
            }
            _ => {
                order.mark_as_payment_failed()?;
                tracing::warn!(order_id = %order.id, reason = %result.message, "payment failed");
            }
        }

        self.orders.save(&order).await?;

        let notification = if order.is_payment_failed() {
            self.notifier.payment_failed(&order, &result.message).await
        } else {
            self.notifier.order_status_changed(&order).await
        };
        if let Err(err) = notification {
            tracing::warn!(order_id = %order.id, error = %err, "payment notification failed");
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CustomerId, OrderId};
    use domain::{Currency, Money, OrderItem};
    use ports::{
        InMemoryOrderRepository, InMemoryPaymentGateway, PaymentStatus, RecordingNotification,
        SentNotification,
    };

    struct Fixture {
        usecase: ProcessPayment,
        orders: Arc<InMemoryOrderRepository>,
        gateway: Arc<InMemoryPaymentGateway>,
        notifier: Arc<RecordingNotification>,
    }

    fn setup() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let gateway = Arc::new(InMemoryPaymentGateway::new());
        let notifier = Arc::new(RecordingNotification::new());
        Fixture {
            usecase: ProcessPayment::new(orders.clone(), gateway.clone(), notifier.clone()),
            orders,
            gateway,
            notifier,
        }
    }

    async fn pending_order(orders: &InMemoryOrderRepository) -> Order {
        let order = Order::new(
            CustomerId::new(),
            "Alice",
            "alice@example.com",
            vec![OrderItem::new(
                "SKU-001",
                "Widget",
                2,
                Money::from_cents(1050, Currency::BRL).unwrap(),
            )],
        )
        .unwrap();
        orders.save(&order).await.unwrap();
        order
    }

    fn command(order_id: OrderId) -> ProcessPaymentCommand {
        ProcessPaymentCommand {
            order_id,
            payment_method: "CREDIT_CARD".to_string(),
            currency: Currency::BRL,
        }
    }

    #[tokio::test]
    async fn test_successful_payment_marks_paid() {
        let f = setup();
        let order = pending_order(&f.orders).await;

        let updated = f.usecase.execute(command(order.id)).await.unwrap();
        assert!(updated.is_paid());
        assert!(updated.payment_id.is_some());
        assert_eq!(f.gateway.process_calls(), 1);
        assert!(matches!(
            f.notifier.sent()[0],
            SentNotification::StatusChanged { .. }
        ));
    }

    #[tokio::test]
    async fn test_declined_payment_marks_failed() {
        let f = setup();
        f.gateway.set_outcome(PaymentStatus::Failed);
        let order = pending_order(&f.orders).await;

        let updated = f.usecase.execute(command(order.id)).await.unwrap();
        assert!(updated.is_payment_failed());
        assert!(updated.payment_id.is_none());
        assert!(matches!(
            f.notifier.sent()[0],
            SentNotification::PaymentFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_pending_payment_attaches_id_and_waits() {
        let f = setup();
        f.gateway.set_outcome(PaymentStatus::Pending);
        let order = pending_order(&f.orders).await;

        let updated = f.usecase.execute(command(order.id)).await.unwrap();
        assert!(updated.is_payment_pending());
        assert!(updated.payment_id.is_some());
    }

    #[tokio::test]
    async fn test_gateway_error_treated_as_declined() {
        let f = setup();
        f.gateway.set_fail_with_error(true);
        let order = pending_order(&f.orders).await;

        let updated = f.usecase.execute(command(order.id)).await.unwrap();
        assert!(updated.is_payment_failed());
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let f = setup();
        let result = f.usecase.execute(command(OrderId::new())).await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_pending_order() {
        let f = setup();
        let mut order = pending_order(&f.orders).await;
        order.mark_as_paid("pay_1").unwrap();
        f.orders.save(&order).await.unwrap();

        let result = f.usecase.execute(command(order.id)).await;
        match result {
            Err(SagaError::InvalidOrderState { status, expected, .. }) => {
                assert_eq!(status, OrderStatus::Paid);
                assert_eq!(expected, vec![OrderStatus::Pending]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // No charge was attempted.
        assert_eq!(f.gateway.process_calls(), 0);
    }

    #[tokio::test]
    async fn test_rejects_currency_mismatch() {
        let f = setup();
        let order = pending_order(&f.orders).await;

        let mut cmd = command(order.id);
        cmd.currency = Currency::USD;

        let result = f.usecase.execute(cmd).await;
        assert!(matches!(result, Err(SagaError::Validation(_))));
        // The order was charged in BRL, so the USD request never reaches
        // the gateway.
        assert_eq!(f.gateway.process_calls(), 0);
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let f = setup();
        f.notifier.set_fail_on_send(true);
        let order = pending_order(&f.orders).await;

        let updated = f.usecase.execute(command(order.id)).await.unwrap();
        assert!(updated.is_paid());
    }
}
