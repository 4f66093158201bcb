//! Payment status refresh use case.

use std::sync::Arc;

use common::OrderId;
use domain::Order;
use ports::{DomainEvent, EventPublisher, OrderRepository, PaymentGateway, PaymentStatus};

use crate::error::SagaError;

/// Reconciles an order with the gateway's view of its payment.
///
/// Used for orders left in `PaymentPending` by a degraded gateway
/// response. Idempotent: repeated calls with an unchanged gateway
/// status leave the order alone and publish nothing.
pub struct RefreshPaymentStatus {
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    publisher: Arc<dyn EventPublisher>,
}

impl RefreshPaymentStatus {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            gateway,
            publisher,
        }
    }

    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn execute(&self, order_id: OrderId) -> Result<Order, SagaError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| SagaError::OrderNotFound(order_id.to_string()))?;

        let Some(payment_id) = order.payment_id.clone() else {
            tracing::debug!(order_id = %order.id, "no payment reference, nothing to refresh");
            return Ok(order);
        };

        let status = match self.gateway.check_payment_status(&payment_id).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "status check failed, leaving order unchanged");
                return Ok(order);
            }
        };

        let became_paid = match status {
            PaymentStatus::Success if !order.is_paid() => {
                order.mark_as_paid(&payment_id)?;
                true
            }
            PaymentStatus::Failed | PaymentStatus::Cancelled
                if !order.is_payment_failed() && !order.is_canceled() =>
            {
                order.mark_as_payment_failed()?;
                false
            }
            _ => {
                tracing::debug!(order_id = %order.id, gateway_status = %status, "no status change");
                return Ok(order);
            }
        };

        self.orders.save(&order).await?;
        tracing::info!(order_id = %order.id, status = %order.status, "payment status refreshed");

        if became_paid {
            let event = DomainEvent::payment_processed(&order);
            if let Err(err) = self.publisher.publish(&event).await {
                tracing::warn!(order_id = %order.id, error = %err, "payment processed event not published");
            }
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CustomerId;
    use domain::{Currency, Money, OrderItem, OrderStatus};
    use ports::{
        InMemoryEventPublisher, InMemoryOrderRepository, InMemoryPaymentGateway, PaymentRequest,
    };

    struct Fixture {
        usecase: RefreshPaymentStatus,
        orders: Arc<InMemoryOrderRepository>,
        gateway: Arc<InMemoryPaymentGateway>,
        publisher: Arc<InMemoryEventPublisher>,
    }

    fn setup() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let gateway = Arc::new(InMemoryPaymentGateway::new());
        let publisher = Arc::new(InMemoryEventPublisher::new());
        Fixture {
            usecase: RefreshPaymentStatus::new(
                orders.clone(),
                gateway.clone(),
                publisher.clone(),
            ),
            orders,
            gateway,
            publisher,
        }
    }

    /// Creates an order stuck in PaymentPending with a real gateway
    /// payment behind it.
    async fn pending_payment_order(f: &Fixture) -> (Order, String) {
        let mut order = Order::new(
            CustomerId::new(),
            "Alice",
            "alice@example.com",
            vec![OrderItem::new(
                "SKU-001",
                "Widget",
                1,
                Money::from_cents(4600, Currency::BRL).unwrap(),
            )],
        )
        .unwrap();

        f.gateway.set_outcome(PaymentStatus::Pending);
        let request = PaymentRequest::new(
            order.id,
            order.customer_id,
            order.total_amount,
            "CREDIT_CARD",
        )
        .unwrap();
        let result = f.gateway.process_payment(request).await.unwrap();
        let payment_id = result.payment_id.unwrap();

        order.attach_payment_id(&payment_id).unwrap();
        order.transition(OrderStatus::PaymentPending).unwrap();
        f.orders.save(&order).await.unwrap();
        (order, payment_id)
    }

    #[tokio::test]
    async fn test_confirmed_payment_marks_paid_and_publishes_once() {
        let f = setup();
        let (order, payment_id) = pending_payment_order(&f).await;

        f.gateway.set_payment_status(&payment_id, PaymentStatus::Success);

        let updated = f.usecase.execute(order.id).await.unwrap();
        assert!(updated.is_paid());
        assert_eq!(f.publisher.count_of("PaymentProcessed"), 1);

        // A second refresh sees the order already paid and stays quiet.
        let again = f.usecase.execute(order.id).await.unwrap();
        assert!(again.is_paid());
        assert_eq!(f.publisher.count_of("PaymentProcessed"), 1);
    }

    #[tokio::test]
    async fn test_still_pending_changes_nothing() {
        let f = setup();
        let (order, _) = pending_payment_order(&f).await;

        let updated = f.usecase.execute(order.id).await.unwrap();
        assert!(updated.is_payment_pending());
        assert!(f.publisher.published_events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_payment_marks_order_failed() {
        let f = setup();
        let (order, payment_id) = pending_payment_order(&f).await;

        f.gateway.set_payment_status(&payment_id, PaymentStatus::Failed);

        let updated = f.usecase.execute(order.id).await.unwrap();
        assert!(updated.is_payment_failed());
        assert!(f.publisher.published_events().is_empty());

        // Repeated refresh with the same gateway status is a no-op.
        let again = f.usecase.execute(order.id).await.unwrap();
        assert!(again.is_payment_failed());
    }

    #[tokio::test]
    async fn test_no_payment_reference_is_a_noop() {
        let f = setup();
        let order = Order::new(
            CustomerId::new(),
            "Alice",
            "alice@example.com",
            vec![OrderItem::new(
                "SKU-001",
                "Widget",
                1,
                Money::from_cents(100, Currency::BRL).unwrap(),
            )],
        )
        .unwrap();
        f.orders.save(&order).await.unwrap();

        let updated = f.usecase.execute(order.id).await.unwrap();
        assert!(updated.is_pending());
        assert_eq!(f.gateway.status_checks(), 0);
    }

    #[tokio::test]
    async fn test_gateway_error_leaves_order_unchanged() {
        let f = setup();
        let (order, _) = pending_payment_order(&f).await;
        f.gateway.set_fail_with_error(true);

        let updated = f.usecase.execute(order.id).await.unwrap();
        assert!(updated.is_payment_pending());
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let f = setup();
        let result = f.usecase.execute(OrderId::new()).await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
    }
}
