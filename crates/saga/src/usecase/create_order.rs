//! Order creation use case.

use std::sync::Arc;

use domain::Order;
use ports::{Notification, OrderRepository};

use crate::command::CreateOrderCommand;
use crate::error::SagaError;

/// Validates and persists a new order, then notifies the customer.
pub struct CreateOrder {
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notification>,
}

impl CreateOrder {
    pub fn new(orders: Arc<dyn OrderRepository>, notifier: Arc<dyn Notification>) -> Self {
        Self { orders, notifier }
    }

    /// Creates a pending order. Validation happens before anything is
    /// persisted; the notification is best-effort.
    #[tracing::instrument(skip(self, command), fields(customer_id = %command.customer_id))]
    pub async fn execute(&self, command: CreateOrderCommand) -> Result<Order, SagaError> {
        Self::validate(&command)?;

        let order = Order::new(
            command.customer_id,
            command.customer_name,
            command.customer_email,
            command.items,
        )?;
        self.orders.save(&order).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order created"
        );

        if let Err(err) = self.notifier.order_created(&order).await {
            tracing::warn!(order_id = %order.id, error = %err, "order created notification failed");
        }

        Ok(order)
    }

    fn validate(command: &CreateOrderCommand) -> Result<(), SagaError> {
        if command.customer_id.as_uuid().is_nil() {
            return Err(SagaError::Validation(
                "customer id is required".to_string(),
            ));
        }
        if command.customer_email.trim().is_empty() {
            return Err(SagaError::Validation(
                "customer email is required".to_string(),
            ));
        }
        if command.items.is_empty() {
            return Err(SagaError::Validation(
                "order must have at least one item".to_string(),
            ));
        }
        if command.items.iter().any(|item| item.quantity == 0) {
            return Err(SagaError::Validation(
                "item quantity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
