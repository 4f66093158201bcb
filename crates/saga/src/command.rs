//! Saga command and result types.

use common::{CustomerId, OrderId, SagaId};
use domain::{Currency, Order, OrderItem};
use serde::{Deserialize, Serialize};

/// Input for one saga run: everything needed to create the order and
/// charge the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSagaCommand {
    /// Client-supplied deduplication key. Repeated submissions with the
    /// same key do not start a second saga.
    pub idempotency_key: Option<String>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub payment_method: String,
    pub currency: Option<Currency>,
}

impl OrderSagaCommand {
    /// Returns the idempotency key if present and non-blank.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn to_create_order(&self) -> CreateOrderCommand {
        CreateOrderCommand {
            customer_id: self.customer_id,
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            items: self.items.clone(),
        }
    }

    pub fn to_process_payment(&self, order_id: OrderId) -> ProcessPaymentCommand {
        ProcessPaymentCommand {
            order_id,
            payment_method: self.payment_method.clone(),
            currency: self.currency.unwrap_or(Currency::BRL),
        }
    }

    pub fn to_analyze_risk(&self, order_id: OrderId) -> AnalyzeRiskCommand {
        AnalyzeRiskCommand {
            order_id,
            payment_method: self.payment_method.clone(),
        }
    }
}

/// Input for the order creation use case.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderCommand {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
}

/// Input for the payment processing use case.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessPaymentCommand {
    pub order_id: OrderId,
    pub payment_method: String,
    pub currency: Currency,
}

/// Input for the risk analysis use case.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeRiskCommand {
    pub order_id: OrderId,
    pub payment_method: String,
}

/// Outcome of a saga run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSagaResult {
    pub success: bool,
    /// The saga has not concluded: a payment awaits confirmation or an
    /// earlier run with the same key is still in flight.
    pub in_progress: bool,
    pub order: Option<Order>,
    pub saga_execution_id: SagaId,
    pub error_message: Option<String>,
}

impl OrderSagaResult {
    pub fn success(order: Order, saga_execution_id: SagaId) -> Self {
        Self {
            success: true,
            in_progress: false,
            order: Some(order),
            saga_execution_id,
            error_message: None,
        }
    }

    pub fn failed(
        order: Option<Order>,
        saga_execution_id: SagaId,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            in_progress: false,
            order,
            saga_execution_id,
            error_message: Some(error_message.into()),
        }
    }

    pub fn in_progress(saga_execution_id: SagaId) -> Self {
        Self {
            success: false,
            in_progress: true,
            order: None,
            saga_execution_id,
            error_message: None,
        }
    }

    pub fn in_progress_with_order(order: Order, saga_execution_id: SagaId) -> Self {
        Self {
            success: false,
            in_progress: true,
            order: Some(order),
            saga_execution_id,
            error_message: None,
        }
    }
}
