//! The order aggregate.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::item::OrderItem;
use crate::money::{Currency, Money};
use crate::order_number::OrderNumber;
use crate::risk::RiskLevel;
use crate::status::OrderStatus;

/// A customer order.
///
/// All status changes go through [`Order::transition`], which enforces
/// the [`OrderStatus`] state machine. Mutators stamp `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub status: OrderStatus,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub payment_id: Option<String>,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order, computing the total from its items.
    pub fn new(
        customer_id: CustomerId,
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        items: Vec<OrderItem>,
    ) -> Result<Self, DomainError> {
        let total_amount = Self::compute_total(&items)?;
        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            order_number: OrderNumber::generate(),
            status: OrderStatus::Pending,
            customer_id,
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            items,
            total_amount,
            payment_id: None,
            risk_level: RiskLevel::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    fn compute_total(items: &[OrderItem]) -> Result<Money, DomainError> {
        let currency = items
            .first()
            .map(|item| item.unit_price.currency())
            .unwrap_or(Currency::BRL);
        items
            .iter()
            .try_fold(Money::zero(currency), |total, item| {
                total.add(item.subtotal())
            })
    }

    /// Moves the order to `target`, rejecting transitions the status
    /// state machine does not allow.
    pub fn transition(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: target,
                allowed: self.status.allowed_transitions(),
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Records a confirmed payment and moves the order to `Paid`.
    pub fn mark_as_paid(&mut self, payment_id: &str) -> Result<(), DomainError> {
        if payment_id.trim().is_empty() {
            return Err(DomainError::BlankPaymentId);
        }
        self.transition(OrderStatus::Paid)?;
        self.payment_id = Some(payment_id.to_string());
        Ok(())
    }

    /// Moves the order to `PaymentFailed`.
    pub fn mark_as_payment_failed(&mut self) -> Result<(), DomainError> {
        self.transition(OrderStatus::PaymentFailed)
    }

    /// Cancels the order.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(OrderStatus::Canceled)
    }

    /// Attaches a gateway payment ID without changing status. Used when
    /// the gateway accepted the payment but has not confirmed it yet.
    pub fn attach_payment_id(&mut self, payment_id: &str) -> Result<(), DomainError> {
        if payment_id.trim().is_empty() {
            return Err(DomainError::BlankPaymentId);
        }
        self.payment_id = Some(payment_id.to_string());
        self.touch();
        Ok(())
    }

    /// Records the outcome of risk analysis.
    pub fn update_risk_level(&mut self, risk_level: RiskLevel) {
        self.risk_level = risk_level;
        self.touch();
    }

    /// Replaces the order items and recomputes the total.
    pub fn set_items(&mut self, items: Vec<OrderItem>) -> Result<(), DomainError> {
        self.total_amount = Self::compute_total(&items)?;
        self.items = items;
        self.touch();
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_payment_pending(&self) -> bool {
        self.status == OrderStatus::PaymentPending
    }

    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid
    }

    pub fn is_payment_failed(&self) -> bool {
        self.status == OrderStatus::PaymentFailed
    }

    pub fn is_canceled(&self) -> bool {
        self.status == OrderStatus::Canceled
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
