//! Payment gateway port, wire types, and in-memory adapter.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Status of a payment as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Accepted by the gateway, not yet confirmed.
    Pending,
    /// Confirmed.
    Success,
    /// Declined or errored.
    Failed,
    /// Previously confirmed payment was refunded.
    Refunded,
    /// Cancelled before confirmation.
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A charge request sent to the payment gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub payment_method: String,
}

impl PaymentRequest {
    /// Builds a charge request, rejecting zero amounts and blank
    /// payment methods.
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        amount: Money,
        payment_method: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        if amount.is_zero() {
            return Err(GatewayError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }
        let payment_method = payment_method.into();
        if payment_method.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "payment method must not be blank".to_string(),
            ));
        }
        Ok(Self {
            order_id,
            customer_id,
            amount,
            payment_method,
        })
    }
}

/// Outcome of a gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Gateway-assigned payment reference, absent on outright failure.
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
    pub message: String,
    pub amount: Option<Money>,
    pub processed_at: DateTime<Utc>,
}

impl PaymentResult {
    pub fn new(
        payment_id: Option<String>,
        status: PaymentStatus,
        message: impl Into<String>,
        amount: Option<Money>,
    ) -> Self {
        Self {
            payment_id,
            status,
            message: message.into(),
            amount,
            processed_at: Utc::now(),
        }
    }

    /// A failed result carrying only a reason. Used by resilient
    /// wrappers when the gateway cannot be reached.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(None, PaymentStatus::Failed, message, None)
    }

    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Success
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// Payment gateway port.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the customer for an order.
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResult, GatewayError>;

    /// Refunds a previously processed payment.
    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Money,
    ) -> Result<PaymentResult, GatewayError>;

    /// Queries the gateway for the current status of a payment.
    async fn check_payment_status(&self, payment_id: &str)
        -> Result<PaymentStatus, GatewayError>;
}

#[derive(Debug)]
struct InMemoryGatewayState {
    payments: HashMap<String, PaymentStatus>,
    next_id: u32,
    outcome: PaymentStatus,
    fail_with_error: bool,
    process_calls: u64,
    status_checks: u64,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        Self {
            payments: HashMap::new(),
            next_id: 0,
            outcome: PaymentStatus::Success,
            fail_with_error: false,
            process_calls: 0,
            status_checks: 0,
        }
    }
}

/// Scriptable in-memory payment gateway for testing.
///
/// Defaults to approving every charge; `set_outcome` and
/// `set_fail_with_error` script degraded behavior, and
/// `set_payment_status` moves an existing payment so status refreshes
/// can be exercised.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the status returned by subsequent charges.
    pub fn set_outcome(&self, outcome: PaymentStatus) {
        self.state.write().unwrap().outcome = outcome;
    }

    /// Makes gateway calls return a transport-level error.
    pub fn set_fail_with_error(&self, fail: bool) {
        self.state.write().unwrap().fail_with_error = fail;
    }

    /// Overrides the stored status of an existing payment.
    pub fn set_payment_status(&self, payment_id: &str, status: PaymentStatus) {
        self.state
            .write()
            .unwrap()
            .payments
            .insert(payment_id.to_string(), status);
    }

    pub fn process_calls(&self) -> u64 {
        self.state.read().unwrap().process_calls
    }

    pub fn status_checks(&self) -> u64 {
        self.state.read().unwrap().status_checks
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResult, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.process_calls += 1;

        if state.fail_with_error {
            return Err(GatewayError::Unavailable(
                "payment service connection refused".to_string(),
            ));
        }

        let outcome = state.outcome;
        if outcome == PaymentStatus::Failed {
            return Ok(PaymentResult::new(
                None,
                PaymentStatus::Failed,
                "payment declined",
                Some(request.amount),
            ));
        }

        state.next_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_id);
        state.payments.insert(payment_id.clone(), outcome);

        Ok(PaymentResult::new(
            Some(payment_id),
            outcome,
            match outcome {
                PaymentStatus::Pending => "payment accepted, awaiting confirmation",
                _ => "payment approved",
            },
            Some(request.amount),
        ))
    }

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Money,
    ) -> Result<PaymentResult, GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_with_error {
            return Err(GatewayError::Unavailable(
                "payment service connection refused".to_string(),
            ));
        }
        if !state.payments.contains_key(payment_id) {
            return Err(GatewayError::UnknownPayment(payment_id.to_string()));
        }
        state
            .payments
            .insert(payment_id.to_string(), PaymentStatus::Refunded);
        Ok(PaymentResult::new(
            Some(payment_id.to_string()),
            PaymentStatus::Refunded,
            "payment refunded",
            Some(amount),
        ))
    }

    async fn check_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentStatus, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.status_checks += 1;
        if state.fail_with_error {
            return Err(GatewayError::Unavailable(
                "payment service connection refused".to_string(),
            ));
        }
        state
            .payments
            .get(payment_id)
            .copied()
            .ok_or_else(|| GatewayError::UnknownPayment(payment_id.to_string()))
    }
}
