//! Risk analysis port and in-memory adapter.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{Money, RiskLevel};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Request to classify an order's fraud risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysisRequest {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_email: String,
    pub amount: Money,
    /// Payment method used for the order, a fraud signal for the
    /// classifier.
    pub payment_method: String,
}

impl RiskAnalysisRequest {
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        customer_email: impl Into<String>,
        amount: Money,
        payment_method: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        if amount.is_zero() {
            return Err(GatewayError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            order_id,
            customer_id,
            customer_email: customer_email.into(),
            amount,
            payment_method: payment_method.into(),
        })
    }
}

/// Risk classification returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysisResult {
    pub risk_level: RiskLevel,
    /// Confidence in the classification, 0.0 to 1.0.
    pub confidence: f64,
    pub reason: String,
    pub analyzed_at: DateTime<Utc>,
}

impl RiskAnalysisResult {
    pub fn new(risk_level: RiskLevel, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            risk_level,
            confidence,
            reason: reason.into(),
            analyzed_at: Utc::now(),
        }
    }

    /// An inconclusive result carrying only a reason. Used by resilient
    /// wrappers when the service cannot be reached.
    pub fn inconclusive(reason: impl Into<String>) -> Self {
        Self::new(RiskLevel::Pending, 0.0, reason)
    }
}

/// Risk analysis port.
#[async_trait]
pub trait RiskAnalysis: Send + Sync {
    async fn analyze_risk(
        &self,
        request: RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResult, GatewayError>;
}

#[derive(Debug)]
struct InMemoryRiskState {
    level: RiskLevel,
    fail_with_error: bool,
    calls: u64,
    last_request: Option<RiskAnalysisRequest>,
}

impl Default for InMemoryRiskState {
    fn default() -> Self {
        Self {
            level: RiskLevel::Low,
            fail_with_error: false,
            calls: 0,
            last_request: None,
        }
    }
}

/// In-memory risk analysis for testing. Classifies everything as low
/// risk unless scripted otherwise.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRiskAnalysis {
    state: Arc<RwLock<InMemoryRiskState>>,
}

impl InMemoryRiskAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the level returned by subsequent analyses.
    pub fn set_level(&self, level: RiskLevel) {
        self.state.write().unwrap().level = level;
    }

    /// Makes analysis calls return a transport-level error.
    pub fn set_fail_with_error(&self, fail: bool) {
        self.state.write().unwrap().fail_with_error = fail;
    }

    pub fn call_count(&self) -> u64 {
        self.state.read().unwrap().calls
    }

    pub fn last_request(&self) -> Option<RiskAnalysisRequest> {
        self.state.read().unwrap().last_request.clone()
    }
}

#[async_trait]
impl RiskAnalysis for InMemoryRiskAnalysis {
    async fn analyze_risk(
        &self,
        request: RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResult, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;
        state.last_request = Some(request);

        if state.fail_with_error {
            return Err(GatewayError::Unavailable(
                "risk service connection refused".to_string(),
            ));
        }

        Ok(RiskAnalysisResult::new(
            state.level,
            0.95,
            "scripted classification",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Currency;

    fn request() -> RiskAnalysisRequest {
        RiskAnalysisRequest::new(
            OrderId::new(),
            CustomerId::new(),
            "alice@example.com",
            Money::from_cents(4600, Currency::BRL).unwrap(),
            "CREDIT_CARD",
        )
        .unwrap()
    }

    #[test]
    fn test_request_rejects_zero_amount() {
        let result = RiskAnalysisRequest::new(
            OrderId::new(),
            CustomerId::new(),
            "alice@example.com",
            Money::zero(Currency::BRL),
            "CREDIT_CARD",
        );
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_defaults_to_low_risk() {
        let service = InMemoryRiskAnalysis::new();
        let result = service.analyze_risk(request()).await.unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(service.call_count(), 1);
        let seen = service.last_request().unwrap();
        assert_eq!(seen.payment_method, "CREDIT_CARD");
    }

    #[tokio::test]
    async fn test_scripted_high_risk() {
        let service = InMemoryRiskAnalysis::new();
        service.set_level(RiskLevel::High);
        let result = service.analyze_risk(request()).await.unwrap();
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let service = InMemoryRiskAnalysis::new();
        service.set_fail_with_error(true);
        let result = service.analyze_risk(request()).await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }
}
