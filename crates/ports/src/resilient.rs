//! Resilient decorators for the outbound service ports.
//!
//! Each wrapper runs the inner port through a circuit breaker and a
//! retry policy and converts exhausted failures into degraded values:
//! a failed payment result, a pending payment status, an inconclusive
//! risk classification. Use cases never see an `Err` from these.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Money;
use resilience::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};

use crate::error::GatewayError;
use crate::payment::{PaymentGateway, PaymentRequest, PaymentResult, PaymentStatus};
use crate::risk::{RiskAnalysis, RiskAnalysisRequest, RiskAnalysisResult};

/// Payment gateway wrapper that degrades instead of failing.
pub struct ResilientPaymentGateway<G> {
    inner: Arc<G>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl<G: PaymentGateway> ResilientPaymentGateway<G> {
    pub fn new(inner: Arc<G>) -> Self {
        Self::with_policies(
            inner,
            CircuitBreaker::new(CircuitBreakerConfig {
                name: "payment-gateway".to_string(),
                ..CircuitBreakerConfig::default()
            }),
            RetryPolicy::default(),
        )
    }

    pub fn with_policies(inner: Arc<G>, breaker: CircuitBreaker, retry: RetryPolicy) -> Self {
        Self {
            inner,
            breaker,
            retry,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn guarded<T, F, Fut>(&self, call: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, GatewayError>>,
    {
        let mut call = call;
        self.retry
            .run(|| {
                let fut = call();
                let breaker = self.breaker.clone();
                async move {
                    let result = fut.await;
                    match &result {
                        Ok(_) => breaker.record_success().await,
                        Err(_) => breaker.record_failure().await,
                    }
                    result
                }
            })
            .await
    }
}

#[async_trait]
impl<G: PaymentGateway> PaymentGateway for ResilientPaymentGateway<G> {
    async fn process_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentResult, GatewayError> {
        if !self.breaker.is_request_allowed().await {
            tracing::warn!(order_id = %request.order_id, "payment circuit open, degrading to failed result");
            return Ok(PaymentResult::failed("payment service unavailable"));
        }

        match self
            .guarded(|| self.inner.process_payment(request.clone()))
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::error!(order_id = %request.order_id, error = %err, "payment processing exhausted retries");
                Ok(PaymentResult::failed(format!(
                    "payment service unavailable: {err}"
                )))
            }
        }
    }

    async fn refund_payment(
        &self,
        payment_id: &str,
        amount: Money,
    ) -> Result<PaymentResult, GatewayError> {
        if !self.breaker.is_request_allowed().await {
            return Ok(PaymentResult::failed("payment service unavailable"));
        }

        match self
            .guarded(|| self.inner.refund_payment(payment_id, amount))
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::error!(payment_id, error = %err, "refund exhausted retries");
                Ok(PaymentResult::failed(format!(
                    "refund unavailable: {err}"
                )))
            }
        }
    }

    async fn check_payment_status(
        &self,
        payment_id: &str,
    ) -> Result<PaymentStatus, GatewayError> {
        if !self.breaker.is_request_allowed().await {
            return Ok(PaymentStatus::Pending);
        }

        match self
            .guarded(|| self.inner.check_payment_status(payment_id))
            .await
        {
            Ok(status) => Ok(status),
            Err(err) => {
                tracing::warn!(payment_id, error = %err, "status check failed, reporting pending");
                Ok(PaymentStatus::Pending)
            }
        }
    }
}

/// Risk analysis wrapper that degrades to an inconclusive result.
pub struct ResilientRiskAnalysis<R> {
    inner: Arc<R>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl<R: RiskAnalysis> ResilientRiskAnalysis<R> {
    pub fn new(inner: Arc<R>) -> Self {
        Self::with_policies(
            inner,
            CircuitBreaker::new(CircuitBreakerConfig {
                name: "risk-analysis".to_string(),
                ..CircuitBreakerConfig::default()
            }),
            RetryPolicy::default(),
        )
    }

    pub fn with_policies(inner: Arc<R>, breaker: CircuitBreaker, retry: RetryPolicy) -> Self {
        Self {
            inner,
            breaker,
            retry,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl<R: RiskAnalysis> RiskAnalysis for ResilientRiskAnalysis<R> {
    async fn analyze_risk(
        &self,
        request: RiskAnalysisRequest,
    ) -> Result<RiskAnalysisResult, GatewayError> {
        if !self.breaker.is_request_allowed().await {
            tracing::warn!(order_id = %request.order_id, "risk circuit open, reporting inconclusive");
            return Ok(RiskAnalysisResult::inconclusive(
                "risk service unavailable",
            ));
        }

        let attempt = self
            .retry
            .run(|| {
                let fut = self.inner.analyze_risk(request.clone());
                let breaker = self.breaker.clone();
                async move {
                    let result = fut.await;
                    match &result {
                        Ok(_) => breaker.record_success().await,
                        Err(_) => breaker.record_failure().await,
                    }
                    result
                }
            })
            .await;

        match attempt {
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::warn!(order_id = %request.order_id, error = %err, "risk analysis exhausted retries");
                Ok(RiskAnalysisResult::inconclusive(format!(
                    "risk service unavailable: {err}"
                )))
            }
        }
    }
}
