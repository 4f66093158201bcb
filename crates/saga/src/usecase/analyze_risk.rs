//! Risk analysis use case.

use std::sync::Arc;

use domain::{Order, OrderStatus, RiskLevel};
use ports::{OrderRepository, RiskAnalysis, RiskAnalysisRequest};

use crate::command::AnalyzeRiskCommand;
use crate::error::SagaError;

/// How the analysis concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDisposition {
    /// The service classified the order.
    Classified(RiskLevel),
    /// The service could not classify the order; the prior level is
    /// kept. Carries the reason.
    Inconclusive(String),
    /// Analysis is disabled by configuration.
    Skipped,
}

/// Result of the risk analysis use case.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAnalysisOutcome {
    pub order: Order,
    pub disposition: RiskDisposition,
}

/// Classifies an order's fraud risk. Fail-open: an unreachable or
/// inconclusive risk service never fails the order, it only leaves the
/// risk level as it was.
pub struct AnalyzeRisk {
    orders: Arc<dyn OrderRepository>,
    risk: Arc<dyn RiskAnalysis>,
    enabled: bool,
}

impl AnalyzeRisk {
    pub fn new(orders: Arc<dyn OrderRepository>, risk: Arc<dyn RiskAnalysis>, enabled: bool) -> Self {
        Self {
            orders,
            risk,
            enabled,
        }
    }

    #[tracing::instrument(skip(self, command), fields(order_id = %command.order_id))]
    pub async fn execute(
        &self,
        command: AnalyzeRiskCommand,
    ) -> Result<RiskAnalysisOutcome, SagaError> {
        let mut order = self
            .orders
            .find_by_id(command.order_id)
            .await?
            .ok_or_else(|| SagaError::OrderNotFound(command.order_id.to_string()))?;

        if !self.enabled {
            tracing::debug!(order_id = %order.id, "risk analysis disabled, skipping");
            self.orders.save(&order).await?;
            return Ok(RiskAnalysisOutcome {
                order,
                disposition: RiskDisposition::Skipped,
            });
        }

        if !order.is_paid() && !order.is_payment_pending() {
            return Err(SagaError::InvalidOrderState {
                order_id: order.id.to_string(),
                status: order.status,
                expected: vec![OrderStatus::Paid, OrderStatus::PaymentPending],
            });
        }

        let disposition = match self.classify(&order, &command.payment_method).await {
            Ok(level) => {
                order.update_risk_level(level);
                tracing::info!(order_id = %order.id, risk_level = %level, "risk classified");
                RiskDisposition::Classified(level)
            }
            Err(reason) => {
                tracing::warn!(order_id = %order.id, reason, "risk analysis inconclusive, keeping prior level");
                RiskDisposition::Inconclusive(reason)
            }
        };

        self.orders.save(&order).await?;
        Ok(RiskAnalysisOutcome { order, disposition })
    }

    async fn classify(&self, order: &Order, payment_method: &str) -> Result<RiskLevel, String> {
        let request = RiskAnalysisRequest::new(
            order.id,
            order.customer_id,
            order.customer_email.clone(),
            order.total_amount,
            payment_method,
        )
        .map_err(|err| err.to_string())?;

        let result = self
            .risk
            .analyze_risk(request)
            .await
            .map_err(|err| err.to_string())?;

        match result.risk_level {
            RiskLevel::Pending => Err(result.reason),
            level => Ok(level),
        }
    }
}
