//! The order saga orchestrator.

use std::sync::Arc;

use domain::Order;
use ports::{DomainEvent, EventPublisher, OrderRepository, RepositoryError};

use crate::command::{OrderSagaCommand, OrderSagaResult};
use crate::error::SagaError;
use crate::execution::{SagaExecution, SagaStatus};
use crate::repository::SagaExecutionRepository;
use crate::steps::{STEP_ORDER_CREATED, STEP_PAYMENT_PROCESSED, STEP_RISK_ANALYZED};
use crate::usecase::{AnalyzeRisk, CreateOrder, ProcessPayment, RiskDisposition};

/// Drives an order through creation, payment, and risk analysis as
/// explicit sequential steps with compensation on failure.
///
/// Every step transition is persisted to the execution record before
/// the saga moves on, so the audit trail survives a failure mid-run.
pub struct OrderSagaOrchestrator {
    create_order: CreateOrder,
    process_payment: ProcessPayment,
    analyze_risk: AnalyzeRisk,
    orders: Arc<dyn OrderRepository>,
    executions: Arc<dyn SagaExecutionRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderSagaOrchestrator {
    pub fn new(
        create_order: CreateOrder,
        process_payment: ProcessPayment,
        analyze_risk: AnalyzeRisk,
        orders: Arc<dyn OrderRepository>,
        executions: Arc<dyn SagaExecutionRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            create_order,
            process_payment,
            analyze_risk,
            orders,
            executions,
            publisher,
        }
    }

    /// Runs the saga for one command.
    ///
    /// `Err` means the machinery itself broke (storage faults); every
    /// business outcome, including failure with compensation, comes
    /// back as an [`OrderSagaResult`].
    #[tracing::instrument(skip(self, command), fields(customer_id = %command.customer_id))]
    pub async fn execute(&self, command: OrderSagaCommand) -> Result<OrderSagaResult, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        // Replay detection: a key we have seen before does not start a
        // second saga.
        if let Some(key) = command.idempotency_key() {
            if let Some(result) = self.check_existing(key).await? {
                return Ok(result);
            }
        }

        let mut execution = SagaExecution::start(command.idempotency_key.clone());
        if let Err(err) = self.executions.save(&execution).await {
            return match err {
                // Lost a duplicate-key race; report the winner's saga.
                RepositoryError::DuplicateIdempotencyKey(key) => {
                    tracing::info!(key, "concurrent saga holds this idempotency key");
                    let winner = self.executions.find_by_idempotency_key(&key).await?;
                    match winner {
                        Some(winner) => Ok(OrderSagaResult::in_progress(winner.id)),
                        None => Err(RepositoryError::DuplicateIdempotencyKey(key).into()),
                    }
                }
                other => Err(other.into()),
            };
        }
        let saga_id = execution.id;
        tracing::info!(%saga_id, "saga started");

        // Step 1: create the order.
        tracing::info!(step = STEP_ORDER_CREATED, "saga step started");
        execution.start_step(STEP_ORDER_CREATED);
        self.executions.save(&execution).await?;

        let order = match self.create_order.execute(command.to_create_order()).await {
            Ok(order) => {
                execution.complete_step(STEP_ORDER_CREATED, true, None);
                execution.assign_order(order.id);
                execution.advance(SagaStatus::OrderCreated);
                self.executions.save(&execution).await?;
                self.publish(DomainEvent::order_created(&order)).await;
                order
            }
            Err(err) => {
                execution.complete_step(STEP_ORDER_CREATED, false, Some(err.to_string()));
                let reason = format!("order creation failed: {err}");
                self.run_compensation(&mut execution, None, &reason).await?;
                self.record_outcome(saga_start, "compensated");
                return Ok(OrderSagaResult::failed(None, saga_id, reason));
            }
        };

        // Step 2: process the payment.
        tracing::info!(step = STEP_PAYMENT_PROCESSED, "saga step started");
        execution.start_step(STEP_PAYMENT_PROCESSED);
        self.executions.save(&execution).await?;

        let order = match self
            .process_payment
            .execute(command.to_process_payment(order.id))
            .await
        {
            Ok(updated) => {
                let step_ok = updated.is_paid() || updated.is_payment_pending();
                let step_error = (!step_ok).then(|| "payment failed".to_string());
                execution.complete_step(STEP_PAYMENT_PROCESSED, step_ok, step_error);
                if step_ok {
                    execution.advance(SagaStatus::PaymentProcessed);
                }
                self.executions.save(&execution).await?;
                self.publish(DomainEvent::payment_processed(&updated)).await;
                updated
            }
            Err(err) => {
                execution.complete_step(STEP_PAYMENT_PROCESSED, false, Some(err.to_string()));
                let reason = format!("payment processing failed: {err}");
                let order = self.reload(&execution).await.or(Some(order));
                self.run_compensation(&mut execution, order.clone(), &reason)
                    .await?;
                self.record_outcome(saga_start, "compensated");
                return Ok(OrderSagaResult::failed(order, saga_id, reason));
            }
        };

        if order.is_payment_pending() {
            // The gateway accepted the charge but has not confirmed it.
            // The saga pauses here; a status refresh finishes the order.
            tracing::info!(%saga_id, order_id = %order.id, "payment pending confirmation");
            self.record_outcome(saga_start, "in_progress");
            return Ok(OrderSagaResult::in_progress_with_order(order, saga_id));
        }

        if !order.is_paid() {
            let reason = "payment failed".to_string();
            self.run_compensation(&mut execution, Some(order.clone()), &reason)
                .await?;
            self.record_outcome(saga_start, "compensated");
            let order = self.reload(&execution).await.or(Some(order));
            return Ok(OrderSagaResult::failed(order, saga_id, reason));
        }

        // Step 3: risk analysis. Fail-open: an inconclusive or failed
        // analysis marks the step failed but never fails the saga.
        tracing::info!(step = STEP_RISK_ANALYZED, "saga step started");
        execution.start_step(STEP_RISK_ANALYZED);
        self.executions.save(&execution).await?;

        let order = match self
            .analyze_risk
            .execute(command.to_analyze_risk(order.id))
            .await
        {
            Ok(outcome) => {
                match &outcome.disposition {
                    RiskDisposition::Classified(_) | RiskDisposition::Skipped => {
                        execution.complete_step(STEP_RISK_ANALYZED, true, None);
                        execution.advance(SagaStatus::RiskAnalyzed);
                    }
                    RiskDisposition::Inconclusive(reason) => {
                        execution.complete_step(STEP_RISK_ANALYZED, false, Some(reason.clone()));
                    }
                }
                outcome.order
            }
            Err(err) => {
                tracing::warn!(%saga_id, error = %err, "risk analysis errored, completing saga anyway");
                execution.complete_step(STEP_RISK_ANALYZED, false, Some(err.to_string()));
                order
            }
        };

        execution.complete();
        self.executions.save(&execution).await?;
        self.publish(DomainEvent::saga_completed(saga_id, order.id)).await;

        self.record_outcome(saga_start, "completed");
        metrics::counter!("saga_completed_total").increment(1);
        tracing::info!(%saga_id, order_id = %order.id, "saga completed");

        Ok(OrderSagaResult::success(order, saga_id))
    }

    /// Resolves a previously seen idempotency key to a result, or
    /// `None` when a fresh saga should start.
    async fn check_existing(&self, key: &str) -> Result<Option<OrderSagaResult>, SagaError> {
        let Some(existing) = self.executions.find_by_idempotency_key(key).await? else {
            return Ok(None);
        };

        if existing.status == SagaStatus::Completed {
            if let Some(order_id) = existing.order_id {
                if let Some(order) = self.orders.find_by_id(order_id).await? {
                    tracing::info!(key, saga_id = %existing.id, "replaying completed saga result");
                    return Ok(Some(OrderSagaResult::success(order, existing.id)));
                }
            }
            // Completed without a retrievable order; fall through to a
            // fresh run.
            tracing::warn!(key, saga_id = %existing.id, "completed saga has no order, starting fresh");
            return Ok(None);
        }

        if existing.status.is_in_flight() {
            tracing::info!(key, saga_id = %existing.id, "saga already in flight for this key");
            return Ok(Some(OrderSagaResult::in_progress(existing.id)));
        }

        // Failed or Compensated: the client retry gets a fresh attempt.
        tracing::info!(key, saga_id = %existing.id, status = %existing.status, "previous saga did not complete, starting fresh");
        Ok(None)
    }

    /// Cancels the order where possible and marks the execution
    /// compensated. Compensation never fails the saga further; errors
    /// here are logged only.
    async fn run_compensation(
        &self,
        execution: &mut SagaExecution,
        order: Option<Order>,
        reason: &str,
    ) -> Result<(), SagaError> {
        tracing::warn!(saga_id = %execution.id, reason, "running compensation");
        metrics::counter!("saga_compensated_total").increment(1);

        if let Some(mut order) = order {
            // A paid order is never rolled back here, and a failed
            // payment keeps its status for the audit trail. Only an
            // order still pending is canceled.
            if order.is_pending() {
                match order.cancel() {
                    Ok(()) => {
                        if let Err(err) = self.orders.save(&order).await {
                            tracing::error!(order_id = %order.id, error = %err, "could not persist canceled order");
                        } else {
                            tracing::info!(order_id = %order.id, "order canceled by compensation");
                        }
                    }
                    Err(err) => {
                        tracing::error!(order_id = %order.id, error = %err, "could not cancel order");
                    }
                }
            }
        }

        execution.compensate(reason);
        self.executions.save(execution).await?;

        self.publish(DomainEvent::saga_failed(
            execution.id,
            execution.order_id,
            reason,
        ))
        .await;
        Ok(())
    }

    async fn reload(&self, execution: &SagaExecution) -> Option<Order> {
        let order_id = execution.order_id?;
        self.orders.find_by_id(order_id).await.ok().flatten()
    }

    /// Best-effort publish; delivery failures are logged and dropped.
    async fn publish(&self, event: DomainEvent) {
        if let Err(err) = self.publisher.publish(&event).await {
            tracing::warn!(event_type = event.event_type(), error = %err, "event not published");
        }
    }

    fn record_outcome(&self, saga_start: std::time::Instant, outcome: &'static str) {
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("saga_outcomes_total", "outcome" => outcome).increment(1);
    }
}
