//! Saga execution audit trail.

use chrono::{DateTime, Utc};
use common::{OrderId, SagaId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a saga execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    Started,
    OrderCreated,
    PaymentProcessed,
    RiskAnalyzed,
    Completed,
    Failed,
    Compensated,
}

impl SagaStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaStatus::Completed | SagaStatus::Failed | SagaStatus::Compensated
        )
    }

    /// An in-flight saga has started but not reached a terminal status.
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Started => "STARTED",
            SagaStatus::OrderCreated => "ORDER_CREATED",
            SagaStatus::PaymentProcessed => "PAYMENT_PROCESSED",
            SagaStatus::RiskAnalyzed => "RISK_ANALYZED",
            SagaStatus::Completed => "COMPLETED",
            SagaStatus::Failed => "FAILED",
            SagaStatus::Compensated => "COMPENSATED",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of an individual saga step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Started,
    Success,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Started => "STARTED",
            StepStatus::Success => "SUCCESS",
            StepStatus::Failed => "FAILED",
        }
    }
}

/// One recorded step of a saga execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaStep {
    pub name: String,
    pub status: StepStatus,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl SagaStep {
    fn started(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Started,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
        }
    }
}

/// Audit record of one saga run.
///
/// Persisted after every transition so the trail survives a failure
/// mid-saga. The record is audit-only; it never drives retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaExecution {
    pub id: SagaId,
    pub idempotency_key: Option<String>,
    pub order_id: Option<OrderId>,
    pub status: SagaStatus,
    pub current_step: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub steps: Vec<SagaStep>,
}

impl SagaExecution {
    /// Starts a new execution record. The idempotency key is trimmed so
    /// lookups and stored keys always agree; blank keys are dropped.
    pub fn start(idempotency_key: Option<String>) -> Self {
        Self {
            id: SagaId::new(),
            idempotency_key: idempotency_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            order_id: None,
            status: SagaStatus::Started,
            current_step: None,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
            steps: Vec::new(),
        }
    }

    /// Records the start of a step and marks it current.
    pub fn start_step(&mut self, name: &str) {
        self.current_step = Some(name.to_string());
        self.steps.push(SagaStep::started(name));
    }

    /// Closes the most recent started step with the given name,
    /// stamping its end time and duration.
    pub fn complete_step(&mut self, name: &str, success: bool, error: Option<String>) {
        let step = self
            .steps
            .iter_mut()
            .rev()
            .find(|step| step.name == name && step.status == StepStatus::Started);
        if let Some(step) = step {
            let now = Utc::now();
            step.status = if success {
                StepStatus::Success
            } else {
                StepStatus::Failed
            };
            step.error_message = error;
            step.completed_at = Some(now);
            step.duration_ms = Some((now - step.started_at).num_milliseconds());
        }
    }

    /// Associates the created order with this execution.
    pub fn assign_order(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    /// Advances the in-flight status. Ignored once terminal.
    pub fn advance(&mut self, status: SagaStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
    }

    /// Marks the saga completed. A no-op once terminal.
    pub fn complete(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SagaStatus::Completed;
        self.finish();
    }

    /// Marks the saga failed with a reason. A no-op once terminal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SagaStatus::Failed;
        self.error_message = Some(reason.into());
        self.finish();
    }

    /// Marks the saga compensated with a reason. A no-op once terminal.
    pub fn compensate(&mut self, reason: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = SagaStatus::Compensated;
        self.error_message = Some(reason.into());
        self.finish();
    }

    /// Finds a recorded step by name.
    pub fn step(&self, name: &str) -> Option<&SagaStep> {
        self.steps.iter().find(|step| step.name == name)
    }

    fn finish(&mut self) {
        let now = Utc::now();
        self.completed_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds());
        self.current_step = None;
    }
}
