//! Order saga orchestration.
//!
//! The orchestrator drives an order through creation, payment, and risk
//! analysis as explicit sequential steps, records every step in a
//! [`SagaExecution`] audit trail, and compensates by canceling the
//! order when a step fails.

pub mod command;
pub mod error;
pub mod execution;
pub mod orchestrator;
pub mod repository;
pub mod steps;
pub mod usecase;

pub use command::{
    AnalyzeRiskCommand, CreateOrderCommand, OrderSagaCommand, OrderSagaResult,
    ProcessPaymentCommand,
};
pub use error::SagaError;
pub use execution::{SagaExecution, SagaStatus, SagaStep, StepStatus};
pub use orchestrator::OrderSagaOrchestrator;
pub use repository::{InMemorySagaExecutionRepository, SagaExecutionRepository};
pub use usecase::{AnalyzeRisk, CreateOrder, ProcessPayment, RefreshPaymentStatus};
