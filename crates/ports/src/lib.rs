//! Ports to the outside world.
//!
//! Traits for everything the orchestration core talks to (order storage,
//! payment gateway, risk analysis, event broker, notifications), the wire
//! types they exchange, in-memory adapters for tests and local runs, and
//! resilient decorators that degrade gracefully instead of failing.

pub mod error;
pub mod events;
pub mod notification;
pub mod order_repository;
pub mod payment;
pub mod registry;
pub mod resilient;
pub mod risk;

pub use error::{GatewayError, NotificationError, RepositoryError};
pub use events::{DomainEvent, EventPublisher, InMemoryEventPublisher};
pub use notification::{LoggingNotification, Notification, RecordingNotification, SentNotification};
pub use order_repository::{InMemoryOrderRepository, OrderRepository};
pub use payment::{
    InMemoryPaymentGateway, PaymentGateway, PaymentRequest, PaymentResult, PaymentStatus,
};
pub use registry::{BrokerKind, PublisherRegistry};
pub use resilient::{ResilientPaymentGateway, ResilientRiskAnalysis};
pub use risk::{InMemoryRiskAnalysis, RiskAnalysis, RiskAnalysisRequest, RiskAnalysisResult};
