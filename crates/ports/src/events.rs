//! Domain events and the publishing port.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, SagaId};
use domain::{Money, Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Events emitted by the orchestration core.
///
/// Delivery is best-effort and at-most-once; consumers must tolerate
/// missing events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DomainEvent {
    /// A new order was accepted.
    OrderCreated {
        order_id: OrderId,
        order_number: String,
        customer_id: CustomerId,
        total_amount: Money,
        occurred_at: DateTime<Utc>,
    },

    /// A payment attempt concluded with the given order status.
    PaymentProcessed {
        order_id: OrderId,
        payment_id: Option<String>,
        status: OrderStatus,
        occurred_at: DateTime<Utc>,
    },

    /// The saga ran all its steps.
    SagaCompleted {
        saga_id: SagaId,
        order_id: OrderId,
        occurred_at: DateTime<Utc>,
    },

    /// The saga failed and compensation ran.
    SagaFailed {
        saga_id: SagaId,
        order_id: Option<OrderId>,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn order_created(order: &Order) -> Self {
        DomainEvent::OrderCreated {
            order_id: order.id,
            order_number: order.order_number.as_str().to_string(),
            customer_id: order.customer_id,
            total_amount: order.total_amount,
            occurred_at: Utc::now(),
        }
    }

    pub fn payment_processed(order: &Order) -> Self {
        DomainEvent::PaymentProcessed {
            order_id: order.id,
            payment_id: order.payment_id.clone(),
            status: order.status,
            occurred_at: Utc::now(),
        }
    }

    pub fn saga_completed(saga_id: SagaId, order_id: OrderId) -> Self {
        DomainEvent::SagaCompleted {
            saga_id,
            order_id,
            occurred_at: Utc::now(),
        }
    }

    pub fn saga_failed(saga_id: SagaId, order_id: Option<OrderId>, reason: impl Into<String>) -> Self {
        DomainEvent::SagaFailed {
            saga_id,
            order_id,
            reason: reason.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Returns the event type name used for routing and logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderCreated { .. } => "OrderCreated",
            DomainEvent::PaymentProcessed { .. } => "PaymentProcessed",
            DomainEvent::SagaCompleted { .. } => "SagaCompleted",
            DomainEvent::SagaFailed { .. } => "SagaFailed",
        }
    }

    /// Returns when the event occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::OrderCreated { occurred_at, .. }
            | DomainEvent::PaymentProcessed { occurred_at, .. }
            | DomainEvent::SagaCompleted { occurred_at, .. }
            | DomainEvent::SagaFailed { occurred_at, .. } => *occurred_at,
        }
    }
}

/// Event broker port. Publishing is best-effort; callers log and
/// swallow failures.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), GatewayError>;

    async fn publish_batch(&self, events: &[DomainEvent]) -> Result<(), GatewayError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    events: Vec<DomainEvent>,
    fail_on_publish: bool,
}

/// In-memory publisher that records events for inspection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes publish calls fail.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns all published events in order.
    pub fn published_events(&self) -> Vec<DomainEvent> {
        self.state.read().unwrap().events.clone()
    }

    /// Returns how many events of the given type were published.
    pub fn count_of(&self, event_type: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .events
            .iter()
            .filter(|event| event.event_type() == event_type)
            .count()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_publish {
            return Err(GatewayError::Unavailable(
                "event broker connection refused".to_string(),
            ));
        }
        state.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> DomainEvent {
        DomainEvent::saga_completed(SagaId::new(), OrderId::new())
    }

    #[tokio::test]
    async fn test_publish_records_events() {
        let publisher = InMemoryEventPublisher::new();
        publisher.publish(&sample_event()).await.unwrap();
        publisher.publish(&sample_event()).await.unwrap();

        assert_eq!(publisher.published_events().len(), 2);
        assert_eq!(publisher.count_of("SagaCompleted"), 2);
        assert_eq!(publisher.count_of("OrderCreated"), 0);
    }

    #[tokio::test]
    async fn test_publish_batch() {
        let publisher = InMemoryEventPublisher::new();
        let events = vec![sample_event(), sample_event()];
        publisher.publish_batch(&events).await.unwrap();
        assert_eq!(publisher.published_events().len(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_publish() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on_publish(true);
        let result = publisher.publish(&sample_event()).await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
        assert!(publisher.published_events().is_empty());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = sample_event();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SagaCompleted");
        assert!(json["data"]["saga_id"].is_string());
    }
}
