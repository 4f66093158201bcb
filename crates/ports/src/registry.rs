//! Event broker selection.

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::{EventPublisher, InMemoryEventPublisher};

/// Supported event broker backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrokerKind {
    #[default]
    InMemory,
    Kafka,
    RabbitMq,
    PubSub,
}

impl BrokerKind {
    /// Parses a broker name from configuration. Unknown names map to
    /// the in-memory broker.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "kafka" => BrokerKind::Kafka,
            "rabbitmq" | "rabbit" => BrokerKind::RabbitMq,
            "pubsub" | "pub_sub" => BrokerKind::PubSub,
            _ => BrokerKind::InMemory,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerKind::InMemory => "in-memory",
            BrokerKind::Kafka => "kafka",
            BrokerKind::RabbitMq => "rabbitmq",
            BrokerKind::PubSub => "pubsub",
        }
    }
}

impl std::fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps broker kinds to publisher instances, resolved once at startup.
///
/// Kinds with no registered publisher resolve to the in-memory
/// fallback, so a misconfigured broker name degrades to local delivery
/// instead of failing the boot.
pub struct PublisherRegistry {
    publishers: HashMap<BrokerKind, Arc<dyn EventPublisher>>,
    fallback: Arc<dyn EventPublisher>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self {
            publishers: HashMap::new(),
            fallback: Arc::new(InMemoryEventPublisher::new()),
        }
    }

    /// Registers a publisher for a broker kind, replacing any existing
    /// registration.
    pub fn with_publisher(
        mut self,
        kind: BrokerKind,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        self.publishers.insert(kind, publisher);
        self
    }

    /// Resolves the publisher for a broker kind.
    pub fn resolve(&self, kind: BrokerKind) -> Arc<dyn EventPublisher> {
        match self.publishers.get(&kind) {
            Some(publisher) => Arc::clone(publisher),
            None => {
                if kind != BrokerKind::InMemory {
                    tracing::warn!(broker = %kind, "no publisher registered, using in-memory fallback");
                }
                Arc::clone(&self.fallback)
            }
        }
    }
}

impl Default for PublisherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
