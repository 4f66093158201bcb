//! Shared types for the order orchestration system.

pub mod ids;

pub use ids::{CustomerId, OrderId, SagaId};
