//! Domain layer for the order orchestration system.
//!
//! This crate provides the order aggregate with its status state machine
//! and the value objects it is built from:
//! - `OrderStatus` finite state machine with an explicit transition table
//! - `Money` / `Currency` for two-decimal monetary amounts
//! - `OrderItem`, `OrderNumber`, `RiskLevel`
//! - `Order` aggregate root with centralized transition logic

pub mod error;
pub mod item;
pub mod money;
pub mod order;
pub mod order_number;
pub mod risk;
pub mod status;

pub use error::DomainError;
pub use item::{OrderItem, ProductId};
pub use money::{Currency, Money};
pub use order::Order;
pub use order_number::OrderNumber;
pub use risk::RiskLevel;
pub use status::OrderStatus;
