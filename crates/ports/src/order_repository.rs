//! Order persistence port and in-memory adapter.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderStatus};

use crate::error::RepositoryError;

/// Storage port for orders. Absence is `Ok(None)`, storage faults are
/// `Err`.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts or replaces an order.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_payment_id(&self, payment_id: &str)
        -> Result<Option<Order>, RepositoryError>;

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError>;

    async fn exists(&self, id: OrderId) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, Order>,
    save_count: u64,
    fail_on_save: bool,
}

/// In-memory order repository for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to fail on save calls.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.state.write().unwrap().fail_on_save = fail;
    }

    /// Returns how many times `save` succeeded.
    pub fn save_count(&self) -> u64 {
        self.state.read().unwrap().save_count
    }

    /// Returns the number of stored orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_save {
            return Err(RepositoryError::Storage("save failed".to_string()));
        }
        state.orders.insert(order.id, order.clone());
        state.save_count += 1;
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.read().unwrap().orders.get(&id).cloned())
    }

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().unwrap();
        Ok(state
            .orders
            .values()
            .find(|order| order.order_number.as_str() == order_number)
            .cloned())
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.read().unwrap();
        Ok(state
            .orders
            .values()
            .find(|order| order.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    async fn find_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().unwrap();
        Ok(state
            .orders
            .values()
            .filter(|order| order.status == status)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        self.state.write().unwrap().orders.remove(&id);
        Ok(())
    }

    async fn exists(&self, id: OrderId) -> Result<bool, RepositoryError> {
        Ok(self.state.read().unwrap().orders.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CustomerId;
    use domain::{Currency, Money, OrderItem};

    fn sample_order() -> Order {
        Order::new(
            CustomerId::new(),
            "Alice",
            "alice@example.com",
            vec![OrderItem::new(
                "SKU-001",
                "Widget",
                1,
                Money::from_cents(1000, Currency::BRL).unwrap(),
            )],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemoryOrderRepository::new();
        let order = sample_order();

        repo.save(&order).await.unwrap();
        let found = repo.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(found, order);
        assert!(repo.exists(order.id).await.unwrap());
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let repo = InMemoryOrderRepository::new();
        assert!(repo.find_by_id(OrderId::new()).await.unwrap().is_none());
        assert!(repo
            .find_by_order_number("ORD-999")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_order_number_and_payment_id() {
        let repo = InMemoryOrderRepository::new();
        let mut order = sample_order();
        order.mark_as_paid("pay_42").unwrap();
        repo.save(&order).await.unwrap();

        let by_number = repo
            .find_by_order_number(order.order_number.as_str())
            .await
            .unwrap();
        assert_eq!(by_number.as_ref().map(|o| o.id), Some(order.id));

        let by_payment = repo.find_by_payment_id("pay_42").await.unwrap();
        assert_eq!(by_payment.map(|o| o.id), Some(order.id));
    }

    #[tokio::test]
    async fn test_find_by_status() {
        let repo = InMemoryOrderRepository::new();
        let pending = sample_order();
        let mut paid = sample_order();
        paid.mark_as_paid("pay_1").unwrap();
        repo.save(&pending).await.unwrap();
        repo.save(&paid).await.unwrap();

        let found = repo.find_by_status(OrderStatus::Paid).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, paid.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryOrderRepository::new();
        let order = sample_order();
        repo.save(&order).await.unwrap();
        repo.delete(order.id).await.unwrap();
        assert!(!repo.exists(order.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_on_save() {
        let repo = InMemoryOrderRepository::new();
        repo.set_fail_on_save(true);
        let result = repo.save(&sample_order()).await;
        assert!(matches!(result, Err(RepositoryError::Storage(_))));
        assert_eq!(repo.order_count(), 0);
    }
}
