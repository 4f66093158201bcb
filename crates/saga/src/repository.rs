//! Saga execution persistence port and in-memory adapter.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, SagaId};
use ports::RepositoryError;

use crate::execution::{SagaExecution, SagaStatus};

/// Storage port for saga execution records.
///
/// The idempotency key is unique among live executions: saving a new
/// execution under a key held by a different in-flight or completed
/// execution fails with [`RepositoryError::DuplicateIdempotencyKey`].
/// Failed and compensated executions release their key so a client
/// retry can start fresh.
#[async_trait]
pub trait SagaExecutionRepository: Send + Sync {
    async fn save(&self, execution: &SagaExecution) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: SagaId) -> Result<Option<SagaExecution>, RepositoryError>;

    async fn find_by_order_id(
        &self,
        order_id: OrderId,
    ) -> Result<Option<SagaExecution>, RepositoryError>;

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<SagaExecution>, RepositoryError>;

    async fn find_by_status(
        &self,
        status: SagaStatus,
    ) -> Result<Vec<SagaExecution>, RepositoryError>;
}

#[derive(Debug, Default)]
struct InMemorySagaState {
    executions: HashMap<SagaId, SagaExecution>,
    fail_on_save: bool,
}

/// In-memory saga execution repository for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySagaExecutionRepository {
    state: Arc<RwLock<InMemorySagaState>>,
}

impl InMemorySagaExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to fail on save calls.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.state.write().unwrap().fail_on_save = fail;
    }

    pub fn execution_count(&self) -> usize {
        self.state.read().unwrap().executions.len()
    }
}

#[async_trait]
impl SagaExecutionRepository for InMemorySagaExecutionRepository {
    async fn save(&self, execution: &SagaExecution) -> Result<(), RepositoryError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_save {
            return Err(RepositoryError::Storage("save failed".to_string()));
        }
        if let Some(key) = &execution.idempotency_key {
            let conflict = state.executions.values().any(|existing| {
                existing.id != execution.id
                    && existing.idempotency_key.as_ref() == Some(key)
                    && !matches!(
                        existing.status,
                        SagaStatus::Failed | SagaStatus::Compensated
                    )
            });
            if conflict {
                return Err(RepositoryError::DuplicateIdempotencyKey(key.clone()));
            }
        }
        state.executions.insert(execution.id, execution.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SagaId) -> Result<Option<SagaExecution>, RepositoryError> {
        Ok(self.state.read().unwrap().executions.get(&id).cloned())
    }

    async fn find_by_order_id(
        &self,
        order_id: OrderId,
    ) -> Result<Option<SagaExecution>, RepositoryError> {
        let state = self.state.read().unwrap();
        Ok(state
            .executions
            .values()
            .find(|execution| execution.order_id == Some(order_id))
            .cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<SagaExecution>, RepositoryError> {
        let state = self.state.read().unwrap();
        let holders = state
            .executions
            .values()
            .filter(|execution| execution.idempotency_key.as_deref() == Some(key));
        // A live holder wins over released (failed/compensated) ones.
        let mut released = None;
        for execution in holders {
            if !matches!(
                execution.status,
                SagaStatus::Failed | SagaStatus::Compensated
            ) {
                return Ok(Some(execution.clone()));
            }
            released = Some(execution.clone());
        }
        Ok(released)
    }

    async fn find_by_status(
        &self,
        status: SagaStatus,
    ) -> Result<Vec<SagaExecution>, RepositoryError> {
        let state = self.state.read().unwrap();
        Ok(state
            .executions
            .values()
            .filter(|execution| execution.status == status)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemorySagaExecutionRepository::new();
        let execution = SagaExecution::start(Some("key-1".to_string()));

        repo.save(&execution).await.unwrap();
        let found = repo.find_by_id(execution.id).await.unwrap().unwrap();
        assert_eq!(found, execution);

        let by_key = repo.find_by_idempotency_key("key-1").await.unwrap();
        assert_eq!(by_key.map(|e| e.id), Some(execution.id));
    }

    #[tokio::test]
    async fn test_resave_same_execution_keeps_key() {
        let repo = InMemorySagaExecutionRepository::new();
        let mut execution = SagaExecution::start(Some("key-1".to_string()));
        repo.save(&execution).await.unwrap();

        execution.advance(SagaStatus::OrderCreated);
        repo.save(&execution).await.unwrap();

        let found = repo.find_by_id(execution.id).await.unwrap().unwrap();
        assert_eq!(found.status, SagaStatus::OrderCreated);
        assert_eq!(repo.execution_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_rejected() {
        let repo = InMemorySagaExecutionRepository::new();
        repo.save(&SagaExecution::start(Some("key-1".to_string())))
            .await
            .unwrap();

        let second = SagaExecution::start(Some("key-1".to_string()));
        let result = repo.save(&second).await;
        assert_eq!(
            result,
            Err(RepositoryError::DuplicateIdempotencyKey(
                "key-1".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_compensated_execution_releases_its_key() {
        let repo = InMemorySagaExecutionRepository::new();
        let mut first = SagaExecution::start(Some("key-1".to_string()));
        repo.save(&first).await.unwrap();
        first.compensate("payment failed");
        repo.save(&first).await.unwrap();

        let second = SagaExecution::start(Some("key-1".to_string()));
        repo.save(&second).await.unwrap();

        // The live execution wins the key lookup.
        let found = repo.find_by_idempotency_key("key-1").await.unwrap().unwrap();
        assert_eq!(found.id, second.id);
    }

    #[tokio::test]
    async fn test_keyless_executions_do_not_collide() {
        let repo = InMemorySagaExecutionRepository::new();
        repo.save(&SagaExecution::start(None)).await.unwrap();
        repo.save(&SagaExecution::start(None)).await.unwrap();
        assert_eq!(repo.execution_count(), 2);
    }

    #[tokio::test]
    async fn test_find_by_order_id_and_status() {
        let repo = InMemorySagaExecutionRepository::new();
        let order_id = OrderId::new();
        let mut execution = SagaExecution::start(None);
        execution.assign_order(order_id);
        execution.complete();
        repo.save(&execution).await.unwrap();

        let by_order = repo.find_by_order_id(order_id).await.unwrap();
        assert_eq!(by_order.map(|e| e.id), Some(execution.id));

        let completed = repo.find_by_status(SagaStatus::Completed).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert!(repo
            .find_by_status(SagaStatus::Failed)
            .await
            .unwrap()
            .is_empty());
    }
}
