//! Saga execution lookup endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::SagaId;
use saga::SagaExecution;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct SagaStepResponse {
    pub name: String,
    pub status: String,
    pub error_message: Option<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Serialize)]
pub struct SagaExecutionResponse {
    pub saga_id: String,
    pub order_id: Option<String>,
    pub status: String,
    pub current_step: Option<String>,
    pub error_message: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_ms: Option<i64>,
    pub steps: Vec<SagaStepResponse>,
}

impl From<&SagaExecution> for SagaExecutionResponse {
    fn from(execution: &SagaExecution) -> Self {
        SagaExecutionResponse {
            saga_id: execution.id.to_string(),
            order_id: execution.order_id.map(|id| id.to_string()),
            status: execution.status.as_str().to_string(),
            current_step: execution.current_step.clone(),
            error_message: execution.error_message.clone(),
            started_at: execution.started_at.to_rfc3339(),
            completed_at: execution.completed_at.map(|t| t.to_rfc3339()),
            duration_ms: execution.duration_ms,
            steps: execution
                .steps
                .iter()
                .map(|step| SagaStepResponse {
                    name: step.name.clone(),
                    status: step.status.as_str().to_string(),
                    error_message: step.error_message.clone(),
                    duration_ms: step.duration_ms,
                })
                .collect(),
        }
    }
}

/// GET /sagas/:id - load a saga execution audit record.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SagaExecutionResponse>, ApiError> {
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("invalid saga id: {e}")))?;
    let saga_id = SagaId::from_uuid(uuid);

    let execution = state
        .executions
        .find_by_id(saga_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("saga {id} not found")))?;

    Ok(Json(SagaExecutionResponse::from(&execution)))
}
