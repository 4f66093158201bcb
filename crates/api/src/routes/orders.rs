//! Order submission, lookup, and payment refresh endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId};
use domain::{Currency, Money, Order, OrderItem};
use ports::OrderRepository;
use saga::{
    OrderSagaCommand, OrderSagaOrchestrator, OrderSagaResult, RefreshPaymentStatus,
    SagaExecutionRepository,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: OrderSagaOrchestrator,
    pub refresh_payment_status: RefreshPaymentStatus,
    pub orders: Arc<dyn OrderRepository>,
    pub executions: Arc<dyn SagaExecutionRepository>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub idempotency_key: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItemRequest>,
    pub payment_method: String,
    pub currency: Option<String>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    /// Decimal amount string, e.g. `"10.50"`.
    pub unit_price: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub total: String,
    pub payment_id: Option<String>,
    pub risk_level: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct SagaResponse {
    pub success: bool,
    pub in_progress: bool,
    pub saga_id: String,
    pub error: Option<String>,
    pub order: Option<OrderResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        OrderResponse {
            id: order.id.to_string(),
            order_number: order.order_number.as_str().to_string(),
            status: order.status.as_str().to_string(),
            customer_id: order.customer_id.to_string(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            total_cents: order.total_amount.cents(),
            total: order.total_amount.to_string(),
            payment_id: order.payment_id.clone(),
            risk_level: order.risk_level.as_str().to_string(),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

fn saga_response(result: &OrderSagaResult) -> (StatusCode, Json<SagaResponse>) {
    let status = if result.success {
        StatusCode::CREATED
    } else if result.in_progress {
        StatusCode::ACCEPTED
    } else {
        StatusCode::PAYMENT_REQUIRED
    };
    let body = SagaResponse {
        success: result.success,
        in_progress: result.in_progress,
        saga_id: result.saga_execution_id.to_string(),
        error: result.error_message.clone(),
        order: result.order.as_ref().map(OrderResponse::from),
    };
    (status, Json(body))
}

// -- Handlers --

/// POST /orders - run the order saga for a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<SagaResponse>), ApiError> {
    let customer_id = match &req.customer_id {
        Some(id) => {
            let uuid = uuid::Uuid::parse_str(id)
                .map_err(|e| ApiError::BadRequest(format!("invalid customer_id: {e}")))?;
            CustomerId::from_uuid(uuid)
        }
        None => CustomerId::new(),
    };

    let currency = match &req.currency {
        Some(code) => Some(
            Currency::parse(code)
                .map_err(|e| ApiError::BadRequest(format!("invalid currency: {e}")))?,
        ),
        None => None,
    };
    let item_currency = currency.unwrap_or(Currency::BRL);

    let mut items = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let unit_price = Money::parse(&item.unit_price, item_currency)
            .map_err(|e| ApiError::BadRequest(format!("invalid unit_price: {e}")))?;
        items.push(OrderItem::new(
            item.product_id.as_str(),
            item.product_name.as_str(),
            item.quantity,
            unit_price,
        ));
    }

    let command = OrderSagaCommand {
        idempotency_key: req.idempotency_key,
        customer_id,
        customer_name: req.customer_name,
        customer_email: req.customer_email,
        items,
        payment_method: req.payment_method,
        currency,
    };

    let result = state.orchestrator.execute(command).await?;
    Ok(saga_response(&result))
}

/// GET /orders/:id - load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .find_by_id(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/:id/payment/refresh - reconcile with the gateway.
#[tracing::instrument(skip(state))]
pub async fn refresh_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.refresh_payment_status.execute(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
