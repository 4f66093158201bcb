//! HTTP API server for the order saga orchestrator.
//!
//! Exposes order submission (which runs the saga), order and saga
//! lookups, and a payment status refresh, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use ports::{
    BrokerKind, InMemoryEventPublisher, InMemoryOrderRepository, InMemoryPaymentGateway,
    InMemoryRiskAnalysis, LoggingNotification, Notification, OrderRepository, PublisherRegistry,
    ResilientPaymentGateway, ResilientRiskAnalysis,
};
use saga::{
    AnalyzeRisk, CreateOrder, InMemorySagaExecutionRepository, OrderSagaOrchestrator,
    ProcessPayment, RefreshPaymentStatus, SagaExecutionRepository,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
        .route(
            "/orders/{id}/payment/refresh",
            post(routes::orders::refresh_payment),
        )
        .route("/sagas/{id}", get(routes::sagas::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the application state with in-memory adapters, resilient
/// decorators around the external services, and the configured event
/// broker.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let orders: Arc<dyn OrderRepository> = Arc::new(InMemoryOrderRepository::new());
    let executions: Arc<dyn SagaExecutionRepository> =
        Arc::new(InMemorySagaExecutionRepository::new());
    let notifier: Arc<dyn Notification> = Arc::new(LoggingNotification::new());

    let gateway = Arc::new(ResilientPaymentGateway::new(Arc::new(
        InMemoryPaymentGateway::new(),
    )));
    let risk = Arc::new(ResilientRiskAnalysis::new(Arc::new(
        InMemoryRiskAnalysis::new(),
    )));

    let registry = PublisherRegistry::new()
        .with_publisher(BrokerKind::InMemory, Arc::new(InMemoryEventPublisher::new()));
    let publisher = registry.resolve(config.event_broker);

    let orchestrator = OrderSagaOrchestrator::new(
        CreateOrder::new(orders.clone(), notifier.clone()),
        ProcessPayment::new(orders.clone(), gateway.clone(), notifier.clone()),
        AnalyzeRisk::new(orders.clone(), risk, config.risk_analysis_enabled),
        orders.clone(),
        executions.clone(),
        publisher.clone(),
    );

    let refresh_payment_status =
        RefreshPaymentStatus::new(orders.clone(), gateway, publisher);

    Arc::new(AppState {
        orchestrator,
        refresh_payment_status,
        orders,
        executions,
    })
}
