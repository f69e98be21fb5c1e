//! HTTP API for receipts and time audit reports.
//!
//! Every mutating endpoint persists through the store and then announces an
//! integration event on the broker, when one is configured. Structured
//! logging comes from `tracing` and metrics are exported for Prometheus.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{AuditReportService, ReceiptService};
use messaging::EventPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use store::EntityStore;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EntityStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let health_router = Router::new()
        .route("/health", get(routes::health::check))
        .with_state(state.receipts.handler().publisher().is_enabled());

    Router::new()
        .route("/tenants/{tenant_id}/receipts", post(routes::receipts::upload::<S>))
        .route("/tenants/{tenant_id}/receipts/{id}", get(routes::receipts::get::<S>))
        .route(
            "/tenants/{tenant_id}/receipts/{id}/verify",
            post(routes::receipts::verify::<S>),
        )
        .route(
            "/tenants/{tenant_id}/receipts/{id}/archive",
            post(routes::receipts::archive::<S>),
        )
        .route(
            "/tenants/{tenant_id}/audit-reports",
            post(routes::audit_reports::generate::<S>),
        )
        .route(
            "/tenants/{tenant_id}/audit-reports/{id}",
            get(routes::audit_reports::get::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .merge(health_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state: one service per entity, sharing the
/// store and the publisher.
pub fn create_state<S: EntityStore + Clone>(
    store: S,
    publisher: EventPublisher,
    shutdown: CancellationToken,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        receipts: ReceiptService::new(store.clone(), publisher.clone()),
        audit_reports: AuditReportService::new(store, publisher),
        shutdown,
    })
}
