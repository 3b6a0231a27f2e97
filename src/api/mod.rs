//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::FromRef, routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::dashboard::{Aggregator, BroadcastConfig, PgDashboardSource, SubscriberRegistry};

/// Shared state handed to every handler
#[derive(Debug, Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    pub aggregator: Aggregator,
    pub broadcast: BroadcastConfig,
    pub subscribers: SubscriberRegistry,
}

impl AppState {
    /// State whose dashboard reads go to the same database as the site
    pub fn new(pool: PgPool, read_timeout: Duration, broadcast: BroadcastConfig) -> Self {
        let source = Arc::new(PgDashboardSource::new(pool.clone()));
        Self {
            aggregator: Aggregator::new(source, read_timeout),
            pool,
            broadcast,
            subscribers: SubscriberRegistry::new(),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Auth only wraps staff routes; route_layer keeps unknown paths a 404
    let staff = routes::staff_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    // Layers run last-added first: context -> logging -> (auth) -> handler
    let api = routes::public_routes()
        .merge(staff)
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(middleware::context_middleware));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
