use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::webhook_auth_middleware;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/events", post(handlers::events::validate_event));

    // Spawns scripts, so callers present webhook credentials
    let process_routes = Router::new()
        .route("/api/processes/sync", post(handlers::processes::run_sync))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            webhook_auth_middleware,
        ));

    // Called back by the export scripts, authenticated by name and apikey
    let webhook_routes = Router::new().route(
        "/webhooks/log",
        get(handlers::webhooks::log_from_query).post(handlers::webhooks::log_from_form),
    );

    // Metrics endpoint (no authentication for Prometheus scraping)
    let metrics_routes = Router::new().route("/metrics", get(handlers::metrics::metrics_handler));

    Router::new()
        .merge(api_routes)
        .merge(process_routes)
        .merge(webhook_routes)
        .merge(metrics_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
