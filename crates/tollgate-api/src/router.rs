//! Route definitions for the Tollgate HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(access_routes())
        .merge(session_routes())
        .merge(payment_routes())
        .merge(license_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Access gate endpoint
fn access_routes() -> Router<AppState> {
    Router::new().route("/access/check", post(handlers::access::check))
}

/// Session lifecycle endpoints
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(handlers::session::start))
        .route("/sessions/{id}", get(handlers::session::get))
        .route(
            "/sessions/{id}/heartbeat",
            post(handlers::session::heartbeat),
        )
        .route("/sessions/{id}/end", post(handlers::session::end))
}

/// Payment provider webhook
fn payment_routes() -> Router<AppState> {
    Router::new().route("/payments/webhook", post(handlers::payment::webhook))
}

/// License administration endpoints
fn license_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/licenses",
            get(handlers::license::list).post(handlers::license::create),
        )
        .route("/licenses/{key}", get(handlers::license::get))
        .route(
            "/licenses/{key}/status",
            patch(handlers::license::set_status),
        )
        .route(
            "/licenses/{key}/expiration",
            patch(handlers::license::set_expiration),
        )
        .route("/licenses/{key}/balance", get(handlers::license::balance))
        .route("/licenses/{key}/ledger", get(handlers::license::ledger))
        .route("/licenses/{key}/adjust", post(handlers::license::adjust))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}

/// Build the CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use http::Method;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new().allow_headers(Any);

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    cors.max_age(std::time::Duration::from_secs(
        cors_config.max_age_seconds,
    ))
}
