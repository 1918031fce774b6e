//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// CORS restricted to the storefront origins from config
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Create the main application router
///
/// Routes:
/// - GET  /            - liveness ("ok")
/// - GET  /healthz     - health check
/// - POST /api/paypal/orders              - reconcile and create order
/// - POST /api/paypal/orders/{id}/capture - capture order
/// - GET  /api/paypal/sdk-config          - browser SDK settings
/// - GET  /api/paypal/client-token        - SDK client token
/// - GET  /api/paypal/ping                - credential check
/// - GET  /api/paypal/debug/env           - non-secret config view
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    let paypal_routes = Router::new()
        .route("/orders", post(handlers::create_order))
        .route("/orders/{order_id}/capture", post(handlers::capture_order))
        .route("/sdk-config", get(handlers::sdk_config))
        .route("/client-token", get(handlers::client_token))
        .route("/ping", get(handlers::ping))
        .route("/debug/env", get(handlers::debug_env));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/paypal", paypal_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
